//! Process configuration loaded from the environment (§6 "Configuration keys
//! consumed"). Follows the teacher's `Config::from_env` shape: `dotenv().ok()`
//! then `std::env::var(..).unwrap_or_else(..)` per key, never a hard failure
//! on a missing optional value.

use crate::fetcher::breaker::BreakerPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub debug: bool,
    pub rss_feeds_env_set: bool,
    pub outcome_concurrency: usize,
    pub statistic_concurrency: usize,
    pub breaker_policy: BreakerPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let debug = std::env::var("DEBUG")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let rss_feeds_env_set = std::env::var("SPORTS_RSS_FEEDS")
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);

        let outcome_concurrency = std::env::var("OUTCOME_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let statistic_concurrency = std::env::var("STATISTIC_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);

        let failure_threshold = std::env::var("BREAKER_FAILURE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let cooldown_ms = std::env::var("BREAKER_COOLDOWN_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15_000);

        Self {
            debug,
            rss_feeds_env_set,
            outcome_concurrency,
            statistic_concurrency,
            breaker_policy: BreakerPolicy {
                failure_threshold,
                cooldown: Duration::from_millis(cooldown_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_concurrency_caps() {
        std::env::remove_var("OUTCOME_CONCURRENCY");
        std::env::remove_var("STATISTIC_CONCURRENCY");
        let config = Config::from_env();
        assert_eq!(config.outcome_concurrency, 3);
        assert_eq!(config.statistic_concurrency, 4);
    }
}

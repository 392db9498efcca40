//! Declarative provider table (§4.2).
//!
//! A provider is "not configured" when its `base_url_env` is unset; the
//! registry yields a `Skipped` outcome instead of issuing a request rather
//! than treating a missing credential as fatal, matching the teacher's own
//! `if std::env::var("THE_ODDS_API_KEY").is_ok() { .. }`-style optional
//! source gating in `other_examples/23d8f0f1_..._sports_data_aggregator.rs`.

use crate::domain::Tier;
use crate::fetcher::{FetchFailure, Fetcher, RetryPolicy};
use std::collections::HashMap;
use tracing::info;

/// Query parameters shared by every provider's composed URL (§4.2). All nine
/// keys are always emitted, in this order, with an empty value when a field
/// is absent — this matches the literal example string in the spec
/// (`statistic=<type>&matchId=&homeTeam=&...`), which keeps every key and
/// leaves unset ones blank rather than dropping the key. See DESIGN.md for
/// the reasoning (an Open Question in the source spec).
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub statistic: Option<String>,
    pub match_id: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub date: Option<String>,
    pub competition: Option<String>,
    pub team: Option<String>,
    pub player: Option<String>,
    pub period: Option<String>,
}

fn shared_query_string(params: &QueryParams) -> String {
    let pairs: [(&str, &Option<String>); 9] = [
        ("statistic", &params.statistic),
        ("matchId", &params.match_id),
        ("homeTeam", &params.home_team),
        ("awayTeam", &params.away_team),
        ("date", &params.date),
        ("competition", &params.competition),
        ("team", &params.team),
        ("player", &params.player),
        ("period", &params.period),
    ];
    pairs
        .iter()
        .map(|(key, value)| {
            let v = value
                .as_deref()
                .map(|v| url::form_urlencoded::byte_serialize(v.as_bytes()).collect::<String>())
                .unwrap_or_default();
            format!("{key}={v}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>` when a key exists, no header otherwise.
    BearerDefault,
    /// Provider needs no auth header at all (e.g. free RSS feeds).
    None,
}

#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub tier: Tier,
    pub base_url_env: &'static str,
    pub api_key_env: Option<&'static str>,
    pub path: &'static str,
    pub auth: AuthStyle,
    pub retry: RetryPolicy,
}

impl ProviderSpec {
    fn weight(&self) -> f64 {
        self.tier.default_weight()
    }

    fn compose_url(&self, base_url: &str, params: &QueryParams) -> String {
        format!("{base_url}{}?{}", self.path, shared_query_string(params))
    }

    fn build_headers(&self, api_key: Option<&str>) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if self.auth == AuthStyle::BearerDefault {
            if let Some(key) = api_key {
                headers.insert("Authorization".to_string(), format!("Bearer {key}"));
            }
        }
        headers
    }
}

pub enum ProviderOutcome {
    Fetched {
        provider: &'static str,
        tier: Tier,
        weight: f64,
        payload: serde_json::Value,
    },
    Skipped {
        provider: &'static str,
        reason: String,
    },
    Failed {
        provider: &'static str,
        failure: FetchFailure,
    },
}

/// The full declarative table. Order is insertion order only; it carries no
/// semantic meaning for consensus (grouping and counting are commutative).
pub fn providers() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec {
            name: "THESPORTSDB",
            tier: Tier::Four,
            base_url_env: "THESPORTSDB_BASE_URL",
            api_key_env: None,
            path: "/eventsseason.php",
            auth: AuthStyle::None,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "API_FOOTBALL",
            tier: Tier::Two,
            base_url_env: "API_FOOTBALL_BASE_URL",
            api_key_env: Some("API_FOOTBALL_API_KEY"),
            path: "/fixtures",
            auth: AuthStyle::BearerDefault,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "API_BASKETBALL",
            tier: Tier::Two,
            base_url_env: "API_BASKETBALL_BASE_URL",
            api_key_env: Some("API_BASKETBALL_API_KEY"),
            path: "/games",
            auth: AuthStyle::BearerDefault,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "THE_ODDS_API",
            tier: Tier::Three,
            base_url_env: "THE_ODDS_API_BASE_URL",
            api_key_env: Some("THE_ODDS_API_API_KEY"),
            path: "/scores",
            auth: AuthStyle::BearerDefault,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "OPTA_STATS",
            tier: Tier::One,
            base_url_env: "OPTA_STATS_BASE_URL",
            api_key_env: Some("OPTA_STATS_API_KEY"),
            path: "/statistics",
            auth: AuthStyle::BearerDefault,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "STATSBOMB",
            tier: Tier::One,
            base_url_env: "STATSBOMB_BASE_URL",
            api_key_env: Some("STATSBOMB_API_KEY"),
            path: "/events",
            auth: AuthStyle::BearerDefault,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "SPORTSRADAR",
            tier: Tier::One,
            base_url_env: "SPORTSRADAR_BASE_URL",
            api_key_env: Some("SPORTSRADAR_API_KEY"),
            path: "/statistics",
            auth: AuthStyle::BearerDefault,
            retry: RetryPolicy::default(),
        },
        ProviderSpec {
            name: "FLASHSCORE",
            tier: Tier::Four,
            base_url_env: "FLASHSCORE_BASE_URL",
            api_key_env: None,
            path: "/statistics",
            auth: AuthStyle::None,
            retry: RetryPolicy::default(),
        },
    ]
}

/// RSS is handled outside the declarative table: it is a list of feed URLs
/// (`SPORTS_RSS_FEEDS`, comma-separated, with built-in defaults), not a
/// single templated endpoint — see `normalize::outcome::rss`.
pub fn rss_feed_urls() -> Vec<String> {
    std::env::var("SPORTS_RSS_FEEDS")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.split(',').map(|u| u.trim().to_string()).collect())
        .unwrap_or_else(|| {
            vec![
                "https://www.espn.com/espn/rss/news".to_string(),
                "https://www.skysports.com/rss/12040".to_string(),
            ]
        })
}

/// Fan out to every configured provider for one query, bounded to
/// `concurrency` simultaneous in-flight requests (§5: 3 for outcome
/// queries, 4 for statistic queries).
pub async fn fetch_all(
    fetcher: &Fetcher,
    params: &QueryParams,
    concurrency: usize,
) -> Vec<ProviderOutcome> {
    use futures_util::stream::{self, StreamExt};

    let specs = providers();
    stream::iter(specs.into_iter())
        .map(|spec| {
            let fetcher = fetcher.clone();
            let params = params.clone();
            async move {
                let base_url = match std::env::var(spec.base_url_env) {
                    Ok(v) if !v.trim().is_empty() => v,
                    _ => {
                        info!(provider = spec.name, "provider not configured, skipping");
                        return ProviderOutcome::Skipped {
                            provider: spec.name,
                            reason: format!("{} unset", spec.base_url_env),
                        };
                    }
                };
                let api_key = spec.api_key_env.and_then(|e| std::env::var(e).ok());
                let url = spec.compose_url(&base_url, &params);
                let headers = spec.build_headers(api_key.as_deref());

                match fetcher.fetch(&url, Some(&headers), spec.retry).await {
                    Ok(payload) => ProviderOutcome::Fetched {
                        provider: spec.name,
                        tier: spec.tier,
                        weight: spec.weight(),
                        payload,
                    },
                    Err(failure) => ProviderOutcome::Failed {
                        provider: spec.name,
                        failure,
                    },
                }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_query_string_keeps_every_key_in_order() {
        let params = QueryParams {
            statistic: Some("yellow_cards".to_string()),
            date: Some("2024-11-05".to_string()),
            ..Default::default()
        };
        assert_eq!(
            shared_query_string(&params),
            "statistic=yellow_cards&matchId=&homeTeam=&awayTeam=&date=2024-11-05&competition=&team=&player=&period="
        );
    }

    #[test]
    fn tier_weight_matches_spec_table() {
        assert_eq!(Tier::One.default_weight(), 0.45);
        assert_eq!(Tier::Two.default_weight(), 0.30);
        assert_eq!(Tier::Three.default_weight(), 0.25);
        assert_eq!(Tier::Four.default_weight(), 0.15);
    }

    #[test]
    fn missing_base_url_skips_without_request() {
        std::env::remove_var("THESPORTSDB_BASE_URL");
        let spec = providers().into_iter().find(|p| p.name == "THESPORTSDB").unwrap();
        assert!(std::env::var(spec.base_url_env).is_err());
    }
}

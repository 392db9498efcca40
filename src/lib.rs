//! Deterministic multi-provider resolution core for sports outcome and
//! statistic queries (see SPEC_FULL.md for the full component breakdown).
//!
//! The only inbound call this crate exposes is [`resolve`]: classify the raw
//! query text, fan out to whichever providers are configured, reconcile
//! their payloads under explicit tiering and consensus rules, and return a
//! [`domain::ResolutionResult`] with its evidence trail. Everything else —
//! the HTTP surface, persistence of resolution logs, secret management — is
//! out of scope and lives above this crate.

pub mod advisor;
pub mod classifier;
pub mod config;
pub mod confidence;
pub mod consensus;
pub mod domain;
pub mod error;
pub mod evidence;
pub mod fetcher;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod text;
pub mod validation;

pub use advisor::{Advisor, NullAdvisor};
pub use config::Config;
pub use domain::ResolutionResult;
pub use fetcher::Fetcher;

/// Resolve one raw natural-language query end to end, using the process's
/// default (no-op) advisor. `config` supplies the fan-out concurrency caps
/// (§5); build it once via [`Config::from_env`] and reuse it across calls.
pub async fn resolve(fetcher: &Fetcher, config: &Config, query: &str) -> ResolutionResult {
    orchestrator::resolve(fetcher, &NullAdvisor, config, query).await
}

/// Resolve one raw natural-language query with a caller-supplied advisor.
pub async fn resolve_with_advisor(
    fetcher: &Fetcher,
    advisor: &dyn Advisor,
    config: &Config,
    query: &str,
) -> ResolutionResult {
    orchestrator::resolve(fetcher, advisor, config, query).await
}

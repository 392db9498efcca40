//! CLI entry point: resolve one query against the configured providers and
//! print the result as JSON. The HTTP surface this crate would sit behind is
//! out of scope (§1) — this binary exists so the core is runnable and
//! inspectable on its own.

use anyhow::{Context, Result};
use sportsresolve_core::config::Config;
use sportsresolve_core::Fetcher;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sportsresolve_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env();
    info!(
        outcome_concurrency = config.outcome_concurrency,
        statistic_concurrency = config.statistic_concurrency,
        "sportsresolve core starting"
    );

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Did Lakers beat Suns on 2025-01-15?".to_string());

    let fetcher = Fetcher::new(config.breaker_policy).context("failed to build fetcher")?;
    let result = sportsresolve_core::resolve(&fetcher, &config, &query).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

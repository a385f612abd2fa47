//! NutriLens HTTP proxy
//!
//! Serves the order, estimation, and report routes over plain HTTP.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use nutrilens::build_info;
use nutrilens::config::Config;
use nutrilens::db::Database;
use nutrilens::estimator::OpenAiEstimator;
use nutrilens::proxy::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutrilens=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("HTTP Proxy");

    let config = Config::from_env()?;
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let database = Database::open_migrated(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "database ready");

    let estimator = OpenAiEstimator::from_config(&config)?;
    if !estimator.has_api_key() {
        tracing::warn!("OPENAI_API_KEY is not set; estimation routes will answer 500");
    }

    let state = Arc::new(AppState {
        database,
        estimator: Arc::new(estimator),
        report_timezone: config.report_timezone,
    });

    proxy::serve(config.proxy_addr, state).await?;
    Ok(())
}

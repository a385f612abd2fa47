//! NutriLens
//!
//! An MCP server for nutrient estimation and intake tracking.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutrilens::build_info;
use nutrilens::config::Config;
use nutrilens::db::{self, Database};
use nutrilens::estimator::OpenAiEstimator;
use nutrilens::mcp::NutrilensService;
use nutrilens::tools::status::StatusTracker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries MCP frames
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutrilens=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    build_info::print_startup_banner("MCP Server");
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env()?;
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    eprintln!("Initializing database...");
    let database = Database::open_migrated(&db_path)?;
    let version = database.with_conn(db::migrations::get_schema_version)?;
    eprintln!("Database schema version: {}", version);

    let estimator = OpenAiEstimator::from_config(&config)?;
    if !estimator.has_api_key() {
        tracing::warn!("OPENAI_API_KEY is not set; estimation tools will fail until it is");
    }

    let tracker = StatusTracker::new(
        db_path,
        estimator.model(),
        estimator.has_api_key(),
        config.report_timezone.to_string(),
    );
    let service = NutrilensService::new(tracker, database, Arc::new(estimator), config.report_timezone);

    let server = service.serve((stdin(), stdout())).await?;
    server.waiting().await?;
    tracing::info!("client disconnected, shutting down");

    Ok(())
}

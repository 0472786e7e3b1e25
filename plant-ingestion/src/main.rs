use std::str::FromStr;

use anyhow::Result;
use plant_ingestion::{config::AppConfig, http, ingest, metrics_server, observability, query::PlantQueryService};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let options = SqliteConnectOptions::from_str(&cfg.database.url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect_with(options)
        .await?;

    // Ingestion must finish before any query is served.
    let summary = ingest::run_ingestion(&cfg, pool.clone()).await?;
    tracing::info!(
        persisted = summary.persisted,
        health = %summary.report,
        "plant store ready"
    );

    http::serve(&cfg.http.bind_addr, PlantQueryService::new(pool)).await
}

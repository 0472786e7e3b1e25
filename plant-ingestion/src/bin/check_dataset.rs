use std::{env, path::PathBuf};

use anyhow::{bail, Result};
use plant_ingestion::{config::AppConfig, observability, pipeline, sources::PlantFileSource, transform::PercentageCalculator};

/// Dry run of the ingestion pipeline: read, normalize, annotate, and
/// health-check a dataset without touching the database.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let mut cfg = AppConfig::load()?;
    let mut args = env::args().skip(1);
    if let Some(path) = args.next() {
        cfg.source.path = PathBuf::from(path);
    }
    if let Some(sheet) = args.next() {
        cfg.source.sheet_name = sheet;
    }
    if args.next().is_some() {
        bail!("usage: check_dataset [data_file_path] [sheet_name]");
    }

    let source = PlantFileSource::for_path(&cfg.source.path, &cfg.source.sheet_name);
    let (records, report) = pipeline::prepare(&source, &PercentageCalculator).await?;

    println!("{} records", records.len());
    println!("total annual net generation: {} MWh", report.total_generation);
    println!("total percentage (rounded): {}", report.rounded_total_percentage());
    println!("duplicate plant_id values: {}", report.duplicate_ids);

    if !report.passed() {
        bail!("health checks failed: {report}");
    }
    println!("health checks passed");
    Ok(())
}

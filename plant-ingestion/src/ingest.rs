use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::pipeline::{IngestionSummary, Pipeline, PipelineError};
use crate::sinks::SqlitePlantSink;
use crate::sources::PlantFileSource;
use crate::transform::PercentageCalculator;

/// The startup ingestion run: load the configured file, annotate, validate,
/// and replace the store contents. Any error here must stop the process.
pub async fn run_ingestion(cfg: &AppConfig, pool: SqlitePool) -> Result<IngestionSummary, PipelineError> {
    tracing::info!(
        path = %cfg.source.path.display(),
        sheet = %cfg.source.sheet_name,
        ignore_validation_failure = cfg.source.ignore_validation_failure,
        "starting ingestion run"
    );

    let pipeline = Pipeline {
        source: PlantFileSource::for_path(&cfg.source.path, &cfg.source.sheet_name),
        transform: PercentageCalculator,
        sink: SqlitePlantSink::new(pool, cfg.sink.batch_size),
        policy: cfg.validation_policy(),
    };

    pipeline.run().await
}

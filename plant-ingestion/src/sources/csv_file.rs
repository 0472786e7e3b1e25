use std::path::{Path, PathBuf};

use async_stream::try_stream;

use crate::pipeline::{EnvelopeStream, PipelineError, Source};
use crate::sources::normalize::{Normalizer, PlantRow};
use crate::sources::sheet::{Cell, RawSheet};

/// CSV export of the plant sheet. Same header layout as the workbook,
/// including the column-code row under the header.
pub struct PlantCsvFileSource {
    path: PathBuf,
}

impl PlantCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

pub fn read_csv(path: &Path) -> Result<RawSheet, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::Source(format!("failed to open CSV file {}: {e}", path.display())))?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))?;
        rows.push(record.iter().map(Cell::from_text).collect::<Vec<_>>());
    }

    Ok(RawSheet::from_rows(rows.into_iter()))
}

#[async_trait::async_trait]
impl Source<PlantRow> for PlantCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<PlantRow> {
        let path = self.path.clone();

        let s = try_stream! {
            tracing::info!(path = %path.display(), "reading CSV file");
            let sheet = tokio::task::spawn_blocking(move || read_csv(&path))
                .await
                .map_err(|e| PipelineError::Source(format!("CSV reader task failed: {e}")))??;

            let normalizer = Normalizer::for_headers(&sheet.headers)?;
            for env in normalizer.rows(&sheet) {
                let env = env?;
                metrics::counter!("plant_source_rows_total").increment(1);
                yield env;
            }
        };

        Box::pin(s)
    }
}

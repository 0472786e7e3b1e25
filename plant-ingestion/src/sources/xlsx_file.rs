use std::path::{Path, PathBuf};

use async_stream::try_stream;
use calamine::{open_workbook_auto, Data, Reader};

use crate::pipeline::{EnvelopeStream, PipelineError, Source};
use crate::sources::normalize::{Normalizer, PlantRow};
use crate::sources::sheet::{Cell, RawSheet};

/// Workbook source (`.xlsx`, `.xls`, `.xlsm`, `.ods`) for one named sheet.
///
/// The first row of the sheet holds the descriptive column labels; the row
/// under it holds short column codes and is skipped by the normalizer.
pub struct PlantXlsxFileSource {
    path: PathBuf,
    sheet_name: String,
}

impl PlantXlsxFileSource {
    pub fn new<P: Into<PathBuf>>(path: P, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::from_text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
        // Dates never appear in the plant sheet; error cells read as missing.
        _ => Cell::Empty,
    }
}

/// Blocking read of one worksheet into memory.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<RawSheet, PipelineError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        PipelineError::Source(format!("failed to open workbook {}: {e}", path.display()))
    })?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        PipelineError::Source(format!(
            "failed to read sheet '{sheet_name}' from {}: {e}",
            path.display()
        ))
    })?;

    Ok(RawSheet::from_rows(
        range.rows().map(|row| row.iter().map(data_to_cell).collect()),
    ))
}

#[async_trait::async_trait]
impl Source<PlantRow> for PlantXlsxFileSource {
    async fn stream(&self) -> EnvelopeStream<PlantRow> {
        let path = self.path.clone();
        let sheet_name = self.sheet_name.clone();

        let s = try_stream! {
            tracing::info!(path = %path.display(), sheet = %sheet_name, "reading workbook");
            let sheet = tokio::task::spawn_blocking(move || read_sheet(&path, &sheet_name))
                .await
                .map_err(|e| PipelineError::Source(format!("workbook reader task failed: {e}")))??;

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

pub mod csv_file;
pub mod normalize;
pub mod sheet;
pub mod xlsx_file;

use std::path::Path;

pub use csv_file::PlantCsvFileSource;
pub use normalize::{Normalizer, PlantRow};
pub use sheet::{Cell, RawSheet};
pub use xlsx_file::PlantXlsxFileSource;

use crate::pipeline::{EnvelopeStream, Source};

const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// File-backed plant source, chosen by extension.
pub enum PlantFileSource {
    Xlsx(PlantXlsxFileSource),
    Csv(PlantCsvFileSource),
}

impl PlantFileSource {
    /// Workbook extensions read `sheet_name`; anything else is treated as CSV.
    pub fn for_path(path: &Path, sheet_name: &str) -> Self {
        let is_workbook = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
            .unwrap_or(false);

        if is_workbook {
            Self::Xlsx(PlantXlsxFileSource::new(path, sheet_name))
        } else {
            Self::Csv(PlantCsvFileSource::new(path))
        }
    }
}

#[async_trait::async_trait]
impl Source<PlantRow> for PlantFileSource {
    async fn stream(&self) -> EnvelopeStream<PlantRow> {
        match self {
            Self::Xlsx(s) => s.stream().await,
            Self::Csv(s) => s.stream().await,
        }
    }
}

use crate::pipeline::{Envelope, PipelineError};
use crate::sources::sheet::{Cell, RawSheet};

/// A normalized plant row, before its generation share is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantRow {
    pub plant_id: i64,
    pub plant_name: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub annual_net_generation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Integer,
    Float,
    Text,
}

/// Source label, canonical field name, and type, in `PlantRow` field order.
const COLUMNS: [(&str, &str, FieldKind); 6] = [
    ("Plant file sequence number", "plant_id", FieldKind::Integer),
    ("Plant name", "plant_name", FieldKind::Text),
    ("Plant state abbreviation", "state", FieldKind::Text),
    ("Plant latitude", "latitude", FieldKind::Float),
    ("Plant longitude", "longitude", FieldKind::Float),
    ("Plant annual net generation (MWh)", "annual_net_generation", FieldKind::Float),
];

/// Rows directly under the header that carry column codes rather than data.
const SECONDARY_HEADER_ROWS: usize = 1;

/// Line number (1-based, header included) of the first entry in `RawSheet::rows`.
const FIRST_ROW_LINE: usize = 2;

/// Missing values become zero: `0` for numbers, the empty string for text.
///
/// Kept as a single step so the blanket fill can be replaced with per-field
/// imputation without touching coercion.
fn fill_missing(cell: Option<&Cell>, kind: FieldKind) -> Cell {
    match cell {
        Some(c) if !c.is_missing() => c.clone(),
        _ => match kind {
            FieldKind::Text => Cell::Text(String::new()),
            FieldKind::Integer | FieldKind::Float => Cell::Number(0.0),
        },
    }
}

/// 2^63: the first whole number an `i64` cannot hold.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn invalid(line: usize, column: &str, detail: String) -> PipelineError {
    metrics::counter!("plant_source_cell_errors_total").increment(1);
    PipelineError::Source(format!("line {line}: {detail} in column '{column}'"))
}

fn coerce_f64(cell: &Cell, column: &str, line: usize) -> Result<f64, PipelineError> {
    let n = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(line, column, format!("invalid number '{s}'")))?,
        Cell::Empty => 0.0,
    };

    // NaN and infinities cannot be stored in REAL NOT NULL columns.
    if n.is_finite() {
        Ok(n)
    } else {
        Err(invalid(line, column, format!("non-finite number '{n}'")))
    }
}

fn coerce_i64(cell: &Cell, column: &str, line: usize) -> Result<i64, PipelineError> {
    if let Cell::Text(s) = cell {
        if let Ok(v) = s.trim().parse::<i64>() {
            return Ok(v);
        }
    }

    let n = coerce_f64(cell, column, line)?;
    if n.fract() == 0.0 && n.abs() < I64_LIMIT {
        Ok(n as i64)
    } else {
        Err(invalid(line, column, format!("'{n}' is not a 64-bit integer")))
    }
}

fn coerce_string(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < I64_LIMIT => (*n as i64).to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::Empty => String::new(),
    }
}

/// Maps a sheet's header row onto the fixed plant schema.
#[derive(Debug, Clone)]
pub struct Normalizer {
    indices: [usize; 6],
}

impl Normalizer {
    /// Locate every required column, or report all of the absent ones at once.
    pub fn for_headers(headers: &[String]) -> Result<Self, PipelineError> {
        let mut indices = [0usize; 6];
        let mut missing = Vec::new();

        for (slot, (label, _, _)) in COLUMNS.iter().enumerate() {
            match headers.iter().position(|h| h.trim() == *label) {
                Some(idx) => indices[slot] = idx,
                None => missing.push(label.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(PipelineError::SchemaMismatch { missing });
        }

        Ok(Self { indices })
    }

    /// Fill, then coerce, one data row. `line` is used only for error messages.
    pub fn normalize_row(&self, row: &[Cell], line: usize) -> Result<PlantRow, PipelineError> {
        let cells: [Cell; 6] = std::array::from_fn(|slot| fill_missing(row.get(self.indices[slot]), COLUMNS[slot].2));
        let name = |slot: usize| COLUMNS[slot].1;

        Ok(PlantRow {
            plant_id: coerce_i64(&cells[0], name(0), line)?,
            plant_name: coerce_string(&cells[1]),
            state: coerce_string(&cells[2]),
            latitude: coerce_f64(&cells[3], name(3), line)?,
            longitude: coerce_f64(&cells[4], name(4), line)?,
            annual_net_generation: coerce_f64(&cells[5], name(5), line)?,
        })
    }

    /// Every data row of `sheet`, skipping the secondary header row.
    pub fn rows<'a>(
        &'a self,
        sheet: &'a RawSheet,
    ) -> impl Iterator<Item = Result<Envelope<PlantRow>, PipelineError>> + 'a {
        sheet
            .rows
            .iter()
            .enumerate()
            .skip(SECONDARY_HEADER_ROWS)
            .map(move |(idx, cells)| {
                let line = idx + FIRST_ROW_LINE;
                self.normalize_row(cells, line)
                    .map(|payload| Envelope { payload, row: line })
            })
    }
}

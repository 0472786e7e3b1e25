/// Text markers read as missing values, as spreadsheet exports commonly write them.
const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// A single cell as read from a workbook or CSV file, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// CSV fields arrive as text; blank ones are missing values.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => MISSING_MARKERS.contains(&s.trim()),
            Cell::Number(n) => n.is_nan(),
        }
    }

    /// Header label rendering. Numeric headers are unusual but not an error.
    pub fn to_label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// A whole worksheet: the header row and every row below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    /// Split the first row off as headers.
    pub fn from_rows<I>(mut rows: I) -> Self
    where
        I: Iterator<Item = Vec<Cell>>,
    {
        let headers = rows
            .next()
            .map(|h| h.iter().map(Cell::to_label).collect())
            .unwrap_or_default();
        Self {
            headers,
            rows: rows.collect(),
        }
    }
}

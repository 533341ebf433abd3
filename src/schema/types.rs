// src/schema/types.rs

use serde::{Deserialize, Serialize};

use super::utils::{column_letter, synthetic_label};

/// A typed value as the sheet stored it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    /// Plain rendering: integral numbers drop the fraction, booleans are upper-case.
    pub fn plain_text(&self) -> String {
        match self {
            Scalar::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Bool(true) => "TRUE".to_string(),
            Scalar::Bool(false) => "FALSE".to_string(),
        }
    }
}

/// One cell of a fetched row.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Empty,
    Raw(Scalar),
    /// Formatting already applied upstream; `text` wins for display.
    Formatted { text: String, raw: Option<Scalar> },
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Raw(Scalar::Text(s.into()))
    }

    pub fn number(n: f64) -> Self {
        Cell::Raw(Scalar::Number(n))
    }

    pub fn formatted(text: impl Into<String>, raw: Option<Scalar>) -> Self {
        Cell::Formatted {
            text: text.into(),
            raw,
        }
    }

    /// Textual representation used for comparisons and header scoring.
    /// `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Raw(v) => Some(v.plain_text()),
            Cell::Formatted { text, .. } => Some(text.clone()),
        }
    }

    /// The stored value as plain text, whether or not a formatted form exists.
    pub fn raw_text(&self) -> Option<String> {
        match self {
            Cell::Raw(v) | Cell::Formatted { raw: Some(v), .. } => Some(v.plain_text()),
            _ => None,
        }
    }

    /// `true` when the cell has no text after trimming.
    pub fn is_blank(&self) -> bool {
        self.as_text().map_or(true, |t| t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub cells: Vec<Cell>,
}

impl RawRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Cell at `idx`; short rows read as empty.
    pub fn cell(&self, idx: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.cells.get(idx).unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }
}

/// Declared metadata for one column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub id: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
}

/// The table exactly as fetched, before any inference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<RawRow>,
    /// Header rows the source itself claims to have parsed.
    pub parsed_header_rows: usize,
}

impl RawTable {
    /// Widest row, or the declared column count if larger.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(RawRow::len)
            .max()
            .unwrap_or(0)
            .max(self.columns.len())
    }
}

/// Column index → label. Contiguous from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnLabels(Vec<String>);

impl ColumnLabels {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    /// Label for `idx`, synthesised when the map does not reach that far.
    pub fn get(&self, idx: usize) -> String {
        self.0
            .get(idx)
            .cloned()
            .unwrap_or_else(|| synthetic_label(idx))
    }

    /// Index of the first column carrying `label`.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.0.iter().position(|l| l == label)
    }

    pub fn letter(&self, idx: usize) -> String {
        column_letter(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(String::as_str).enumerate()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

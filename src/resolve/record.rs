use serde::Serialize;

use crate::config::{Grouping, RecordConfig};
use crate::schema::{column_letter, Cell, ColumnLabels, RawRow, Scalar};

/// Which resolver pass produced the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Found in the detected identifier column.
    Primary,
    /// Found by the full-row scan in some other column.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub column: usize,
    pub kind: MatchKind,
    /// The form of the cell that equalled the query.
    pub text: String,
}

/// One display-ready value of the matched row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub index: usize,
    pub letter: String,
    pub label: String,
    pub value: String,
}

/// A single matched row, keyed by column label, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    pub fields: Vec<Field>,
    pub matched_column: usize,
    pub match_kind: MatchKind,
}

impl ResolvedRecord {
    /// Value under `label`. Duplicate labels resolve to the matched
    /// identifier column if it carries the label, else the leftmost one.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .get(self.matched_column)
            .filter(|f| f.label == label)
            .or_else(|| self.fields.iter().find(|f| f.label == label))
            .map(|f| f.value.as_str())
    }

    /// Value by positional letter (`A`, `B`, ... `AA`).
    pub fn get_by_letter(&self, letter: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.letter.eq_ignore_ascii_case(letter))
            .map(|f| f.value.as_str())
    }

    /// The matched identifier cell.
    pub fn identifier(&self) -> &str {
        self.fields
            .get(self.matched_column)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    pub fn identifier_label(&self) -> &str {
        self.fields
            .get(self.matched_column)
            .map(|f| f.label.as_str())
            .unwrap_or_default()
    }

    pub fn used_fallback(&self) -> bool {
        self.match_kind == MatchKind::Fallback
    }
}

/// Convert a row into a label-keyed record.
///
/// Every column the label map covers gets a field. The matched identifier
/// shows the form that matched, so it still equals the query once
/// normalized; every other raw number is grouped.
pub fn to_record(
    row: &RawRow,
    labels: &ColumnLabels,
    matched: Match,
    opts: &RecordConfig,
) -> ResolvedRecord {
    let width = labels.len().max(row.len());
    let fields = (0..width)
        .map(|idx| {
            let cell = row.cell(idx);
            let value = if idx == matched.column && !matched.text.trim().is_empty() {
                matched.text.trim().to_string()
            } else {
                display_value(cell, opts)
            };
            Field {
                index: idx,
                letter: column_letter(idx),
                label: labels.get(idx),
                value,
            }
        })
        .collect();

    ResolvedRecord {
        fields,
        matched_column: matched.column,
        match_kind: matched.kind,
    }
}

/// Formatted text first, then the raw value; blanks become the placeholder.
pub fn display_value(cell: &Cell, opts: &RecordConfig) -> String {
    let shown = match cell {
        Cell::Empty => String::new(),
        Cell::Formatted { text, .. } => text.trim().to_string(),
        Cell::Raw(Scalar::Number(n)) => {
            format_number(*n, opts.grouping, opts.max_fraction_digits)
        }
        Cell::Raw(v) => v.plain_text().trim().to_string(),
    };
    if shown.is_empty() {
        opts.placeholder.clone()
    } else {
        shown
    }
}

/// Grouped number with at most `max_fraction_digits` decimals, trailing
/// zeros dropped: `1234567.5` → `12,34,567.5` (Indian) or `1,234,567.5`.
pub fn format_number(n: f64, grouping: Grouping, max_fraction_digits: usize) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.*}", max_fraction_digits, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let mut out = String::new();
    if n < 0.0 && !(int_part.chars().all(|c| c == '0') && frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, grouping));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str, grouping: Grouping) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let step = match grouping {
        Grouping::Indian => 2,
        Grouping::Western => 3,
    };

    let mut parts = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        parts.push(&head[start..end]);
        end = start;
    }
    parts.reverse();
    format!("{},{}", parts.join(","), tail)
}

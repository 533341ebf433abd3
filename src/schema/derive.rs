use serde::Serialize;
use tracing::{debug, trace};

use super::types::{ColumnLabels, RawRow, RawTable};
use super::utils::{
    column_letter, is_purely_numeric, letter_density, longest_letter_run, synthetic_label,
};
use crate::config::HeuristicConfig;

/// Where the column labels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaderDecision {
    /// Row `H` holds the labels; rows `0..=H` are not data.
    HeaderRow(usize),
    /// No header row; declared column metadata supplied at least one label.
    Declared,
    /// No header row and no usable metadata.
    Synthetic,
}

/// Labels plus the rows left over once header (and banner) rows are removed.
#[derive(Debug, Clone)]
pub struct InferredSchema {
    pub labels: ColumnLabels,
    pub data_rows: Vec<RawRow>,
    pub decision: HeaderDecision,
}

/// Decide which row (if any) is the header, build the label map and strip
/// everything up to and including the header from the data rows.
///
///  - Only the first `search_depth` rows are candidates
///  - A candidate must score on keywords *and* look like words
///  - Highest score wins; ties keep the earliest row
///  - Without a header, declared labels are used only if they are not
///    placeholder letters; all rows stay data
///  - Every column up to the table width ends up labelled
pub fn infer(table: RawTable, heuristics: &HeuristicConfig) -> InferredSchema {
    let width = table.width();
    let RawTable {
        columns,
        mut rows,
        parsed_header_rows,
    } = table;

    if parsed_header_rows > 0 {
        debug!(parsed_header_rows, "source claims parsed header rows");
    }

    let mut labels: Vec<Option<String>> = vec![None; width];

    let decision = match find_header_row(&rows, heuristics) {
        Some(h) => {
            for (i, cell) in rows[h].cells.iter().enumerate() {
                if let Some(text) = cell.as_text() {
                    let text = text.trim();
                    if !text.is_empty() {
                        labels[i] = Some(text.to_string());
                    }
                }
            }
            // banner/title rows above the header go too
            rows.drain(..=h);
            debug!(header_row = h, "header row selected");
            HeaderDecision::HeaderRow(h)
        }
        None => {
            let mut accepted = 0;
            for (i, meta) in columns.iter().enumerate() {
                let declared = meta.label.as_deref().map(str::trim).unwrap_or("");
                if is_real_label(declared, i) {
                    labels[i] = Some(declared.to_string());
                    accepted += 1;
                }
            }
            if accepted > 0 {
                debug!(accepted, "no header row; using declared column labels");
                HeaderDecision::Declared
            } else {
                debug!("no header row or usable metadata; synthetic labels");
                HeaderDecision::Synthetic
            }
        }
    };

    let labels = labels
        .into_iter()
        .enumerate()
        .map(|(i, l)| l.unwrap_or_else(|| synthetic_label(i)))
        .collect();

    InferredSchema {
        labels: ColumnLabels::new(labels),
        data_rows: rows,
        decision,
    }
}

/// Index of the best header candidate among the first `search_depth` rows.
pub fn find_header_row(rows: &[RawRow], heuristics: &HeuristicConfig) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;

    for (idx, row) in rows.iter().take(heuristics.search_depth).enumerate() {
        let score = keyword_score(row, &heuristics.header_keywords);
        if score == 0 {
            continue;
        }
        if !looks_like_header(row, heuristics) {
            trace!(row = idx, score, "keyword hit but fails shape test");
            continue;
        }
        trace!(row = idx, score, "header candidate");
        match best {
            Some((_, s)) if score <= s => {}
            _ => best = Some((idx, score)),
        }
    }

    best.map(|(idx, _)| idx)
}

/// Number of textual cells containing at least one vocabulary term.
pub fn keyword_score(row: &RawRow, keywords: &[String]) -> usize {
    row.cells
        .iter()
        .filter_map(|c| c.as_text())
        .filter(|t| !is_purely_numeric(t))
        .map(|t| t.to_lowercase())
        .filter(|t| keywords.iter().any(|k| has_keyword(t, k)))
        .count()
}

/// Keywords shorter than three characters (`id`, `no`) must stand as a
/// whole word; longer ones may appear anywhere in the cell.
fn has_keyword(text: &str, keyword: &str) -> bool {
    if keyword.chars().count() < 3 {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        text.contains(keyword)
    }
}

/// Enough of the row's textual cells look like words, not numbers or dates.
pub fn looks_like_header(row: &RawRow, heuristics: &HeuristicConfig) -> bool {
    let (wordy, total) = row
        .cells
        .iter()
        .filter_map(|c| c.as_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && !is_purely_numeric(t))
        .fold((0usize, 0usize), |(w, n), t| {
            let is_word = longest_letter_run(&t) >= heuristics.min_letter_run
                || letter_density(&t) >= heuristics.letter_density;
            (w + usize::from(is_word), n + 1)
        });

    total > 0 && wordy as f64 / total as f64 >= heuristics.shape_ratio
}

/// A declared label counts only if it is not just the column's letter.
fn is_real_label(label: &str, idx: usize) -> bool {
    !label.is_empty()
        && !label.eq_ignore_ascii_case(&column_letter(idx))
        && !label.eq_ignore_ascii_case(&synthetic_label(idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Cell, ColumnMeta};

    fn row(cells: &[&str]) -> RawRow {
        RawRow::new(
            cells
                .iter()
                .map(|s| if s.is_empty() { Cell::Empty } else { Cell::text(*s) })
                .collect(),
        )
    }

    fn table(rows: Vec<RawRow>) -> RawTable {
        RawTable {
            rows,
            ..Default::default()
        }
    }

    #[test]
    fn clean_header_at_top() {
        let h = HeuristicConfig::default();
        let t = table(vec![
            row(&["Emp ID", "Name", "Net Pay"]),
            row(&["E100", "Asha", "45,000"]),
        ]);
        let s = infer(t, &h);
        assert_eq!(s.decision, HeaderDecision::HeaderRow(0));
        assert_eq!(s.labels.as_slice(), ["Emp ID", "Name", "Net Pay"]);
        assert_eq!(s.data_rows.len(), 1);
        assert_eq!(s.data_rows[0].cell(0), &Cell::text("E100"));
    }

    #[test]
    fn banner_row_is_skipped() {
        let h = HeuristicConfig::default();
        let t = table(vec![
            row(&["Monthly Payroll Report"]),
            row(&["Emp ID", "Name", "Net Pay"]),
            row(&["E100", "Asha", "45,000"]),
            row(&["E101", "Ravi", "38,500"]),
        ]);
        let s = infer(t, &h);
        assert_eq!(s.decision, HeaderDecision::HeaderRow(1));
        assert_eq!(s.labels.get(2), "Net Pay");
        assert_eq!(s.data_rows.len(), 2);
        assert_eq!(s.data_rows[0].cell(0), &Cell::text("E100"));
    }

    #[test]
    fn unique_max_within_depth_wins() {
        let h = HeuristicConfig::default();
        let t = table(vec![
            row(&["Salary", "", ""]),
            row(&["Emp Code", "Employee Name", "Basic", "Net Pay"]),
            row(&["Bank", "x", "y"]),
            row(&["E1", "Asha", "1", "2"]),
        ]);
        let s = infer(t, &h);
        assert_eq!(s.decision, HeaderDecision::HeaderRow(1));
        assert_eq!(s.data_rows.len(), 2);
        assert_eq!(s.labels.len(), 4);
    }

    #[test]
    fn ties_keep_earliest_row() {
        let h = HeuristicConfig::default();
        let rows = vec![
            row(&["Name", "Notes"]),
            row(&["Salary", "Remarks"]),
            row(&["E1", "x"]),
        ];
        assert_eq!(find_header_row(&rows, &h), Some(0));
    }

    #[test]
    fn rows_beyond_depth_are_not_candidates() {
        let mut h = HeuristicConfig::default();
        h.search_depth = 2;
        let rows = vec![
            row(&["1", "2"]),
            row(&["3", "4"]),
            row(&["Emp ID", "Name"]),
        ];
        assert_eq!(find_header_row(&rows, &h), None);
    }

    #[test]
    fn numeric_and_date_rows_never_become_header() {
        let h = HeuristicConfig::default();
        let dates = RawRow::new(vec![
            Cell::formatted("01/05/2024", None),
            Cell::formatted("45,000", Some(crate::schema::Scalar::Number(45000.0))),
        ]);
        assert!(!looks_like_header(&dates, &h));
        assert_eq!(keyword_score(&dates, &h.header_keywords), 0);

        // keyword present but the row is dominated by short codes
        let coded = row(&["1", "Q31", "X-12", "7A9", "pay"]);
        assert_eq!(keyword_score(&coded, &h.header_keywords), 1);
        assert!(!looks_like_header(&coded, &h));

        assert!(!looks_like_header(&row(&["", ""]), &h));
    }

    #[test]
    fn short_identifier_terms_match_whole_words_only() {
        let h = HeuristicConfig::default();
        assert_eq!(keyword_score(&row(&["ID", "Amount"]), &h.header_keywords), 1);
        assert_eq!(keyword_score(&row(&["S.No", "Staff"]), &h.header_keywords), 2);
        assert_eq!(keyword_score(&row(&["Vinod", "Holiday"]), &h.header_keywords), 0);

        let t = table(vec![row(&["ID", "Amount"]), row(&["E1", "100"])]);
        let s = infer(t, &h);
        assert_eq!(s.decision, HeaderDecision::HeaderRow(0));
        assert_eq!(s.labels.get(0), "ID");
    }

    #[test]
    fn no_header_no_metadata_goes_synthetic() {
        let h = HeuristicConfig::default();
        let t = RawTable {
            columns: vec![
                ColumnMeta {
                    id: Some("A".into()),
                    label: Some("".into()),
                    ty: Some("string".into()),
                },
                ColumnMeta {
                    id: Some("B".into()),
                    label: Some("B".into()),
                    ty: Some("string".into()),
                },
            ],
            rows: vec![row(&["E100", "Asha", "45000"]), row(&["E101", "Ravi", "1"])],
            parsed_header_rows: 0,
        };
        let s = infer(t, &h);
        assert_eq!(s.decision, HeaderDecision::Synthetic);
        assert_eq!(s.labels.as_slice(), ["Column A", "Column B", "Column C"]);
        assert_eq!(s.data_rows.len(), 2);
    }

    #[test]
    fn declared_labels_used_when_real() {
        let h = HeuristicConfig::default();
        let t = RawTable {
            columns: vec![
                ColumnMeta {
                    label: Some("Emp ID".into()),
                    ..Default::default()
                },
                ColumnMeta {
                    label: Some("b".into()),
                    ..Default::default()
                },
                ColumnMeta {
                    label: Some("Net Pay".into()),
                    ..Default::default()
                },
            ],
            rows: vec![row(&["E100", "Asha", "45000"])],
            parsed_header_rows: 1,
        };
        let s = infer(t, &h);
        assert_eq!(s.decision, HeaderDecision::Declared);
        assert_eq!(s.labels.as_slice(), ["Emp ID", "Column B", "Net Pay"]);
        assert_eq!(s.data_rows.len(), 1);
    }

    #[test]
    fn blank_header_cells_get_synthetic_labels() {
        let h = HeuristicConfig::default();
        let t = table(vec![
            row(&["Emp ID", "", "Net Pay"]),
            row(&["E100", "Asha", "45,000", "extra"]),
        ]);
        let s = infer(t, &h);
        assert_eq!(
            s.labels.as_slice(),
            ["Emp ID", "Column B", "Net Pay", "Column D"]
        );
    }
}

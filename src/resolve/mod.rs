pub mod record;

pub use record::{to_record, Field, Match, MatchKind, ResolvedRecord};

use tracing::{debug, warn};

use crate::config::{FallbackPolicy, RecordConfig, ResolveConfig};
use crate::error::{Result, SearchError};
use crate::schema::{normalize, Cell, ColumnLabels, RawRow};

/// Find the row for `query` and turn it into a record.
///
///  1) scan the identifier column, first hit wins
///  2) if nothing matched (and the policy allows), scan every column of
///     every row in order
///  3) otherwise `NotFound`
///
/// Blank queries and blank cells never match.
pub fn resolve(
    query: &str,
    rows: &[RawRow],
    labels: &ColumnLabels,
    id_column: usize,
    policy: &ResolveConfig,
    opts: &RecordConfig,
) -> Result<ResolvedRecord> {
    let target = normalize(query);
    let not_found = || SearchError::NotFound {
        query: query.trim().to_string(),
        column_label: labels.get(id_column),
    };
    if target.is_empty() {
        return Err(not_found());
    }

    if let Some((row, text)) = rows
        .iter()
        .find_map(|row| matching_form(row.cell(id_column), &target).map(|t| (row, t)))
    {
        debug!(column = id_column, "matched in identifier column");
        let m = Match {
            column: id_column,
            kind: MatchKind::Primary,
            text,
        };
        return Ok(to_record(row, labels, m, opts));
    }

    if policy.fallback == FallbackPolicy::Deny {
        debug!("identifier column had no match; fallback scan disabled");
        return Err(not_found());
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let hit = row
            .cells
            .iter()
            .enumerate()
            .find_map(|(col, c)| matching_form(c, &target).map(|t| (col, t)));
        if let Some((col, text)) = hit {
            warn!(
                row = row_idx,
                column = col,
                label = %labels.get(col),
                expected = %labels.get(id_column),
                "matched outside the identifier column"
            );
            let m = Match {
                column: col,
                kind: MatchKind::Fallback,
                text,
            };
            return Ok(to_record(row, labels, m, opts));
        }
    }

    Err(not_found())
}

/// The first form of `cell` (displayed text, then stored value) whose
/// normalization equals the already normalized, non-empty target.
fn matching_form(cell: &Cell, target: &str) -> Option<String> {
    [cell.as_text(), cell.raw_text()]
        .into_iter()
        .flatten()
        .find(|t| {
            let n = normalize(t);
            !n.is_empty() && n == target
        })
}

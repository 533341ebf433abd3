use tracing::debug;

use super::types::ColumnLabels;

/// First column whose label mentions an identifier keyword, else column A.
pub fn detect_id_column(labels: &ColumnLabels, id_keywords: &[String]) -> usize {
    for (idx, label) in labels.iter() {
        let lower = label.to_lowercase();
        if let Some(k) = id_keywords.iter().find(|k| lower.contains(k.as_str())) {
            debug!(column = idx, label, keyword = %k, "identifier column detected");
            return idx;
        }
    }
    debug!("no identifier-like label; defaulting to column A");
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeuristicConfig;

    fn labels(ls: &[&str]) -> ColumnLabels {
        ColumnLabels::new(ls.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn first_match_in_index_order() {
        let kw = HeuristicConfig::default().id_keywords;
        assert_eq!(detect_id_column(&labels(&["S.No", "Emp ID", "Name"]), &kw), 1);
        assert_eq!(
            detect_id_column(&labels(&["Name", "Staff Code", "Employee ID"]), &kw),
            1
        );
    }

    #[test]
    fn synthetic_labels_fall_back_to_a() {
        let kw = HeuristicConfig::default().id_keywords;
        let ls = labels(&["Column A", "Column B", "Column C"]);
        assert_eq!(detect_id_column(&ls, &kw), 0);
        assert_eq!(detect_id_column(&ColumnLabels::default(), &kw), 0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let kw = vec!["emp".to_string()];
        assert_eq!(detect_id_column(&labels(&["NAME", "EMPLOYEE"]), &kw), 1);
    }
}

// src/fetch/gviz.rs

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::schema::{Cell, ColumnMeta, RawRow, RawTable, Scalar};

/// The query endpoint wraps its JSON in a JS callback.
static ENVELOPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)google\.visualization\.Query\.setResponse\((.*)\);")
        .expect("envelope regex should compile")
});

#[derive(Debug, Deserialize)]
struct Response {
    status: Option<String>,
    #[serde(default)]
    errors: Vec<Issue>,
    table: Option<Table>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    reason: Option<String>,
    message: Option<String>,
    detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(default)]
    cols: Vec<ColumnMeta>,
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default, rename = "parsedNumHeaders")]
    parsed_num_headers: usize,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    c: Vec<Option<RawCell>>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    v: Option<Value>,
    f: Option<String>,
}

/// Unwrap the `setResponse(...)` envelope and turn the payload into a table.
///
/// `status: "error"` becomes `SearchError::Source` with the first error's
/// message; anything that does not deserialize is `SearchError::Format`.
pub fn parse_response(body: &str) -> Result<RawTable> {
    let json = ENVELOPE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| SearchError::Format("missing setResponse wrapper".into()))?;

    let resp: Response = serde_json::from_str(json.as_str())?;

    if resp.status.as_deref() == Some("error") {
        let msg = resp
            .errors
            .into_iter()
            .next()
            .and_then(|e| {
                debug!(reason = ?e.reason, "source reported error");
                e.message.or(e.detailed_message)
            })
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(SearchError::Source(msg));
    }

    let table = resp
        .table
        .ok_or_else(|| SearchError::Format("response carries no table".into()))?;

    Ok(RawTable {
        columns: table.cols,
        rows: table
            .rows
            .into_iter()
            .map(|r| RawRow::new(r.c.into_iter().map(into_cell).collect()))
            .collect(),
        parsed_header_rows: table.parsed_num_headers,
    })
}

fn into_cell(cell: Option<RawCell>) -> Cell {
    let Some(RawCell { v, f }) = cell else {
        return Cell::Empty;
    };
    let raw = v.and_then(into_scalar);
    match (f, raw) {
        (Some(text), raw) => Cell::Formatted { text, raw },
        (None, Some(raw)) => Cell::Raw(raw),
        (None, None) => Cell::Empty,
    }
}

fn into_scalar(v: Value) -> Option<Scalar> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(Scalar::Bool(b)),
        Value::Number(n) => n.as_f64().map(Scalar::Number),
        Value::String(s) => Some(Scalar::Text(s)),
        other => Some(Scalar::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r##"/*O_o*/
google.visualization.Query.setResponse({"version":"0.6","reqId":"0","status":"ok","sig":"1","table":{"cols":[{"id":"A","label":"Emp ID","type":"string"},{"id":"B","label":"","type":"string"},{"id":"C","label":"Net Pay","type":"number","pattern":"#,##0"}],"rows":[{"c":[{"v":"E100"},{"v":"Asha"},{"v":45000.0,"f":"45,000"}]},{"c":[{"v":"E101"},null,{"v":null}]}],"parsedNumHeaders":1}});"##;

    #[test]
    fn parses_ok_payload() {
        let t = parse_response(OK_BODY).unwrap();
        assert_eq!(t.columns.len(), 3);
        assert_eq!(t.columns[0].label.as_deref(), Some("Emp ID"));
        assert_eq!(t.columns[2].ty.as_deref(), Some("number"));
        assert_eq!(t.parsed_header_rows, 1);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].cell(0), &Cell::text("E100"));
        assert_eq!(
            t.rows[0].cell(2),
            &Cell::formatted("45,000", Some(Scalar::Number(45000.0)))
        );
        assert_eq!(t.rows[1].cell(1), &Cell::Empty);
        assert_eq!(t.rows[1].cell(2), &Cell::Empty);
    }

    #[test]
    fn error_status_is_source_error() {
        let body = r#"google.visualization.Query.setResponse({"version":"0.6","status":"error","errors":[{"reason":"invalid_query","message":"INVALID_QUERY","detailed_message":"Invalid sheet name: Foo"}]});"#;
        match parse_response(body) {
            Err(SearchError::Source(msg)) => assert_eq!(msg, "INVALID_QUERY"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_without_message_uses_detail() {
        let body = r#"google.visualization.Query.setResponse({"status":"error","errors":[{"detailed_message":"Access denied"}]});"#;
        match parse_response(body) {
            Err(SearchError::Source(msg)) => assert_eq!(msg, "Access denied"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unwrapped_or_broken_payloads_are_format_errors() {
        assert!(matches!(
            parse_response("<html>Sign in</html>"),
            Err(SearchError::Format(_))
        ));
        assert!(matches!(
            parse_response("google.visualization.Query.setResponse({not json});"),
            Err(SearchError::Format(_))
        ));
        assert!(matches!(
            parse_response(r#"google.visualization.Query.setResponse({"status":"ok"});"#),
            Err(SearchError::Format(_))
        ));
    }

    #[test]
    fn booleans_and_missing_status_are_accepted() {
        let body = r#"google.visualization.Query.setResponse({"table":{"cols":[],"rows":[{"c":[{"v":true},{"v":7}]}]}});"#;
        let t = parse_response(body).unwrap();
        assert_eq!(t.rows[0].cell(0), &Cell::Raw(Scalar::Bool(true)));
        assert_eq!(t.rows[0].cell(1), &Cell::number(7.0));
    }
}

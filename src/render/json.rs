use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Slip, SlipRenderer};
use crate::resolve::MatchKind;

/// Machine-readable slip: label → value, plus metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonSlip<'a> {
    month: &'a str,
    employee_id: &'a str,
    id_label: &'a str,
    match_kind: MatchKind,
    generated_at: String,
    fields: Map<String, Value>,
}

impl JsonRenderer {
    fn document<'a>(&self, slip: &'a Slip) -> JsonSlip<'a> {
        let mut fields = Map::new();
        for f in &slip.record.fields {
            fields
                .entry(f.label.clone())
                .or_insert_with(|| Value::String(f.value.clone()));
        }
        // duplicate labels resolve as in `ResolvedRecord::get`
        if let Some(id) = slip.record.fields.get(slip.record.matched_column) {
            fields.insert(id.label.clone(), Value::String(id.value.clone()));
        }
        JsonSlip {
            month: &slip.month,
            employee_id: slip.record.identifier(),
            id_label: &slip.id_label,
            match_kind: slip.record.match_kind,
            generated_at: slip.generated_at.to_rfc3339(),
            fields,
        }
    }
}

impl SlipRenderer for JsonRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn preview(&self, slip: &Slip) -> String {
        serde_json::to_string_pretty(&self.document(slip)).unwrap_or_default()
    }

    fn render(&self, slip: &Slip) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.document(slip)).context("serializing slip")
    }
}

use anyhow::Result;
use std::fmt::{self, Write};

use super::{Slip, SlipRenderer};

/// Printable plain-text slip. The net pay line, when present, is set apart
/// at the bottom.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    pub title: String,
    pub width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            title: "SALARY SLIP".to_string(),
            width: 48,
        }
    }
}

fn is_net_pay(label: &str) -> bool {
    let l = label.to_lowercase();
    l.contains("net pay") || l.contains("net salary")
}

impl TextRenderer {
    fn body(&self, slip: &Slip) -> Result<String, fmt::Error> {
        let label_w = slip
            .record
            .fields
            .iter()
            .map(|f| f.label.chars().count())
            .max()
            .unwrap_or(0)
            .max("Month".len());

        let mut out = String::new();
        let mut net = Vec::new();
        let mut month_written = false;
        for f in &slip.record.fields {
            if is_net_pay(&f.label) {
                net.push(f);
                continue;
            }
            writeln!(out, "{:<w$} : {}", f.label, f.value, w = label_w)?;
            // month goes right after the identifying columns, as on the printed slip
            if !month_written && f.index >= 1 {
                writeln!(out, "{:<w$} : {}", "Month", slip.month, w = label_w)?;
                month_written = true;
            }
        }
        if !month_written {
            writeln!(out, "{:<w$} : {}", "Month", slip.month, w = label_w)?;
        }
        if !net.is_empty() {
            writeln!(out, "{}", "-".repeat(self.width))?;
            for f in net {
                writeln!(out, "{:<w$} : {}", f.label.to_uppercase(), f.value, w = label_w)?;
            }
        }
        Ok(out)
    }

    fn preview_text(&self, slip: &Slip) -> Result<String, fmt::Error> {
        let mut out = self.body(slip)?;
        if slip.record.used_fallback() {
            writeln!(
                out,
                "(matched in column '{}', not the detected identifier column)",
                slip.id_label
            )?;
        }
        Ok(out)
    }
}

impl SlipRenderer for TextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn preview(&self, slip: &Slip) -> String {
        self.preview_text(slip).unwrap_or_default()
    }

    fn render(&self, slip: &Slip) -> Result<Vec<u8>> {
        let rule = "=".repeat(self.width);
        let mut out = String::new();
        writeln!(out, "{}", rule)?;
        writeln!(out, "{:^w$}", self.title, w = self.width)?;
        writeln!(out, "{:^w$}", slip.month, w = self.width)?;
        writeln!(out, "{}", rule)?;
        out.push_str(&self.body(slip)?);
        writeln!(out, "{}", rule)?;
        writeln!(
            out,
            "Generated {}",
            slip.generated_at.format("%Y-%m-%d %H:%M")
        )?;
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_slip;
    use crate::resolve::MatchKind;

    #[test]
    fn preview_lists_fields_with_month_and_net_pay_last() {
        let slip = sample_slip();
        let preview = TextRenderer::default().preview(&slip);
        let lines: Vec<&str> = preview.lines().collect();

        assert_eq!(lines[0], "Emp ID       : E100");
        assert_eq!(lines[1], "Name         : Asha");
        assert_eq!(lines[2], "Month        : October 2026");
        assert_eq!(lines[3], "Bank Account : N/A");
        assert!(lines[4].starts_with("----"));
        assert_eq!(lines[5], "NET PAY      : 45,000");
    }

    #[test]
    fn fallback_matches_are_flagged() {
        let mut slip = sample_slip();
        slip.record.match_kind = MatchKind::Fallback;
        let preview = TextRenderer::default().preview(&slip);
        assert!(preview.contains("not the detected identifier column"));
    }

    #[test]
    fn rendered_document_has_title_and_stamp() {
        let bytes = TextRenderer::default().render(&sample_slip()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("SALARY SLIP"));
        assert!(text.contains("Generated "));
        assert!(text.contains("NET PAY"));
    }

    #[test]
    fn preview_and_document_share_the_body() {
        let slip = sample_slip();
        let r = TextRenderer::default();
        let text = String::from_utf8(r.render(&slip).unwrap()).unwrap();
        assert!(text.contains(&r.preview(&slip)));
    }
}

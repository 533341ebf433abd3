//! Turning a resolved record into a preview and a saveable slip.

pub mod json;
pub mod text;

pub use json::JsonRenderer;
pub use text::TextRenderer;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::resolve::ResolvedRecord;
use crate::schema::normalize;

/// Everything a renderer needs for one slip.
#[derive(Debug, Clone)]
pub struct Slip {
    pub record: ResolvedRecord,
    pub month: String,
    pub id_label: String,
    pub generated_at: DateTime<Local>,
}

impl Slip {
    pub fn new(record: ResolvedRecord, month: impl Into<String>) -> Self {
        let id_label = record.identifier_label().to_string();
        Self {
            record,
            month: month.into(),
            id_label,
            generated_at: Local::now(),
        }
    }

    /// `SalarySlip_<ID>_<Month>` without extension.
    pub fn file_stem(&self) -> String {
        slip_file_stem(self.record.identifier(), &self.month)
    }
}

/// The document side: a short on-screen preview plus the exportable bytes.
pub trait SlipRenderer {
    fn extension(&self) -> &'static str;
    fn preview(&self, slip: &Slip) -> String;
    fn render(&self, slip: &Slip) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SlipFormat {
    #[default]
    Text,
    Json,
}

impl SlipFormat {
    pub fn renderer(self) -> Box<dyn SlipRenderer + Send + Sync> {
        match self {
            SlipFormat::Text => Box::new(TextRenderer::default()),
            SlipFormat::Json => Box::new(JsonRenderer),
        }
    }
}

/// Runs of anything but letters and digits collapse to one `_`.
fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

pub fn slip_file_stem(employee_id: &str, month: &str) -> String {
    format!(
        "SalarySlip_{}_{}",
        sanitize_component(&normalize(employee_id)),
        sanitize_component(month)
    )
}

/// Render `slip` and write it under `dir`; returns the file path.
pub async fn write_slip(
    dir: impl AsRef<Path>,
    slip: &Slip,
    renderer: &(dyn SlipRenderer + Send + Sync),
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let bytes = renderer.render(slip)?;
    let path = dir.join(format!("{}.{}", slip.file_stem(), renderer.extension()));
    fs::write(&path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), bytes = bytes.len(), "slip written");
    Ok(path)
}

// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://docs.google.com/spreadsheets/d";

/// Top-level settings, loaded from YAML then overridden from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub heuristics: HeuristicConfig,
    pub record: RecordConfig,
    pub resolve: ResolveConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Base of the query endpoint; the sheet id and `/gviz/tq` are appended.
    pub endpoint: String,
    pub sheet_id: Option<String>,
    /// No timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sheet_id: None,
            timeout_secs: None,
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Tuning knobs for header and identifier detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeuristicConfig {
    /// How many leading rows are considered as header candidates.
    pub search_depth: usize,
    /// Share of textual cells that must look like words.
    pub shape_ratio: f64,
    /// A cell looks like a word if it has this many consecutive letters...
    pub min_letter_run: usize,
    /// ...or if letters make up at least this share of its characters.
    pub letter_density: f64,
    pub header_keywords: Vec<String>,
    pub id_keywords: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        let words = |ws: &[&str]| -> Vec<String> { ws.iter().map(|w| w.to_string()).collect() };
        Self {
            search_depth: 5,
            shape_ratio: 0.5,
            min_letter_run: 3,
            letter_density: 0.5,
            header_keywords: words(&[
                "id",
                "no",
                "emp",
                "employee",
                "staff",
                "code",
                "name",
                "pay",
                "salary",
                "wage",
                "gross",
                "basic",
                "deduction",
                "allowance",
                "bonus",
                "bank",
                "account",
                "a/c",
                "ifsc",
                "rate",
                "days",
                "present",
                "absent",
                "designation",
                "department",
            ]),
            id_keywords: words(&[
                "emp id",
                "employee id",
                "emp code",
                "employee code",
                "emp no",
                "id",
                "employee",
                "emp",
                "code",
                "staff",
            ]),
        }
    }
}

/// Digit grouping used when rendering raw numbers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// 12,34,567 (en-IN)
    #[default]
    Indian,
    /// 1,234,567
    Western,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordConfig {
    pub placeholder: String,
    pub grouping: Grouping,
    pub max_fraction_digits: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            placeholder: "N/A".to_string(),
            grouping: Grouping::Indian,
            max_fraction_digits: 2,
        }
    }
}

/// Whether a match outside the detected identifier column is accepted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    #[default]
    Allow,
    Deny,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolveConfig {
    pub fallback: FallbackPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("slips"),
        }
    }
}

impl Config {
    /// Read `path` if given (missing fields take defaults), then apply
    /// `PAYSLIP_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Config::default(),
        };
        cfg.apply_env(|k| env::var(k).ok());
        debug!(?cfg, "loaded config");
        Ok(cfg)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("PAYSLIP_SHEET_ID").filter(|s| !s.trim().is_empty()) {
            self.source.sheet_id = Some(id);
        }
        if let Some(ep) = var("PAYSLIP_ENDPOINT").filter(|s| !s.trim().is_empty()) {
            self.source.endpoint = ep;
        }
        if let Some(dir) = var("PAYSLIP_OUTPUT_DIR").filter(|s| !s.trim().is_empty()) {
            self.output.dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let mut f = NamedTempFile::new()?;
        writeln!(
            f,
            "source:\n  sheet_id: abc123\nheuristics:\n  search_depth: 8\nrecord:\n  grouping: western\nresolve:\n  fallback: deny"
        )?;

        let cfg = Config::load(Some(f.path()))?;
        assert_eq!(cfg.source.sheet_id.as_deref(), Some("abc123"));
        assert_eq!(cfg.source.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.heuristics.search_depth, 8);
        assert_eq!(cfg.heuristics.shape_ratio, 0.5);
        assert!(!cfg.heuristics.id_keywords.is_empty());
        assert_eq!(cfg.record.grouping, Grouping::Western);
        assert_eq!(cfg.record.placeholder, "N/A");
        assert_eq!(cfg.resolve.fallback, FallbackPolicy::Deny);
        Ok(())
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("PAYSLIP_SHEET_ID", "from-env"),
            ("PAYSLIP_OUTPUT_DIR", "/tmp/out"),
            ("PAYSLIP_ENDPOINT", "  "),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.source.sheet_id = Some("from-file".into());
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.source.sheet_id.as_deref(), Some("from-env"));
        assert_eq!(cfg.output.dir, PathBuf::from("/tmp/out"));
        // blank values are ignored
        assert_eq!(cfg.source.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn identifier_terms_count_as_header_words() {
        let h = HeuristicConfig::default();
        for w in ["id", "no"] {
            assert!(h.header_keywords.iter().any(|k| k == w), "missing {w}");
        }
    }
}

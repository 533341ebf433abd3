// src/fetch/mod.rs

pub mod gviz;
pub mod urls;

use reqwest::Client;
use std::{future::Future, time::Duration};
use tracing::{debug, instrument};
use url::Url;

use crate::config::SourceConfig;
use crate::error::{Result, SearchError};
use crate::schema::RawTable;

/// Anything that can hand back a raw table for one named sheet.
pub trait TableSource {
    fn fetch_table(
        &self,
        sheet_id: &str,
        sheet_name: &str,
    ) -> impl Future<Output = Result<RawTable>> + Send;
}

/// Fetches tables through the spreadsheet's public GVIZ query endpoint.
#[derive(Debug, Clone)]
pub struct GvizClient {
    client: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl GvizClient {
    pub fn new(client: Client, source: &SourceConfig) -> Self {
        Self {
            client,
            endpoint: source.endpoint.clone(),
            timeout: source.timeout(),
        }
    }

    async fn get_text(&self, url: &Url) -> Result<String> {
        let mut req = self.client.get(url.clone());
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("GET {} failed: {}", url, e)))?
            .error_for_status()
            .map_err(|e| SearchError::Transport(format!("non-success status: {}", e)))?;
        Ok(resp.text().await?)
    }
}

impl TableSource for GvizClient {
    #[instrument(level = "info", skip(self))]
    async fn fetch_table(&self, sheet_id: &str, sheet_name: &str) -> Result<RawTable> {
        let url = urls::gviz_query_url(&self.endpoint, sheet_id, sheet_name)?;
        debug!(%url, "querying sheet");
        let body = self.get_text(&url).await?;
        debug!(bytes = body.len(), "response received");
        let table = gviz::parse_response(&body)?;
        debug!(
            rows = table.rows.len(),
            cols = table.columns.len(),
            "table decoded"
        );
        Ok(table)
    }
}

use url::{form_urlencoded, Url};

use crate::error::{Result, SearchError};

/// `<endpoint>/<sheet_id>/gviz/tq?tqx=out:json&sheet=<name>` with the
/// sheet name percent-encoded (spaces as `%20`).
pub fn gviz_query_url(endpoint: &str, sheet_id: &str, sheet_name: &str) -> Result<Url> {
    let base = format!(
        "{}/{}/gviz/tq",
        endpoint.trim_end_matches('/'),
        sheet_id.trim()
    );
    let mut url = Url::parse(&base)
        .map_err(|e| SearchError::Transport(format!("invalid query URL {}: {}", base, e)))?;

    let sheet: String = form_urlencoded::byte_serialize(sheet_name.trim().as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    url.set_query(Some(&format!("tqx=out:json&sheet={}", sheet)));
    Ok(url)
}

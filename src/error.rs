//! Tagged outcomes for every stage of a search.

use thiserror::Error;

/// Result type for search stages
pub type Result<T> = std::result::Result<T, SearchError>;

/// Everything that can stop a search before a slip is produced.
///
/// None of these are fatal to the process; the caller shows exactly one
/// message per search and discards any partial state.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network failure or non-success HTTP status
    #[error("Network error or sheet not reachable: {0}")]
    Transport(String),

    /// Payload could not be unwrapped or deserialized
    #[error("Invalid response format ({0}). Is the sheet ID and name correct?")]
    Format(String),

    /// Payload reported its own error status
    #[error("Sheet data error: {0}. Ensure the sheet is public or link-shared.")]
    Source(String),

    /// Table deserialized but holds no data rows after header exclusion
    #[error("Sheet '{0}' has no data rows")]
    EmptyData(String),

    /// Both resolver passes exhausted
    #[error("Employee ID '{query}' not found (checked column '{column_label}' first)")]
    NotFound { query: String, column_label: String },

    /// A newer search replaced this one before it finished
    #[error("Search superseded by a newer request")]
    Superseded,
}

impl SearchError {
    /// `true` when the identifier was simply absent, as opposed to a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::NotFound { .. })
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Format(err.to_string())
    }
}

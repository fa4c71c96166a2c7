use thiserror::Error;

/// Shown when a failed fetch carries no message of its own.
pub const FALLBACK_FETCH_MESSAGE: &str = "Unable to load cards.";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Fetch(#[source] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Deserialize(#[source] reqwest::Error),
    /// The card source answered with an error status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl SourceError {
    /// The text surfaced to the user once retries are exhausted.
    pub fn display_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_FETCH_MESSAGE.to_owned()
        } else {
            message
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing Supabase env vars: {0}")]
    Missing(String),
    #[error("invalid Supabase URL {0:?}: must start with http:// or https://")]
    InvalidUrl(String),
}

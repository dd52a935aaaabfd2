use thiserror::Error;

/// Errors from the Bilibili web API client.
#[derive(Debug, Error)]
pub enum BiliError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("parse error: {0}")]
    Parse(String),
}

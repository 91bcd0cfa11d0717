//! Error types for calendar access.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while obtaining credentials or querying a calendar.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// Failed to read or write a credential file.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Client secret or token is missing or unusable.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The OAuth token endpoint rejected a request.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// Transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the calendar API.
    #[error("calendar API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// An event record could not be interpreted.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Failed to serialize/deserialize data.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL in configuration.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;

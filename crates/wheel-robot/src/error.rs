//! Error types for robot operations.

use thiserror::Error;

/// Errors that can occur while talking to the robot service.
#[derive(Debug, Error)]
pub enum RobotError {
    /// Could not establish a session with the robot.
    #[error("failed to connect to robot at {address}: {reason}")]
    Connect {
        /// Robot address.
        address: String,
        /// Why the last attempt failed.
        reason: String,
    },

    /// Invalid robot address.
    #[error("invalid robot address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    /// Transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The robot rejected a call.
    #[error("{method} failed with status {status}: {body}")]
    Rpc {
        /// Fully qualified method.
        method: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// No motor component with the given name.
    #[error("motor '{0}' not found")]
    MotorNotFound(String),

    /// Failed to serialize/deserialize data.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for robot operations.
pub type Result<T> = std::result::Result<T, RobotError>;

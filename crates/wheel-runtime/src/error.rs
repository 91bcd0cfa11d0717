//! Error types for the runtime crate.

use thiserror::Error;

use wheel_models::Slot;
use wheel_robot::RobotError;

/// A move that stopped before reaching its target.
///
/// `reached` is the slot after the last step that succeeded; it is what the
/// caller must keep as the wheel's position.
#[derive(Debug, Error)]
#[error("wheel stopped at slot {reached} on the way to slot {target}: {source}")]
pub struct MoveError {
    /// Slot after the last successful step.
    pub reached: Slot,
    /// Slot the move was heading for.
    pub target: Slot,
    /// The failed step command.
    #[source]
    pub source: RobotError,
}

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Runtime not started.
    #[error("runtime not started")]
    NotStarted,

    /// Runtime already started.
    #[error("runtime already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),

    /// The control loop task ended without being asked to.
    #[error("control loop ended unexpectedly: {0}")]
    LoopEnded(String),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_error_reports_partial_slot() {
        let error = MoveError {
            reached: Slot::new(1).unwrap(),
            target: Slot::HOME,
            source: RobotError::MotorNotFound("wheel_motor".to_string()),
        };
        let message = error.to_string();
        assert!(message.starts_with("wheel stopped at slot 1 on the way to slot 0"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_runtime_error_display() {
        assert_eq!(
            RuntimeError::NotStarted.to_string(),
            "runtime not started"
        );
        assert_eq!(
            RuntimeError::LoopEnded("panicked".to_string()).to_string(),
            "control loop ended unexpectedly: panicked"
        );
    }
}

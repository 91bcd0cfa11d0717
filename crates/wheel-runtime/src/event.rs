//! Runtime events.

use wheel_models::{Slot, Status};

/// Events emitted by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// The wheel was homed at startup.
    Calibrated {
        /// Calibration steps that failed.
        failed_steps: usize,
    },
    /// A status was resolved from the calendar.
    StatusResolved {
        /// Resolved status.
        status: Status,
    },
    /// The wheel reached a new slot.
    WheelMoved {
        /// Slot before the move.
        from: Slot,
        /// Slot after the move.
        to: Slot,
    },
    /// A move stopped early because a step failed.
    MoveInterrupted {
        /// Slot the wheel was left in.
        reached: Slot,
        /// Slot the move was heading for.
        target: Slot,
        /// Error message.
        error: String,
    },
    /// The calendar could not be read.
    SourceFailed {
        /// Error message.
        error: String,
    },
}

impl RuntimeEvent {
    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RuntimeEvent::MoveInterrupted { .. } | RuntimeEvent::SourceFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_error() {
        let event = RuntimeEvent::StatusResolved {
            status: Status::Available,
        };
        assert!(!event.is_error());

        let event = RuntimeEvent::WheelMoved {
            from: Slot::HOME,
            to: Status::Available.slot(),
        };
        assert!(!event.is_error());

        let event = RuntimeEvent::SourceFailed {
            error: "unreachable".to_string(),
        };
        assert!(event.is_error());

        let event = RuntimeEvent::MoveInterrupted {
            reached: Slot::HOME,
            target: Slot::MAX,
            error: "deadline exceeded".to_string(),
        };
        assert!(event.is_error());
    }
}

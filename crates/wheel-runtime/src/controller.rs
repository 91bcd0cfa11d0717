//! Moves the physical wheel one slot at a time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use wheel_models::{Slot, Status};
use wheel_robot::{Motor, RobotError};

use crate::config::RuntimeConfig;
use crate::error::MoveError;

/// Result of the startup homing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Slot the wheel is assumed to be in afterwards (always home).
    pub slot: Slot,
    /// Steps issued.
    pub steps: usize,
    /// Steps that reported an error.
    pub failed_steps: usize,
}

/// Drives the wheel motor between slots.
///
/// The controller holds no position of its own: callers pass the current
/// slot in and keep the slot handed back.
#[derive(Clone)]
pub struct WheelController {
    motor: Arc<dyn Motor>,
    step_power: f64,
}

impl WheelController {
    /// Creates a controller applying `step_power` per step.
    pub fn new(motor: Arc<dyn Motor>, step_power: f64) -> Self {
        Self {
            motor,
            step_power: step_power.abs(),
        }
    }

    /// Creates a controller from runtime configuration.
    pub fn from_config(motor: Arc<dyn Motor>, config: &RuntimeConfig) -> Self {
        Self::new(motor, config.step_power)
    }

    /// Returns the motor being driven.
    pub fn motor(&self) -> &Arc<dyn Motor> {
        &self.motor
    }

    async fn step_toward_lower(&self) -> Result<(), RobotError> {
        self.motor.set_power(-self.step_power).await
    }

    async fn step_toward_higher(&self) -> Result<(), RobotError> {
        self.motor.set_power(self.step_power).await
    }

    /// Moves the wheel from `current` to the slot of `target`.
    ///
    /// Issues one single-step command per slot crossed, never wrapping
    /// between 5 and 0. Stops at the first failed step; the error carries the
    /// slot reached by the steps that succeeded.
    pub async fn advance(&self, current: Slot, target: Status) -> Result<Slot, MoveError> {
        let target_slot = target.slot();
        if current == target_slot {
            debug!(slot = %current, status = %target, "wheel already in position");
            return Ok(current);
        }

        info!(
            from = %current,
            to = %target_slot,
            steps = current.offset_to(target_slot).unsigned_abs(),
            status = %target,
            "turning wheel"
        );

        let mut slot = current;
        while slot != target_slot {
            let next = slot.toward(target_slot);
            let stepped = if next < slot {
                self.step_toward_lower().await
            } else {
                self.step_toward_higher().await
            };

            if let Err(source) = stepped {
                warn!(
                    reached = %slot,
                    target = %target_slot,
                    error = %source,
                    "wheel step failed"
                );
                return Err(MoveError {
                    reached: slot,
                    target: target_slot,
                    source,
                });
            }
            slot = next;
        }

        Ok(slot)
    }

    /// Homes the wheel by stepping `steps` times toward slot 0.
    ///
    /// Failed steps are logged and skipped; the wheel is assumed home afterwards.
    pub async fn calibrate(&self, steps: usize) -> Calibration {
        info!(steps, "turning wheel to initial position 0");

        let mut failed_steps = 0;
        for step in 1..=steps {
            if let Err(e) = self.step_toward_lower().await {
                failed_steps += 1;
                warn!(step, steps, error = %e, "calibration step failed");
            }
        }

        Calibration {
            slot: Slot::HOME,
            steps,
            failed_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingMotor;

    const POWER: f64 = 1.0 / 6.0;

    fn slot(index: i64) -> Slot {
        Slot::new(index).unwrap()
    }

    fn controller(motor: &Arc<RecordingMotor>) -> WheelController {
        WheelController::new(Arc::clone(motor) as Arc<dyn Motor>, POWER)
    }

    #[tokio::test]
    async fn test_advance_up_two_slots() {
        let motor = Arc::new(RecordingMotor::new());
        let result = controller(&motor).advance(slot(2), Status::Available).await;

        assert_eq!(result.unwrap(), slot(4));
        assert_eq!(motor.powers(), vec![POWER, POWER]);
    }

    #[tokio::test]
    async fn test_advance_down_is_negative_power() {
        let motor = Arc::new(RecordingMotor::new());
        let result = controller(&motor).advance(slot(3), Status::WorkFromHome).await;

        assert_eq!(result.unwrap(), slot(1));
        assert_eq!(motor.powers(), vec![-POWER, -POWER]);
    }

    #[tokio::test]
    async fn test_advance_same_slot_is_noop() {
        let motor = Arc::new(RecordingMotor::new());
        let wheel = controller(&motor);

        assert_eq!(wheel.advance(slot(3), Status::FocusTime).await.unwrap(), slot(3));
        assert_eq!(wheel.advance(slot(5), Status::InMeeting).await.unwrap(), slot(5));
        assert_eq!(motor.calls(), 0);
    }

    #[tokio::test]
    async fn test_advance_never_wraps() {
        let motor = Arc::new(RecordingMotor::new());
        let result = controller(&motor).advance(slot(5), Status::OutOfOffice).await;

        assert_eq!(result.unwrap(), Slot::HOME);
        assert_eq!(motor.powers(), vec![-POWER; 5]);
    }

    #[tokio::test]
    async fn test_advance_stops_at_failed_step() {
        let motor = Arc::new(RecordingMotor::failing_on([2]));
        let err = controller(&motor)
            .advance(slot(2), Status::OutOfOffice)
            .await
            .unwrap_err();

        assert_eq!(err.reached, slot(1));
        assert_eq!(err.target, Slot::HOME);
        assert!(matches!(err.source, RobotError::Rpc { .. }));
        // No retry of the failed step.
        assert_eq!(motor.calls(), 2);
    }

    #[tokio::test]
    async fn test_advance_first_step_fails() {
        let motor = Arc::new(RecordingMotor::failing_on([1]));
        let err = controller(&motor)
            .advance(slot(0), Status::InMeeting)
            .await
            .unwrap_err();

        assert_eq!(err.reached, Slot::HOME);
        assert_eq!(motor.calls(), 1);
    }

    #[tokio::test]
    async fn test_calibrate_issues_all_steps() {
        let motor = Arc::new(RecordingMotor::new());
        let calibration = controller(&motor).calibrate(6).await;

        assert_eq!(calibration.slot, Slot::HOME);
        assert_eq!(calibration.steps, 6);
        assert_eq!(calibration.failed_steps, 0);
        assert_eq!(motor.powers(), vec![-POWER; 6]);
    }

    #[tokio::test]
    async fn test_calibrate_tolerates_failures() {
        let motor = Arc::new(RecordingMotor::failing_on([1, 4, 6]));
        let calibration = controller(&motor).calibrate(6).await;

        assert_eq!(calibration.slot, Slot::HOME);
        assert_eq!(calibration.failed_steps, 3);
        assert_eq!(motor.calls(), 6);
    }

    #[test]
    fn test_from_config_uses_step_power() {
        let motor: Arc<dyn Motor> = Arc::new(RecordingMotor::new());
        let config = RuntimeConfig::new().with_step_power(0.5);
        let wheel = WheelController::from_config(motor, &config);
        assert_eq!(wheel.step_power, 0.5);
        assert_eq!(wheel.motor().name(), "wheel_motor");
    }
}

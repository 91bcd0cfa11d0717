//! The actuator port driven by the wheel controller.

use async_trait::async_trait;

use crate::error::Result;

/// A motor that turns the wheel.
///
/// Each `set_power` call is one blocking "apply power for a step" command.
/// Calls may fail independently of each other.
#[async_trait]
pub trait Motor: Send + Sync {
    /// Component name of the motor.
    fn name(&self) -> &str;

    /// Applies `power` (a signed fraction of full power) for one step.
    async fn set_power(&self, power: f64) -> Result<()>;
}

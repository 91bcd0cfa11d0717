//! Robot access for the status wheel.
//!
//! The runtime only ever talks to a [`Motor`]: one call applies power for a
//! single wheel step. [`RobotClient`] connects to the robot service and hands
//! out [`RobotMotor`] handles by component name.

pub mod client;
pub mod error;
pub mod motor;

pub use client::{ApiKey, ResourceName, RobotClient, RobotMotor, DEFAULT_MOTOR_NAME};
pub use error::{Result, RobotError};
pub use motor::Motor;

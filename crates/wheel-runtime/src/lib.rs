//! Status resolution and wheel control for the status wheel.
//!
//! This crate provides the control loop that keeps the wheel in step with
//! the calendar:
//! - `StatusResolver` - maps the next calendar event to a `Status`
//! - `WheelController` - turns the wheel slot by slot to a status
//! - `StatusDriver` - owns the wheel position and runs resolve/move/wait cycles
//! - `Runtime` - runs a driver in the background until shut down
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wheel_runtime::{Runtime, RuntimeConfig, StatusDriver, WheelController};
//!
//! let config = RuntimeConfig::default();
//! let controller = WheelController::from_config(motor, &config);
//! let mut runtime = Runtime::new(StatusDriver::new(calendar, controller, config));
//!
//! runtime.start()?;
//! tokio::signal::ctrl_c().await?;
//! runtime.shutdown().await?;
//! ```
//!
//! # Failure handling
//!
//! A failed calendar read or wheel step never stops the loop. The wheel
//! position is only advanced for steps that succeeded, and the next cycle
//! starts straight away (or after the configured backoff) from that position.
//! Calibration failures at startup are logged and ignored.

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod event;
pub mod resolver;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Backoff, RuntimeConfig};
pub use controller::{Calibration, WheelController};
pub use driver::{CycleOutcome, LoopState, StatusDriver};
pub use error::{MoveError, Result, RuntimeError};
pub use event::RuntimeEvent;
pub use resolver::StatusResolver;
pub use runtime::Runtime;

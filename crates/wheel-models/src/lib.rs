//! Core data models for the status wheel.
//!
//! This crate provides the value types shared by the calendar client, the
//! robot client and the runtime: the six availability [`Status`] codes, the
//! physical wheel [`Slot`] they map to, and the read-only [`CalendarEvent`]
//! the status is derived from.

pub mod error;
pub mod event;
pub mod status;

pub use error::{ModelError, Result};
pub use event::{CalendarEvent, EventKind, EventStart, OFFICE_LABEL};
pub use status::{Slot, Status};

//! Error types for model conversions.

use thiserror::Error;

/// Errors that can occur when building model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// Slot index outside the wheel.
    #[error("slot {0} out of range (0..={max})", max = crate::Slot::MAX.index())]
    SlotOutOfRange(i64),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

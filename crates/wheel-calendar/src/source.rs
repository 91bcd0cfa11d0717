//! The calendar port polled by the runtime.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wheel_models::CalendarEvent;

use crate::error::Result;

/// Supplies the next upcoming calendar event.
///
/// Implementations list at most one event: not deleted, recurring events
/// expanded, ordered by start time, starting at or after `now`.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Returns the next event, or `None` when the calendar is clear.
    async fn next_event(&self, now: DateTime<Utc>) -> Result<Option<CalendarEvent>>;
}

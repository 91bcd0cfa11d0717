//! Derives the availability status from the next calendar event.

use chrono::{DateTime, Utc};
use tracing::debug;

use wheel_models::{CalendarEvent, EventKind, Status};

/// Maps "now" and the next event to a [`Status`].
///
/// Rules, first match wins:
/// 1. no event: `Available`
/// 2. a working-location event not labelled "Office": `WorkFromHome`
/// 3. any other event starting after the imminent window: `Available`
/// 4. starting within the window: `GoingToEvent`
/// 5. already started (or an office working-location): by kind
#[derive(Debug, Clone, Copy)]
pub struct StatusResolver {
    imminent_window: chrono::Duration,
}

impl Default for StatusResolver {
    fn default() -> Self {
        Self::new(chrono::Duration::minutes(5))
    }
}

impl StatusResolver {
    /// Creates a resolver with the given imminent window.
    pub fn new(imminent_window: chrono::Duration) -> Self {
        Self { imminent_window }
    }

    /// Returns the imminent window.
    pub fn imminent_window(&self) -> chrono::Duration {
        self.imminent_window
    }

    /// Resolves the status to show at `now`.
    pub fn resolve(&self, now: DateTime<Utc>, next: Option<&CalendarEvent>) -> Status {
        let Some(event) = next else {
            debug!("no upcoming event, so AVAILABLE");
            return Status::Available;
        };

        if event.kind == EventKind::WorkingLocation {
            if !event.is_office_location() {
                debug!(label = ?event.label, "working away from the office, so WORK_FROM_HOME");
                return Status::WorkFromHome;
            }
        } else {
            let delta = event.starts_at() - now;
            if delta > self.imminent_window {
                debug!(
                    minutes = delta.num_minutes(),
                    "next event is outside the imminent window, so AVAILABLE"
                );
                return Status::Available;
            }
            if delta > chrono::Duration::zero() {
                debug!(
                    seconds = delta.num_seconds(),
                    "next event is within the imminent window, so GOING_TO_EVENT"
                );
                return Status::GoingToEvent;
            }
        }

        let status = status_for_kind(&event.kind);
        debug!(
            kind = %event.kind,
            all_day = event.start.is_all_day(),
            status = %status,
            "event in progress"
        );
        status
    }
}

/// Status shown while an event of `kind` is in progress.
fn status_for_kind(kind: &EventKind) -> Status {
    match kind {
        EventKind::OutOfOffice => Status::OutOfOffice,
        EventKind::FocusTime => Status::FocusTime,
        EventKind::Default | EventKind::WorkingLocation | EventKind::Other(_) => Status::InMeeting,
    }
}

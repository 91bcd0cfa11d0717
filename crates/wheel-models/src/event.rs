//! Calendar event types consumed by the status resolver.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Label of the working-location event that means "at the office".
pub const OFFICE_LABEL: &str = "Office";

/// The kind of a calendar event.
///
/// The set of kinds reported by calendar services is open; anything not
/// recognised is kept verbatim in [`EventKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A regular event.
    Default,
    /// An out-of-office block.
    OutOfOffice,
    /// A focus-time block.
    FocusTime,
    /// A working-location marker (office, home, ...).
    WorkingLocation,
    /// Any kind this crate does not know about.
    Other(String),
}

impl EventKind {
    /// Parses a kind from its wire name.
    pub fn parse(name: &str) -> Self {
        match name {
            "default" => EventKind::Default,
            "outOfOffice" => EventKind::OutOfOffice,
            "focusTime" => EventKind::FocusTime,
            "workingLocation" => EventKind::WorkingLocation,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Returns the wire name.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Default => "default",
            EventKind::OutOfOffice => "outOfOffice",
            EventKind::FocusTime => "focusTime",
            EventKind::WorkingLocation => "workingLocation",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        EventKind::parse(&name)
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        EventKind::parse(name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When an event starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStart {
    /// A precise instant.
    DateTime(DateTime<Utc>),
    /// An all-day event's date.
    Date(NaiveDate),
}

impl EventStart {
    /// Returns the start instant. All-day events start at midnight UTC.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            EventStart::DateTime(at) => *at,
            EventStart::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Returns true for all-day events.
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventStart::Date(_))
    }
}

/// The next upcoming event on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Start of the event.
    pub start: EventStart,
    /// Display label (summary), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CalendarEvent {
    /// Creates an event without a label.
    pub fn new(kind: impl Into<EventKind>, start: EventStart) -> Self {
        Self {
            kind: kind.into(),
            start,
            label: None,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the start instant.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.start.instant()
    }

    /// True for a working-location event labelled exactly "Office".
    pub fn is_office_location(&self) -> bool {
        self.kind == EventKind::WorkingLocation && self.label.as_deref() == Some(OFFICE_LABEL)
    }
}

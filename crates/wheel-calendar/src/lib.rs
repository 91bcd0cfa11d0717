//! Calendar access for the status wheel.
//!
//! - `CalendarSource` - the port the runtime polls for the next event
//! - `GoogleCalendar` - a `CalendarSource` backed by the Google Calendar v3 REST API
//! - `FileTokenProvider` - OAuth access tokens from a client secret and a cached token file

pub mod auth;
pub mod error;
pub mod google;
pub mod source;

pub use auth::{AccessTokenProvider, ClientSecret, FileTokenProvider, Token, CALENDAR_READONLY_SCOPE};
pub use error::{CalendarError, Result};
pub use google::{GoogleCalendar, DEFAULT_CALENDAR_ID};
pub use source::CalendarSource;

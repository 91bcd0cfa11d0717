//! Google Calendar v3 client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, trace};

use wheel_models::{CalendarEvent, EventKind, EventStart};

use crate::auth::AccessTokenProvider;
use crate::error::{CalendarError, Result};
use crate::source::CalendarSource;

/// Calendar API root.
const GOOGLE_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";

/// The signed-in user's main calendar.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Event kinds requested from the API.
const EVENT_TYPES: [&str; 4] = ["default", "focusTime", "outOfOffice", "workingLocation"];

/// Reads the next event from a Google calendar.
#[derive(Clone)]
pub struct GoogleCalendar {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    calendar_id: String,
    base_url: String,
}

impl GoogleCalendar {
    /// Creates a client for the primary calendar.
    pub fn new(tokens: Arc<dyn AccessTokenProvider>, client: reqwest::Client) -> Self {
        Self {
            client,
            tokens,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            base_url: GOOGLE_CALENDAR_API_URL.to_string(),
        }
    }

    /// Reads a different calendar.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Returns the calendar being read.
    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    fn events_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendar {
    async fn next_event(&self, now: DateTime<Utc>) -> Result<Option<CalendarEvent>> {
        let access_token = self.tokens.access_token().await?;
        let time_min = now.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut query: Vec<(&str, &str)> = vec![
            ("timeMin", time_min.as_str()),
            ("maxResults", "1"),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
            ("showDeleted", "false"),
        ];
        query.extend(EVENT_TYPES.iter().map(|kind| ("eventTypes", *kind)));

        trace!(calendar = %self.calendar_id, time_min = %time_min, "listing next event");

        let response = self
            .client
            .get(self.events_url()?)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Api { status, body });
        }

        let list: EventList = response.json().await?;
        match list.items.into_iter().next() {
            Some(item) => {
                let event = item.into_event()?;
                debug!(kind = %event.kind, starts_at = %event.starts_at(), "next event");
                Ok(Some(event))
            }
            None => {
                debug!("no upcoming events found");
                Ok(None)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl EventItem {
    fn into_event(self) -> Result<CalendarEvent> {
        let start = match self.start {
            Some(EventTime {
                date_time: Some(at),
                ..
            }) => EventStart::DateTime(at.with_timezone(&Utc)),
            Some(EventTime {
                date: Some(date), ..
            }) => EventStart::Date(date),
            _ => {
                return Err(CalendarError::MalformedEvent(format!(
                    "event {} has no start",
                    self.id.as_deref().unwrap_or("<unknown>")
                )))
            }
        };
        // The API omits eventType for regular events.
        let kind = self
            .event_type
            .as_deref()
            .map_or(EventKind::Default, EventKind::parse);

        Ok(CalendarEvent {
            kind,
            start,
            label: self.summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedToken;

    #[async_trait]
    impl AccessTokenProvider for FixedToken {
        async fn access_token(&self) -> Result<String> {
            Ok("token".to_string())
        }
    }

    fn parse(json: &str) -> Result<Option<CalendarEvent>> {
        let list: EventList = serde_json::from_str(json).unwrap();
        list.items.into_iter().next().map(EventItem::into_event).transpose()
    }

    #[test]
    fn test_parse_timed_event() {
        let event = parse(
            r#"{"items": [{
                "id": "e1",
                "eventType": "focusTime",
                "summary": "Deep work",
                "start": {"dateTime": "2024-03-01T10:30:00+01:00"}
            }]}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(event.kind, EventKind::FocusTime);
        assert_eq!(event.label.as_deref(), Some("Deep work"));
        assert_eq!(
            event.starts_at(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_all_day_event() {
        let event = parse(
            r#"{"items": [{
                "eventType": "workingLocation",
                "summary": "Home",
                "start": {"date": "2024-03-01"}
            }]}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(event.kind, EventKind::WorkingLocation);
        assert_eq!(
            event.start,
            EventStart::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_parse_missing_event_type_is_default() {
        let event = parse(r#"{"items": [{"start": {"dateTime": "2024-03-01T10:00:00Z"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind, EventKind::Default);
        assert_eq!(event.label, None);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse(r#"{"items": []}"#).unwrap().is_none());
        assert!(parse(r#"{}"#).unwrap().is_none());
    }

    #[test]
    fn test_parse_event_without_start() {
        let result = parse(r#"{"items": [{"id": "x", "eventType": "default"}]}"#);
        assert!(matches!(result, Err(CalendarError::MalformedEvent(_))));
    }

    #[test]
    fn test_events_url() {
        let calendar = GoogleCalendar {
            base_url: "https://calendar.example.com/v3/".to_string(),
            ..GoogleCalendar::new(Arc::new(FixedToken), reqwest::Client::new())
                .with_calendar_id("team@example.com")
        };

        let url = calendar.events_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://calendar.example.com/v3/calendars/team@example.com/events"
        );
    }

    #[test]
    fn test_default_calendar() {
        let calendar = GoogleCalendar::new(Arc::new(FixedToken), reqwest::Client::new());
        assert_eq!(calendar.calendar_id(), DEFAULT_CALENDAR_ID);
        assert!(calendar
            .events_url()
            .unwrap()
            .as_str()
            .ends_with("/calendar/v3/calendars/primary/events"));
    }
}

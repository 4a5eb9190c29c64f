//! Google Calendar v3 REST client and the error taxonomy the sync
//! branches on.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Google Calendar v3 API root.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Error surface of the calendar API, split along the lines the
/// reconciler needs to tell apart.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// The caller-supplied event id is already taken (HTTP 409).
    #[error("event id already exists")]
    Conflict,

    /// The service account may not read the event (HTTP 403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Any other non-success response.
    #[error("calendar api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Connection-level or decode failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Lifecycle status of a calendar event. Deleting an event through the
/// UI does not remove it, it flips the status to `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// Start or end of an event: a wall-clock timestamp plus the IANA zone
/// it is rendered in.
#[derive(Debug, Clone, Serialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

/// Event body sent on insert and update.
#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub id: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

/// Event as read back from the API. Cancelled events come back as a
/// stub with little more than an id and a status, so every field is
/// optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub status: Option<EventStatus>,
}

impl Event {
    pub fn is_cancelled(&self) -> bool {
        self.status == Some(EventStatus::Cancelled)
    }
}

/// The three event operations the sync needs, keyed by caller-supplied
/// event id. Implemented by the REST client and by test doubles.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventPayload,
    ) -> Result<Event, CalendarError>;

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Event, CalendarError>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventPayload,
    ) -> Result<Event, CalendarError>;
}

/// REST client bound to one access token.
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(access_token: String, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            access_token,
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    async fn parse_event_response(res: reqwest::Response) -> Result<Event, CalendarError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res.json().await?);
        }

        let body = res.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventPayload,
    ) -> Result<Event, CalendarError> {
        let res = self
            .http
            .post(self.events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await?;

        Self::parse_event_response(res).await
    }

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Event, CalendarError> {
        let res = self
            .http
            .get(self.event_url(calendar_id, event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::parse_event_response(res).await
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventPayload,
    ) -> Result<Event, CalendarError> {
        let res = self
            .http
            .put(self.event_url(calendar_id, event_id))
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await?;

        Self::parse_event_response(res).await
    }
}

/// Sort a non-success response into the error taxonomy, pulling the
/// human-readable message out of the Google error envelope when there
/// is one.
fn error_for_status(status: StatusCode, body: &str) -> CalendarError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::CONFLICT => CalendarError::Conflict,
        StatusCode::FORBIDDEN => CalendarError::Forbidden(message),
        _ => CalendarError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALENDAR_ID: &str = "someone@example.com";

    fn sample_payload() -> EventPayload {
        EventPayload {
            id: "cf2050v3".to_string(),
            summary: "CF: Div 2 Round".to_string(),
            description: Some("Link: https://codeforces.com/contest/2050".to_string()),
            start: EventDateTime {
                date_time: "2026-05-29T01:56:40+05:30".to_string(),
                time_zone: "Asia/Kolkata".to_string(),
            },
            end: EventDateTime {
                date_time: "2026-05-29T03:56:40+05:30".to_string(),
                time_zone: "Asia/Kolkata".to_string(),
            },
            status: None,
        }
    }

    #[tokio::test]
    async fn insert_posts_to_the_events_collection() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/calendars/someone%40example.com/events")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"id": "cf2050v3", "summary": "CF: Div 2 Round"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "cf2050v3", "summary": "CF: Div 2 Round", "status": "confirmed"}"#,
            )
            .create();

        let client = GoogleCalendarClient::with_base_url("token".to_string(), server.url());
        let event = client
            .insert_event(CALENDAR_ID, &sample_payload())
            .await
            .unwrap();

        assert_eq!(event.status, Some(EventStatus::Confirmed));
        mock.assert();
    }

    #[tokio::test]
    async fn conflicting_insert_maps_to_conflict() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/calendars/someone%40example.com/events")
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error": {"code": 409, "message": "The requested identifier already exists."}}"#,
            )
            .create();

        let client = GoogleCalendarClient::with_base_url("token".to_string(), server.url());
        let err = client
            .insert_event(CALENDAR_ID, &sample_payload())
            .await
            .unwrap_err();

        assert!(matches!(err, CalendarError::Conflict));
    }

    #[tokio::test]
    async fn forbidden_get_keeps_the_api_message() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/calendars/someone%40example.com/events/cf2050v3")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"error": {"code": 403, "message": "You need to have reader access to this calendar."}}"#,
            )
            .create();

        let client = GoogleCalendarClient::with_base_url("token".to_string(), server.url());
        let err = client.get_event(CALENDAR_ID, "cf2050v3").await.unwrap_err();

        match err {
            CalendarError::Forbidden(message) => assert!(message.contains("reader access")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cancelled_event_comes_back_as_a_stub() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/calendars/someone%40example.com/events/cf2050v3")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind": "calendar#event", "id": "cf2050v3", "status": "cancelled"}"#)
            .create();

        let client = GoogleCalendarClient::with_base_url("token".to_string(), server.url());
        let event = client.get_event(CALENDAR_ID, "cf2050v3").await.unwrap();

        assert!(event.is_cancelled());
        assert!(event.summary.is_none());
    }

    #[tokio::test]
    async fn update_puts_to_the_event_path() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("PUT", "/calendars/someone%40example.com/events/cf2050v3")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"status": "confirmed"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "cf2050v3", "summary": "CF: Div 2 Round", "status": "confirmed"}"#,
            )
            .create();

        let mut payload = sample_payload();
        payload.status = Some(EventStatus::Confirmed);

        let client = GoogleCalendarClient::with_base_url("token".to_string(), server.url());
        let event = client
            .update_event(CALENDAR_ID, "cf2050v3", &payload)
            .await
            .unwrap();

        assert_eq!(event.status, Some(EventStatus::Confirmed));
        mock.assert();
    }

    #[tokio::test]
    async fn unexpected_error_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/calendars/someone%40example.com/events/cf2050v3")
            .with_status(500)
            .with_body("Internal Server Error")
            .create();

        let client = GoogleCalendarClient::with_base_url("token".to_string(), server.url());
        let err = client.get_event(CALENDAR_ID, "cf2050v3").await.unwrap_err();

        match err {
            CalendarError::Api { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("Internal Server Error"));
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }
}

//! Google Calendar implementation of the calendar gateway.
//!
//! Talks to the Calendar v3 REST API directly; the engine only needs
//! event insert and patch. The stored refresh token is exchanged for an
//! access token once, when the gateway is built.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use taskcal_core::gateway::{CalendarGateway, EventPatch, GatewayError};

use crate::config::GoogleConfig;
use crate::http::{check_status, transport_error};

const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const TIMEZONE: &str = "UTC";

pub struct GoogleCalendar {
    http: reqwest::Client,
    calendar_id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: &'static str,
}

/// Event body for both insert and patch; omitted fields are left
/// unchanged by the API.
#[derive(Serialize)]
struct EventBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<EventDateTime>,
    #[serde(rename = "colorId", skip_serializing_if = "Option::is_none")]
    color_id: Option<String>,
    #[serde(rename = "extendedProperties", skip_serializing_if = "Option::is_none")]
    extended_properties: Option<ExtendedProperties>,
}

#[derive(Serialize)]
struct ExtendedProperties {
    private: PrivateProperties,
}

/// Back-reference to the originating record, stored on the event.
#[derive(Serialize)]
struct PrivateProperties {
    #[serde(rename = "recordId")]
    record_id: String,
}

#[derive(Deserialize)]
struct CreatedEvent {
    id: String,
}

impl GoogleCalendar {
    /// Exchange the stored refresh token for an access token and build
    /// the gateway.
    pub async fn connect(cfg: &GoogleConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::new();
        let params = [
            ("client_id", cfg.client_id.as_str()),
            ("client_secret", cfg.client_secret.as_str()),
            ("refresh_token", cfg.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = http
            .post(OAUTH_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let token: TokenResponse = response.json().await.map_err(transport_error)?;

        Ok(GoogleCalendar {
            http,
            calendar_id: cfg.calendar_id.clone(),
            access_token: token.access_token,
        })
    }

    fn events_url(&self) -> String {
        format!("{CALENDAR_API}/calendars/{}/events", self.calendar_id)
    }

    fn event_time(t: NaiveDateTime) -> EventDateTime {
        EventDateTime {
            date_time: t.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: TIMEZONE,
        }
    }

    fn hours(duration: f64) -> Duration {
        Duration::minutes((duration * 60.0).round() as i64)
    }
}

#[async_trait]
impl CalendarGateway for GoogleCalendar {
    async fn create_event(
        &self,
        title: &str,
        start: NaiveDateTime,
        duration_hours: f64,
        external_ref: &str,
    ) -> Result<String, GatewayError> {
        let body = EventBody {
            summary: Some(title.to_string()),
            start: Some(Self::event_time(start)),
            end: Some(Self::event_time(start + Self::hours(duration_hours))),
            color_id: None,
            extended_properties: Some(ExtendedProperties {
                private: PrivateProperties {
                    record_id: external_ref.to_string(),
                },
            }),
        };

        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        let created: CreatedEvent = response.json().await.map_err(transport_error)?;
        Ok(created.id)
    }

    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> Result<(), GatewayError> {
        // An end time can only be derived when both start and duration
        // are present; the engine always sends them together.
        let end = match (patch.start, patch.duration_hours) {
            (Some(start), Some(duration)) => Some(Self::event_time(start + Self::hours(duration))),
            _ => None,
        };
        let body = EventBody {
            summary: patch.title.clone(),
            start: patch.start.map(Self::event_time),
            end,
            color_id: patch.color_id.clone(),
            extended_properties: None,
        };

        let response = self
            .http
            .patch(format!("{}/{event_id}", self.events_url()))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

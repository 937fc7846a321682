//! Google Calendar v3 REST client.
//!
//! Authentication consumes the token cache provisioned by the provider's
//! own OAuth tooling. The client never runs an interactive consent flow,
//! it only refreshes an expired access token in place.

use crate::backend::CalendarBackend;
use crate::error::{ClinicError, Result};
use crate::types::{CalendarInfo, EventDraft};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const EVENT_TIME_ZONE: &str = "Africa/Johannesburg";

// Refresh slightly early so a token does not expire mid-command.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

pub struct GoogleCalendar {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendar {
    /// Connects using the token cache at `token_path`, refreshing the
    /// access token first if it has expired.
    pub async fn connect(token_path: &Path) -> Result<Self> {
        let client = Client::builder().build().map_err(|error| {
            ClinicError::Remote(format!("failed to build HTTP client: {error}"))
        })?;
        let access_token = load_access_token(&client, token_path).await?;
        info!("Connected to Google Calendar");
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendar {
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        debug!("Fetching calendar list");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|error| {
                ClinicError::Remote(format!("calendar list request failed: {error}"))
            })?;
        let response = check_status("calendar list", response).await?;
        let listing: CalendarListResponse = response.json().await.map_err(|error| {
            ClinicError::Remote(format!("calendar list response unreadable: {error}"))
        })?;
        Ok(listing
            .items
            .into_iter()
            .map(|entry| CalendarInfo {
                id: entry.id,
                summary: entry.summary,
                primary: entry.primary,
            })
            .collect())
    }

    async fn create_event(&self, calendar_id: &str, draft: &EventDraft) -> Result<String> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);
        let body = EventBody::from_draft(draft);
        debug!("Creating event '{}' in calendar {}", draft.summary, calendar_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[("sendUpdates", "all")])
            .json(&body)
            .send()
            .await
            .map_err(|error| {
                ClinicError::Remote(format!("event creation request failed: {error}"))
            })?;
        let response = check_status("event creation", response).await?;
        let created: CreatedEvent = response.json().await.map_err(|error| {
            ClinicError::Remote(format!("event creation response unreadable: {error}"))
        })?;
        info!("Created event {}", created.id);
        Ok(created.id)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.base_url, calendar_id, event_id
        );
        debug!("Deleting event {} from calendar {}", event_id, calendar_id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|error| {
                ClinicError::Remote(format!("event deletion request failed: {error}"))
            })?;
        check_status("event deletion", response).await?;
        info!("Deleted event {}", event_id);
        Ok(())
    }
}

async fn check_status(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("Google Calendar {operation} failed: {status} - {body}");
    Err(ClinicError::Remote(format!(
        "{operation} failed: {status} - {body}"
    )))
}

/// Token cache layout shared with the provider's OAuth tooling.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECONDS),
            None => false,
        }
    }
}

async fn load_access_token(client: &Client, path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).map_err(|_| {
        ClinicError::Remote(format!(
            "credential cache {} not found, provision it with the provider's OAuth tooling",
            path.display()
        ))
    })?;
    let mut token: StoredToken = serde_json::from_str(&raw).map_err(|error| {
        ClinicError::Remote(format!(
            "credential cache {} is unreadable: {error}",
            path.display()
        ))
    })?;

    if !token.is_expired() {
        return Ok(token.access_token);
    }

    debug!("Access token expired, refreshing");
    let refreshed = refresh_access_token(client, &token).await?;
    token.access_token = refreshed.access_token;
    token.expiry = refreshed
        .expires_in
        .map(|seconds| Utc::now() + Duration::seconds(seconds));
    match serde_json::to_string_pretty(&token) {
        Ok(serialized) => {
            if let Err(error) = fs::write(path, serialized) {
                warn!("Could not rewrite credential cache {}: {error}", path.display());
            }
        }
        Err(error) => warn!("Could not serialize refreshed token: {error}"),
    }
    info!("Refreshed access token");
    Ok(token.access_token)
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

async fn refresh_access_token(client: &Client, token: &StoredToken) -> Result<RefreshResponse> {
    let (refresh_token, client_id, client_secret) = match (
        token.refresh_token.as_deref(),
        token.client_id.as_deref(),
        token.client_secret.as_deref(),
    ) {
        (Some(refresh_token), Some(client_id), Some(client_secret)) => {
            (refresh_token, client_id, client_secret)
        }
        _ => {
            return Err(ClinicError::Remote(
                "access token expired and the cache holds no refresh material, \
                 re-run the provider's OAuth tooling"
                    .to_string(),
            ))
        }
    };
    let token_uri = token.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI);
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    let response = client
        .post(token_uri)
        .form(&params)
        .send()
        .await
        .map_err(|error| ClinicError::Remote(format!("token refresh request failed: {error}")))?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("Token refresh failed: {status} - {body}");
        return Err(ClinicError::Remote(format!(
            "token refresh failed: {status} - {body}"
        )));
    }
    response
        .json()
        .await
        .map_err(|error| ClinicError::Remote(format!("token refresh response unreadable: {error}")))
}

/// Request and response shapes of the calendar API
#[derive(Debug, Serialize)]
struct EventBody {
    summary: String,
    description: String,
    start: EventTime,
    end: EventTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attendees: Vec<Attendee>,
    reminders: EventReminders,
}

#[derive(Debug, Serialize)]
struct EventTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

#[derive(Debug, Serialize)]
struct Attendee {
    email: String,
}

#[derive(Debug, Serialize)]
struct EventReminders {
    #[serde(rename = "useDefault")]
    use_default: bool,
    overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Serialize)]
struct ReminderOverride {
    method: String,
    minutes: u32,
}

impl EventBody {
    fn from_draft(draft: &EventDraft) -> Self {
        Self {
            summary: draft.summary.clone(),
            description: draft.description.clone(),
            start: EventTime::at(draft.start),
            end: EventTime::at(draft.end),
            attendees: draft
                .attendees
                .iter()
                .map(|email| Attendee {
                    email: email.clone(),
                })
                .collect(),
            reminders: EventReminders {
                use_default: false,
                overrides: vec![
                    ReminderOverride {
                        method: "email".to_string(),
                        minutes: 60,
                    },
                    ReminderOverride {
                        method: "popup".to_string(),
                        minutes: 30,
                    },
                ],
            },
        }
    }
}

impl EventTime {
    fn at(when: NaiveDateTime) -> Self {
        Self {
            date_time: when.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: EVENT_TIME_ZONE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

#[derive(Debug, Deserialize)]
struct CalendarListEntry {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    primary: bool,
}

//! Typed readers for the payloads of the calls this crate makes.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use super::envelope::XmlElement;
use super::errors::ProviderError;

fn required(body: &XmlElement, name: &str) -> Result<String, ProviderError> {
    body.child_text(name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::MalformedEnvelope(format!("{} missing from response", name)))
}

/// Payload of `createUser`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedUser {
    pub user_id: String,
}

impl CreatedUser {
    pub fn from_body(body: &XmlElement) -> Result<Self, ProviderError> {
        Ok(Self {
            user_id: required(body, "use:userId")?,
        })
    }
}

/// Payload of `getUser`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
}

impl UserInfo {
    pub fn from_body(body: &XmlElement) -> Result<Self, ProviderError> {
        Ok(Self {
            user_id: required(body, "use:userId")?,
            email: required(body, "use:email")?,
        })
    }
}

/// Session keys of every session open right now, across all services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenSessions {
    pub session_keys: Vec<String>,
    /// Sessions listed without a key.
    pub unkeyed: usize,
}

impl OpenSessions {
    pub fn from_body(body: &XmlElement) -> Self {
        let mut sessions = Self::default();
        for session in body
            .children_named("ep:services")
            .flat_map(|service| service.children_named("ep:sessions"))
        {
            match session.child_text("ep:sessionKey").filter(|k| !k.is_empty()) {
                Some(key) => sessions.session_keys.push(key.to_string()),
                None => sessions.unkeyed += 1,
            }
        }
        sessions
    }
}

/// Why a listed recording could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("recording has no session key")]
    MissingSessionKey,
    #[error("recording has no {0}")]
    MissingField(&'static str),
    #[error("recording {field} has unreadable value {value:?}")]
    BadValue { field: &'static str, value: String },
}

/// One `ep:recording` from a recording listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    pub session_key: String,
    pub recording_id: String,
    pub host_id: String,
    pub name: String,
    /// `None` when the listing had no readable `createTime`.
    pub created_at: Option<DateTime<Utc>>,
    pub stream_url: String,
    pub file_url: String,
    pub size_bytes: i64,
    pub duration: i64,
}

impl RecordingEntry {
    pub fn from_element(el: &XmlElement) -> Result<Self, EntryError> {
        let text = |name: &str| el.child_text(name).unwrap_or_default().to_string();

        let session_key = el
            .child_text("ep:sessionKey")
            .filter(|k| !k.is_empty())
            .ok_or(EntryError::MissingSessionKey)?
            .to_string();

        let recording_id = el
            .child_text("ep:recordingID")
            .filter(|id| !id.is_empty())
            .ok_or(EntryError::MissingField("recordingID"))?
            .to_string();

        let created_at = el.child_text("ep:createTime").and_then(parse_create_time);

        let size = el.child_text("ep:size").unwrap_or_default();
        let size_bytes = megabytes_to_bytes(size).ok_or_else(|| EntryError::BadValue {
            field: "size",
            value: size.to_string(),
        })?;

        let duration = el.child_text("ep:duration").unwrap_or_default();
        let duration = if duration.is_empty() {
            0
        } else {
            duration.parse().map_err(|_| EntryError::BadValue {
                field: "duration",
                value: duration.to_string(),
            })?
        };

        Ok(Self {
            session_key,
            recording_id,
            host_id: text("ep:hostWebExID"),
            name: text("ep:name"),
            created_at,
            stream_url: text("ep:streamURL"),
            file_url: text("ep:fileURL"),
            size_bytes,
            duration,
        })
    }
}

/// Every `ep:recording` of a listing, each read independently.
pub fn recording_entries(body: &XmlElement) -> Vec<Result<RecordingEntry, EntryError>> {
    body.children_named("ep:recording")
        .map(RecordingEntry::from_element)
        .collect()
}

/// Payload of `getRecordingInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingDetail {
    pub recording_id: String,
    pub name: String,
    pub stream_url: String,
    pub file_url: String,
    pub size_bytes: i64,
    pub duration: i64,
}

impl RecordingDetail {
    pub fn from_body(body: &XmlElement) -> Result<Self, ProviderError> {
        let el = body.child("ep:recording").unwrap_or(body);
        let text = |name: &str| el.child_text(name).unwrap_or_default().to_string();

        let size = el.child_text("ep:size").unwrap_or_default();
        let size_bytes = megabytes_to_bytes(size).ok_or_else(|| {
            ProviderError::MalformedEnvelope(format!("unreadable recording size {:?}", size))
        })?;

        Ok(Self {
            recording_id: required(el, "ep:recordingID")?,
            name: text("ep:name"),
            stream_url: text("ep:streamURL"),
            file_url: text("ep:fileURL"),
            size_bytes,
            duration: el
                .child_text("ep:duration")
                .and_then(|d| d.parse().ok())
                .unwrap_or(0),
        })
    }
}

/// WebEx reports sizes in megabytes as a decimal string.
pub fn megabytes_to_bytes(megabytes: &str) -> Option<i64> {
    let megabytes = megabytes.trim();
    if megabytes.is_empty() {
        return Some(0);
    }
    let value: f64 = megabytes.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * 1024.0 * 1024.0).round() as i64)
}

/// Parse `MM/DD/YYYY HH:MM:SS` (site time, taken as UTC) or RFC 3339.
pub fn parse_create_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%m/%d/%Y %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

//! Recording metadata from the site, merged into the local store.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{Meeting, MeetingRepository, NewRecording, RecordingRepository};
use crate::events::{EventSink, RecordingCreated};
use crate::webex::request;
use crate::webex::responses::{recording_entries, RecordingDetail, RecordingEntry};
use crate::webex::{CallOutcome, Gateway, ProviderError, XmlElement};

/// How far back a full listing looks for recordings.
pub const LOOKBACK_DAYS: i64 = 365;
/// How far ahead of now a full listing reaches, for sites ahead of UTC.
pub const LOOKAHEAD_HOURS: i64 = 12;

/// What one listing did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub struct RecordingSynchronizer<'a> {
    gateway: &'a Gateway,
    events: &'a dyn EventSink,
    manage_all: bool,
}

impl<'a> RecordingSynchronizer<'a> {
    /// With `manage_all`, recordings of sessions that match no local meeting
    /// are stored too.
    pub fn new(gateway: &'a Gateway, events: &'a dyn EventSink, manage_all: bool) -> Self {
        Self {
            gateway,
            events,
            manage_all,
        }
    }

    pub async fn update_recordings(&self, conn: &Connection) -> Result<SyncReport, ProviderError> {
        self.update_recordings_at(conn, Utc::now()).await
    }

    /// List every recording created in the last year and store it.
    pub async fn update_recordings_at(
        &self,
        conn: &Connection,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, ProviderError> {
        let start = now - Duration::days(LOOKBACK_DAYS);
        let end = now + Duration::hours(LOOKAHEAD_HOURS);
        let body = request::list_recordings(start, end);
        self.sync_listing(conn, &body, now).await
    }

    /// List the recordings of one session and store them.
    pub async fn update_meeting_recordings(
        &self,
        conn: &Connection,
        meeting_key: &str,
    ) -> Result<SyncReport, ProviderError> {
        let body = request::list_meeting_recordings(meeting_key);
        self.sync_listing(conn, &body, Utc::now()).await
    }

    pub async fn fetch_recording_detail(
        &self,
        conn: &Connection,
        recording_id: &str,
    ) -> Result<Option<RecordingDetail>, ProviderError> {
        let body = request::get_recording_detail(recording_id);
        match self.gateway.get_response(conn, &body, None, false).await {
            CallOutcome::Payload(payload) => RecordingDetail::from_body(&payload).map(Some),
            CallOutcome::Empty => Ok(None),
            CallOutcome::Failed(failure) => Err(failure.error),
        }
    }

    async fn sync_listing(
        &self,
        conn: &Connection,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<SyncReport, ProviderError> {
        match self.gateway.get_response(conn, body, None, false).await {
            CallOutcome::Payload(payload) => {
                Ok(self.process_recording_response(conn, &payload, now).await)
            }
            CallOutcome::Empty => Ok(SyncReport::default()),
            CallOutcome::Failed(failure) => Err(failure.error),
        }
    }

    /// Store every usable recording in a listing payload.
    ///
    /// Entries are handled independently; one that cannot be read or stored
    /// is counted as skipped.
    pub async fn process_recording_response(
        &self,
        conn: &Connection,
        payload: &XmlElement,
        now: DateTime<Utc>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        for entry in recording_entries(payload) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping recording: {}", e);
                    report.skipped += 1;
                    continue;
                }
            };

            match self.store_entry(conn, &entry, now).await {
                Ok(Stored::Created) => report.created += 1,
                Ok(Stored::Updated) => report.updated += 1,
                Ok(Stored::Ignored) => report.skipped += 1,
                Err(e) => {
                    warn!("Failed to store recording {}: {:#}", entry.recording_id, e);
                    report.skipped += 1;
                }
            }
        }

        if report.created > 0 || report.updated > 0 {
            info!(
                "Recordings: {} created, {} updated, {} skipped",
                report.created, report.updated, report.skipped
            );
        }
        report
    }

    async fn store_entry(
        &self,
        conn: &Connection,
        entry: &RecordingEntry,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Stored> {
        let meeting = MeetingRepository::find_by_key(conn, &entry.session_key)?;
        if meeting.is_none() && !self.manage_all {
            debug!(
                "Ignoring recording {} of unknown session {}",
                entry.recording_id, entry.session_key
            );
            return Ok(Stored::Ignored);
        }

        let now = now.timestamp();

        if let Some(existing) = RecordingRepository::find_by_recording_id(conn, &entry.recording_id)? {
            RecordingRepository::update_metadata(
                conn,
                existing.id,
                &entry.name,
                &entry.stream_url,
                &entry.file_url,
                now,
            )?;
            return Ok(Stored::Updated);
        }

        if entry.created_at.is_none() {
            warn!(
                "Recording {} has no readable creation time, storing it as 0",
                entry.recording_id
            );
        }

        let id = RecordingRepository::insert(conn, &new_recording(entry, meeting.as_ref(), now))?;
        info!("Stored new recording {} ({})", entry.recording_id, entry.name);

        if let Some(meeting) = meeting {
            if let Some(recording) = RecordingRepository::get(conn, id)? {
                let event = RecordingCreated { recording, meeting };
                if let Err(e) = self.events.recording_created(&event).await {
                    warn!("Failed to announce recording {}: {:#}", entry.recording_id, e);
                }
            }
        }

        Ok(Stored::Created)
    }
}

enum Stored {
    Created,
    Updated,
    Ignored,
}

fn new_recording(entry: &RecordingEntry, meeting: Option<&Meeting>, now: i64) -> NewRecording {
    NewRecording {
        meeting_id: meeting.map(|m| m.id),
        meeting_key: entry.session_key.clone(),
        recording_id: entry.recording_id.clone(),
        host_id: entry.host_id.clone(),
        name: entry.name.clone(),
        time_created: entry.created_at.map(|t| t.timestamp()).unwrap_or(0),
        stream_url: entry.stream_url.clone(),
        file_url: entry.file_url.clone(),
        file_size: entry.size_bytes,
        duration: entry.duration,
        time_modified: now,
    }
}

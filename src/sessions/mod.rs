//! Live meeting status from the site's list of open sessions.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{MeetingRepository, MeetingStatus};
use crate::webex::request;
use crate::webex::responses::OpenSessions;
use crate::webex::{CallOutcome, Gateway, ProviderError};

/// Seconds an in-progress meeting may go unconfirmed before it is stopped.
pub const STALE_AFTER_SECS: i64 = 60;

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSweep {
    pub started: usize,
    pub stopped: usize,
}

pub async fn update_open_sessions(
    gateway: &Gateway,
    conn: &Connection,
) -> Result<SessionSweep, ProviderError> {
    update_open_sessions_at(gateway, conn, Utc::now()).await
}

/// Mark meetings that are open on the site as in progress, then stop every
/// in-progress meeting that has not been seen for [`STALE_AFTER_SECS`].
///
/// A failed listing returns the error and leaves every meeting untouched.
pub async fn update_open_sessions_at(
    gateway: &Gateway,
    conn: &Connection,
    now: DateTime<Utc>,
) -> Result<SessionSweep, ProviderError> {
    let now = now.timestamp();
    let mut sweep = SessionSweep::default();

    let body = request::list_open_sessions();
    let sessions = match gateway.get_response(conn, &body, None, false).await {
        CallOutcome::Payload(payload) => OpenSessions::from_body(&payload),
        CallOutcome::Empty => OpenSessions::default(),
        CallOutcome::Failed(failure) => return Err(failure.error),
    };

    if sessions.unkeyed > 0 {
        debug!("Ignoring {} open sessions without a key", sessions.unkeyed);
    }

    for key in &sessions.session_keys {
        let meeting = match MeetingRepository::find_by_key(conn, key) {
            Ok(Some(meeting)) => meeting,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping open session {}: {:#}", key, e);
                continue;
            }
        };

        // Listed meetings are re-stamped even when already in progress, so
        // only those missing from the listing age into the sweep below.
        let already_running = meeting.status == MeetingStatus::InProgress;
        match MeetingRepository::set_status(conn, meeting.id, MeetingStatus::InProgress, now) {
            Ok(()) if already_running => debug!("Meeting {} ({}) still open", meeting.id, key),
            Ok(()) => {
                info!("Meeting {} ({}) is in progress", meeting.id, key);
                sweep.started += 1;
            }
            Err(e) => warn!("Failed to refresh meeting {}: {:#}", meeting.id, e),
        }
    }

    let stale = MeetingRepository::list_stale_in_progress(conn, now - STALE_AFTER_SECS)?;
    for meeting in stale {
        match MeetingRepository::set_status(conn, meeting.id, MeetingStatus::Stopped, now) {
            Ok(()) => {
                info!("Meeting {} ({}) has stopped", meeting.id, meeting.meeting_key);
                sweep.stopped += 1;
            }
            Err(e) => warn!("Failed to stop meeting {}: {:#}", meeting.id, e),
        }
    }

    Ok(sweep)
}

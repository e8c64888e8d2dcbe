use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use super::media::MediaStore;
use crate::db::RecordingRepository;

pub fn remove_deleted_recordings(
    conn: &Connection,
    media: &dyn MediaStore,
    retention_hours: i64,
) -> Result<usize> {
    remove_deleted_recordings_at(conn, media, retention_hours, Utc::now())
}

/// Erase recordings that have been in the trash for longer than
/// `retention_hours`, media first, then the row. Returns how many went.
///
/// Stops at the first failure; recordings already erased stay erased.
pub fn remove_deleted_recordings_at(
    conn: &Connection,
    media: &dyn MediaStore,
    retention_hours: i64,
    now: DateTime<Utc>,
) -> Result<usize> {
    // A retention reaching past the earliest representable time expires nothing.
    let cutoff = Duration::try_hours(retention_hours)
        .and_then(|retention| now.checked_sub_signed(retention))
        .map(|cutoff| cutoff.timestamp())
        .unwrap_or(i64::MIN);

    let removed = RecordingRepository::for_each_expired(conn, cutoff, |recording| {
        media
            .erase(&recording)
            .with_context(|| format!("Failed to erase media for {}", recording.recording_id))?;
        RecordingRepository::delete(conn, recording.id)?;
        debug!("Removed recording {}", recording.recording_id);
        Ok(())
    })?;

    if removed > 0 {
        info!("Removed {} deleted recordings", removed);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{migrate, NewRecording, Recording};
    use crate::recordings::media::LocalMediaStore;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn add(conn: &Connection, recording_id: &str, deleted: Option<i64>) -> i64 {
        let id = RecordingRepository::insert(
            conn,
            &NewRecording {
                meeting_id: None,
                meeting_key: "1".to_string(),
                recording_id: recording_id.to_string(),
                host_id: "h".to_string(),
                name: recording_id.to_string(),
                time_created: 0,
                stream_url: String::new(),
                file_url: String::new(),
                file_size: 0,
                duration: 0,
                time_modified: 0,
            },
        )
        .unwrap();
        if let Some(at) = deleted {
            RecordingRepository::mark_deleted(conn, recording_id, at).unwrap();
        }
        id
    }

    /// Remembers what it was asked to erase, optionally failing on one id.
    #[derive(Default)]
    struct RecordingMedia {
        erased: RefCell<Vec<String>>,
        fail_on: Option<String>,
    }

    impl MediaStore for RecordingMedia {
        fn erase(&self, recording: &Recording) -> Result<()> {
            if self.fail_on.as_deref() == Some(recording.recording_id.as_str()) {
                anyhow::bail!("disk on fire");
            }
            self.erased.borrow_mut().push(recording.recording_id.clone());
            Ok(())
        }
    }

    #[test]
    fn test_only_expired_recordings_removed() {
        let conn = setup_db();
        let t = now().timestamp();
        add(&conn, "live", None);
        add(&conn, "old", Some(t - 25 * 3600));
        add(&conn, "recent", Some(t - 23 * 3600));
        add(&conn, "boundary", Some(t - 24 * 3600));
        let media = RecordingMedia::default();

        let removed = remove_deleted_recordings_at(&conn, &media, 24, now()).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(*media.erased.borrow(), vec!["old".to_string()]);
        assert!(RecordingRepository::find_by_recording_id(&conn, "old").unwrap().is_none());
        assert!(RecordingRepository::find_by_recording_id(&conn, "boundary").unwrap().is_some());
        assert_eq!(RecordingRepository::count(&conn).unwrap(), 3);
    }

    #[test]
    fn test_media_failure_keeps_row_and_stops() {
        let conn = setup_db();
        let t = now().timestamp();
        add(&conn, "a", Some(t - 100 * 3600));
        let media = RecordingMedia {
            fail_on: Some("a".to_string()),
            ..Default::default()
        };

        assert!(remove_deleted_recordings_at(&conn, &media, 24, now()).is_err());
        assert!(RecordingRepository::find_by_recording_id(&conn, "a").unwrap().is_some());
    }

    #[test]
    fn test_removes_local_media() {
        let conn = setup_db();
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("gone"), b"video").unwrap();
        std::fs::write(dir.path().join("kept"), b"video").unwrap();
        let t = now().timestamp();
        add(&conn, "gone", Some(t - 48 * 3600));
        add(&conn, "kept", None);

        let store = LocalMediaStore::new(dir.path());
        let removed = remove_deleted_recordings_at(&conn, &store, 24, now()).unwrap();

        assert_eq!(removed, 1);
        assert!(!dir.path().join("gone").exists());
        assert!(dir.path().join("kept").exists());
    }

    #[test]
    fn test_huge_retention_removes_nothing() {
        let conn = setup_db();
        add(&conn, "ancient", Some(1));
        let media = RecordingMedia::default();

        for hours in [10_000_000_000, i64::MAX] {
            let removed = remove_deleted_recordings_at(&conn, &media, hours, now()).unwrap();
            assert_eq!(removed, 0);
        }
        assert!(media.erased.borrow().is_empty());
        assert!(RecordingRepository::find_by_recording_id(&conn, "ancient").unwrap().is_some());
    }

    #[test]
    fn test_nothing_to_remove() {
        let conn = setup_db();
        let media = RecordingMedia::default();
        assert_eq!(remove_deleted_recordings_at(&conn, &media, 24, now()).unwrap(), 0);
    }
}

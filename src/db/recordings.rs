//! Recording record persistence.
//!
//! Rows are keyed by the remote recording id so repeated syncs upsert
//! instead of duplicating.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schemas::Recording;

const RECORDING_COLUMNS: &str = "id, meeting_id, meeting_key, recording_id, host_id, name, \
     time_created, stream_url, file_url, file_size, duration, time_modified, deleted";

/// Field values for a recording that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecording {
    pub meeting_id: Option<i64>,
    pub meeting_key: String,
    pub recording_id: String,
    pub host_id: String,
    pub name: String,
    pub time_created: i64,
    pub stream_url: String,
    pub file_url: String,
    pub file_size: i64,
    pub duration: i64,
    pub time_modified: i64,
}

fn recording_from_row(row: &Row<'_>) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        meeting_key: row.get(2)?,
        recording_id: row.get(3)?,
        host_id: row.get(4)?,
        name: row.get(5)?,
        time_created: row.get(6)?,
        stream_url: row.get(7)?,
        file_url: row.get(8)?,
        file_size: row.get(9)?,
        duration: row.get(10)?,
        time_modified: row.get(11)?,
        deleted: row.get(12)?,
    })
}

/// Repository for recording records.
pub struct RecordingRepository;

impl RecordingRepository {
    pub fn insert(conn: &Connection, recording: &NewRecording) -> Result<i64> {
        conn.execute(
            "INSERT INTO recordings (meeting_id, meeting_key, recording_id, host_id, name, \
             time_created, stream_url, file_url, file_size, duration, time_modified) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                recording.meeting_id,
                recording.meeting_key,
                recording.recording_id,
                recording.host_id,
                recording.name,
                recording.time_created,
                recording.stream_url,
                recording.file_url,
                recording.file_size,
                recording.duration,
                recording.time_modified,
            ],
        )
        .context("Failed to insert recording")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Recording>> {
        conn.query_row(
            &format!("SELECT {} FROM recordings WHERE id = ?1", RECORDING_COLUMNS),
            params![id],
            recording_from_row,
        )
        .optional()
        .context("Failed to query recording")
    }

    pub fn find_by_recording_id(conn: &Connection, recording_id: &str) -> Result<Option<Recording>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM recordings WHERE recording_id = ?1",
                RECORDING_COLUMNS
            ),
            params![recording_id],
            recording_from_row,
        )
        .optional()
        .context("Failed to query recording by remote id")
    }

    /// Refresh the fields WebEx lets users change after a recording exists.
    pub fn update_metadata(
        conn: &Connection,
        id: i64,
        name: &str,
        stream_url: &str,
        file_url: &str,
        time_modified: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE recordings SET name = ?1, stream_url = ?2, file_url = ?3, time_modified = ?4 \
             WHERE id = ?5",
            params![name, stream_url, file_url, time_modified, id],
        )
        .context("Failed to update recording")?;
        Ok(())
    }

    /// Move a recording to the trash. Returns false if no such recording.
    pub fn mark_deleted(conn: &Connection, recording_id: &str, deleted_at: i64) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE recordings SET deleted = ?1, time_modified = ?1 WHERE recording_id = ?2",
                params![deleted_at, recording_id],
            )
            .context("Failed to mark recording deleted")?;
        Ok(changed > 0)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM recordings WHERE id = ?1", params![id])
            .context("Failed to delete recording")?;
        Ok(())
    }

    pub fn count(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get(0))
            .context("Failed to count recordings")
    }

    /// Walk trashed recordings deleted before `deleted_before`, one row at a time.
    ///
    /// The statement is finalized when this returns, including when `visit`
    /// fails part way through. `visit` may delete the row it was handed.
    pub fn for_each_expired<F>(conn: &Connection, deleted_before: i64, mut visit: F) -> Result<usize>
    where
        F: FnMut(Recording) -> Result<()>,
    {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM recordings WHERE deleted > 0 AND deleted < ?1",
                RECORDING_COLUMNS
            ))
            .context("Failed to prepare expired recordings query")?;

        let mut rows = stmt
            .query(params![deleted_before])
            .context("Failed to query expired recordings")?;

        let mut visited = 0;
        while let Some(row) = rows.next().context("Failed to read expired recording")? {
            let recording = recording_from_row(row).context("Failed to map expired recording")?;
            visit(recording)?;
            visited += 1;
        }

        Ok(visited)
    }
}

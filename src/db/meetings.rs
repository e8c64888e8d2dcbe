//! Meeting record persistence.
//!
//! Raw SQL with rusqlite, no ORM. Status is only ever written through
//! [`MeetingRepository::set_status`], which the session reconciler drives.

use anyhow::{Context, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use super::schemas::{Meeting, MeetingStatus, MeetingType};

const MEETING_COLUMNS: &str = "id, name, meeting_key, meeting_type, status, last_status_check";

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let meeting_type: String = row.get(3)?;
    let status: String = row.get(4)?;

    Ok(Meeting {
        id: row.get(0)?,
        name: row.get(1)?,
        meeting_key: row.get(2)?,
        meeting_type: MeetingType::parse(&meeting_type)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?,
        status: MeetingStatus::parse(&status)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
        last_status_check: row.get(5)?,
    })
}

/// Repository for meeting records.
pub struct MeetingRepository;

impl MeetingRepository {
    /// Insert a meeting that has never been started. Returns the new id.
    pub fn insert(
        conn: &Connection,
        name: &str,
        meeting_key: &str,
        meeting_type: MeetingType,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO meetings (name, meeting_key, meeting_type, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                meeting_key,
                meeting_type.as_str(),
                MeetingStatus::NeverStarted.as_str()
            ],
        )
        .context("Failed to insert meeting")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Meeting>> {
        conn.query_row(
            &format!("SELECT {} FROM meetings WHERE id = ?1", MEETING_COLUMNS),
            params![id],
            meeting_from_row,
        )
        .optional()
        .context("Failed to query meeting")
    }

    /// Look up the meeting a remote session key belongs to.
    pub fn find_by_key(conn: &Connection, meeting_key: &str) -> Result<Option<Meeting>> {
        conn.query_row(
            &format!("SELECT {} FROM meetings WHERE meeting_key = ?1", MEETING_COLUMNS),
            params![meeting_key],
            meeting_from_row,
        )
        .optional()
        .context("Failed to query meeting by key")
    }

    pub fn set_status(
        conn: &Connection,
        id: i64,
        status: MeetingStatus,
        checked_at: i64,
    ) -> Result<()> {
        conn.execute(
            "UPDATE meetings SET status = ?1, last_status_check = ?2 WHERE id = ?3",
            params![status.as_str(), checked_at, id],
        )
        .context("Failed to update meeting status")?;
        Ok(())
    }

    /// In-progress meetings whose status was last confirmed before `checked_before`.
    pub fn list_stale_in_progress(conn: &Connection, checked_before: i64) -> Result<Vec<Meeting>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM meetings WHERE last_status_check < ?1 AND status = ?2 ORDER BY id",
                MEETING_COLUMNS
            ))
            .context("Failed to prepare stale meetings query")?;

        let meetings = stmt
            .query_map(
                params![checked_before, MeetingStatus::InProgress.as_str()],
                meeting_from_row,
            )
            .context("Failed to query stale meetings")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to map stale meetings")?;

        Ok(meetings)
    }
}

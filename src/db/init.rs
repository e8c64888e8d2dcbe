use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn init_db() -> Result<Connection> {
    let db_path = crate::global::db_file()?;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(&db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meetings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL DEFAULT '',
            meeting_key TEXT NOT NULL UNIQUE,
            meeting_type TEXT NOT NULL DEFAULT 'standard',
            status TEXT NOT NULL DEFAULT 'never_started',
            last_status_check INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("Failed to create meetings table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_meetings_status ON meetings(status, last_status_check)",
        [],
    )
    .context("Failed to create meetings status index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS recordings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            meeting_id INTEGER REFERENCES meetings(id),
            meeting_key TEXT NOT NULL,
            recording_id TEXT NOT NULL UNIQUE,
            host_id TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL DEFAULT '',
            time_created INTEGER NOT NULL DEFAULT 0,
            stream_url TEXT NOT NULL DEFAULT '',
            file_url TEXT NOT NULL DEFAULT '',
            file_size INTEGER NOT NULL DEFAULT 0,
            duration INTEGER NOT NULL DEFAULT 0,
            time_modified INTEGER NOT NULL DEFAULT 0,
            deleted INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("Failed to create recordings table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_recordings_deleted ON recordings(deleted)",
        [],
    )
    .context("Failed to create recordings deleted index")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS remote_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            local_user_id INTEGER NOT NULL UNIQUE,
            remote_user_id TEXT NOT NULL,
            login_id TEXT NOT NULL,
            password TEXT NOT NULL DEFAULT ''
        )",
        [],
    )
    .context("Failed to create remote_users table")?;

    Ok(())
}

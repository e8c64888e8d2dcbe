use anyhow::Result;
use rusqlite::Connection;
use tracing::{error, info};

use super::args::RecordingsCliArgs;
use super::{open_remote, open_store};
use crate::config::Config;
use crate::events::sink_from_config;
use crate::global;
use crate::recordings::{remove_deleted_recordings, LocalMediaStore, RecordingSynchronizer};
use crate::sessions::update_open_sessions;
use crate::webex::Gateway;

pub async fn handle_sessions_command() -> Result<()> {
    let (_config, conn, gateway) = open_remote()?;
    let sweep = update_open_sessions(&gateway, &conn).await?;
    println!(
        "Sessions: {} started, {} stopped",
        sweep.started, sweep.stopped
    );
    Ok(())
}

pub async fn handle_recordings_command(args: RecordingsCliArgs) -> Result<()> {
    let (config, conn, gateway) = open_remote()?;
    let sink = sink_from_config(&config.events);
    let sync = RecordingSynchronizer::new(&gateway, sink.as_ref(), config.webex.manage_all_recordings);

    let report = match args.meeting_key.as_deref() {
        Some(key) => sync.update_meeting_recordings(&conn, key).await?,
        None => sync.update_recordings(&conn).await?,
    };

    println!(
        "Recordings: {} created, {} updated, {} skipped",
        report.created, report.updated, report.skipped
    );
    Ok(())
}

pub fn handle_reap_command() -> Result<()> {
    let (config, conn) = open_store()?;
    let removed = reap(&config, &conn)?;
    println!("Removed {} deleted recording(s)", removed);
    Ok(())
}

/// One full pass. Each step runs even if an earlier one failed; the first
/// failure is returned at the end.
pub async fn handle_run_command() -> Result<()> {
    let (config, conn, gateway) = open_remote()?;
    let mut first_error = None;

    info!("Updating open sessions");
    if let Err(e) = update_open_sessions(&gateway, &conn).await {
        error!("Session update failed: {}", e);
        first_error = first_error.or(Some(anyhow::Error::new(e)));
    }

    info!("Updating recordings");
    if let Err(e) = sync_all_recordings(&config, &conn, &gateway).await {
        error!("Recording update failed: {:#}", e);
        first_error = first_error.or(Some(e));
    }

    info!("Removing expired recordings");
    if let Err(e) = reap(&config, &conn) {
        error!("Recording cleanup failed: {:#}", e);
        first_error = first_error.or(Some(e));
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn sync_all_recordings(config: &Config, conn: &Connection, gateway: &Gateway) -> Result<()> {
    let sink = sink_from_config(&config.events);
    RecordingSynchronizer::new(gateway, sink.as_ref(), config.webex.manage_all_recordings)
        .update_recordings(conn)
        .await?;
    Ok(())
}

fn reap(config: &Config, conn: &Connection) -> Result<usize> {
    let media = LocalMediaStore::new(global::recordings_dir()?);
    remove_deleted_recordings(conn, &media, config.webex.recording_trash_hours)
}

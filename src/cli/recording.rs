use anyhow::{anyhow, Result};
use chrono::Utc;

use super::args::RecordingIdArgs;
use super::{open_remote, open_store};
use crate::db::RecordingRepository;
use crate::events::LogEventSink;
use crate::recordings::RecordingSynchronizer;

pub fn handle_delete_recording_command(args: RecordingIdArgs) -> Result<()> {
    let (config, conn) = open_store()?;

    if !RecordingRepository::mark_deleted(&conn, &args.recording_id, Utc::now().timestamp())? {
        return Err(anyhow!("Recording {} not found", args.recording_id));
    }

    println!(
        "Recording {} moved to trash, erased after {} hour(s)",
        args.recording_id, config.webex.recording_trash_hours
    );
    Ok(())
}

pub async fn handle_recording_detail_command(args: RecordingIdArgs) -> Result<()> {
    let (_config, conn, gateway) = open_remote()?;
    // Looking up a recording never creates one, so no events are raised.
    let sync = RecordingSynchronizer::new(&gateway, &LogEventSink, false);

    match sync.fetch_recording_detail(&conn, &args.recording_id).await? {
        Some(detail) => {
            println!("ID:       {}", detail.recording_id);
            println!("Name:     {}", detail.name);
            println!("Stream:   {}", detail.stream_url);
            println!("File:     {}", detail.file_url);
            println!("Size:     {} bytes", detail.size_bytes);
            println!("Duration: {}s", detail.duration);
        }
        None => println!("WebEx has no recording {}", args.recording_id),
    }
    Ok(())
}

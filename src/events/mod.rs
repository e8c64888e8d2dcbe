//! Notifications for the host application.
//!
//! A new recording that belongs to a known meeting is announced through an
//! [`EventSink`]. Without a configured command the event is only logged.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::EventsConfig;
use crate::db::{Meeting, Recording};

/// Environment variable names passed to the event command.
pub mod event_env {
    pub const EVENT: &str = "WEBEXSYNC_EVENT";
    pub const RECORDING_ID: &str = "WEBEXSYNC_RECORDING_ID";
    pub const MEETING_ID: &str = "WEBEXSYNC_MEETING_ID";
    pub const MEETING_KEY: &str = "WEBEXSYNC_MEETING_KEY";
}

/// A recording was stored for the first time.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingCreated {
    pub recording: Recording,
    pub meeting: Meeting,
}

impl RecordingCreated {
    pub const NAME: &'static str = "recording_created";
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn recording_created(&self, event: &RecordingCreated) -> Result<()>;
}

/// Build the sink described by `config`.
pub fn sink_from_config(config: &EventsConfig) -> Box<dyn EventSink> {
    let command = config.post_command.trim();
    if command.is_empty() {
        Box::new(LogEventSink)
    } else {
        Box::new(ShellCommandSink::new(
            command.to_string(),
            config.post_command_timeout_seconds,
        ))
    }
}

pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn recording_created(&self, event: &RecordingCreated) -> Result<()> {
        info!(
            "New recording {} for meeting {} ({})",
            event.recording.recording_id, event.meeting.id, event.meeting.name
        );
        Ok(())
    }
}

/// Runs a shell command per event.
///
/// The event is written to stdin as JSON and its identifiers are set in
/// [`event_env`] variables. A non-zero exit or a timeout is logged, not
/// returned.
pub struct ShellCommandSink {
    command: String,
    timeout: Duration,
}

impl ShellCommandSink {
    pub fn new(command: String, timeout_seconds: u64) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

#[async_trait]
impl EventSink for ShellCommandSink {
    async fn recording_created(&self, event: &RecordingCreated) -> Result<()> {
        let payload = serde_json::to_vec(event).context("Failed to encode recording event")?;

        info!(
            "Running event command for recording {}: {}",
            event.recording.recording_id, self.command
        );

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(event_env::EVENT, RecordingCreated::NAME)
            .env(event_env::RECORDING_ID, &event.recording.recording_id)
            .env(event_env::MEETING_ID, event.meeting.id.to_string())
            .env(event_env::MEETING_KEY, &event.meeting.meeting_key)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start event command: {}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            use tokio::io::AsyncWriteExt;
            // The command may exit without reading its input.
            let _ = stdin.write_all(&payload).await;
        }

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if !stdout.trim().is_empty() {
                    info!("Event command stdout: {}", stdout.trim());
                }
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    "Event command exited with status {}: {}",
                    output.status,
                    stderr.trim()
                );
            }
            Ok(Err(e)) => warn!("Event command failed: {}", e),
            Err(_) => warn!(
                "Event command timed out after {}s, killing it",
                self.timeout.as_secs()
            ),
        }

        Ok(())
    }
}

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::Config;
use crate::db;
use crate::webex::Gateway;

pub mod args;
pub mod provision;
pub mod recording;
pub mod sync;

pub use args::{Cli, CliCommand, ProvisionCliArgs, RecordingIdArgs, RecordingsCliArgs};
pub use provision::handle_provision_command;
pub use recording::{handle_delete_recording_command, handle_recording_detail_command};
pub use sync::{handle_reap_command, handle_recordings_command, handle_run_command, handle_sessions_command};

/// Config and database for a command that stays local.
fn open_store() -> Result<(Config, Connection)> {
    let config = Config::load()?;
    let conn = db::init_db()?;
    Ok((config, conn))
}

/// Config, database and a gateway for a command that talks to the site.
fn open_remote() -> Result<(Config, Connection, Gateway)> {
    let (config, conn) = open_store()?;
    config
        .webex
        .validate()
        .with_context(|| format!("Incomplete config in {:?}", crate::global::config_file().ok()))?;
    let gateway = Gateway::from_config(&config.webex)?;
    Ok((config, conn, gateway))
}

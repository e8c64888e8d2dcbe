use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webex: WebexConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebexConfig {
    /// Site name, as in `https://<site>.webex.com/<site>`.
    pub site: String,
    /// Service account used for every call made without user credentials.
    pub admin_username: String,
    pub admin_password: String,
    /// Overrides the XML service endpoint derived from `site`.
    pub api_url: Option<String>,
    /// Prepended to local usernames to form remote login ids.
    pub prefix: String,
    /// Keep recordings whose session key matches no local meeting.
    pub manage_all_recordings: bool,
    /// Hours a deleted recording stays in the trash before it is erased.
    pub recording_trash_hours: i64,
}

impl Default for WebexConfig {
    fn default() -> Self {
        Self {
            site: String::new(),
            admin_username: String::new(),
            admin_password: String::new(),
            api_url: None,
            prefix: String::new(),
            manage_all_recordings: false,
            recording_trash_hours: 24,
        }
    }
}

impl WebexConfig {
    /// Endpoint of the XML service for the configured site.
    pub fn service_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => format!("https://{}.webex.com/WBXService/XMLService", self.site),
        }
    }

    /// Fail unless enough is configured to talk to the site.
    pub fn validate(&self) -> Result<()> {
        if self.site.trim().is_empty() && self.api_url.is_none() {
            anyhow::bail!("webex.site is not configured");
        }
        if self.admin_username.trim().is_empty() || self.admin_password.is_empty() {
            anyhow::bail!("webex.admin_username and webex.admin_password are required");
        }
        if self.recording_trash_hours < 0 {
            anyhow::bail!("webex.recording_trash_hours must not be negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Shell command run for every new recording tied to a local meeting.
    /// Receives the event as JSON on stdin.
    /// Env vars: WEBEXSYNC_EVENT, WEBEXSYNC_RECORDING_ID,
    /// WEBEXSYNC_MEETING_ID, WEBEXSYNC_MEETING_KEY
    pub post_command: String,
    pub post_command_timeout_seconds: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            post_command: String::new(),
            post_command_timeout_seconds: 300,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = Self::parse(&content)?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

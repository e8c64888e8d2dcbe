use anyhow::Result;
use serde::{Deserialize, Serialize};

/// WebEx product a meeting is scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingType {
    Standard,
    Training,
    Support,
}

impl MeetingType {
    pub fn parse(s: &str) -> Result<MeetingType> {
        match s {
            "standard" => Ok(MeetingType::Standard),
            "training" => Ok(MeetingType::Training),
            "support" => Ok(MeetingType::Support),
            _ => anyhow::bail!("Invalid meeting type: {}", s),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Standard => "standard",
            MeetingType::Training => "training",
            MeetingType::Support => "support",
        }
    }
}

/// Live status of a meeting as last seen on the WebEx site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    NeverStarted,
    Stopped,
    InProgress,
}

impl MeetingStatus {
    pub fn parse(s: &str) -> Result<MeetingStatus> {
        match s {
            "never_started" => Ok(MeetingStatus::NeverStarted),
            "stopped" => Ok(MeetingStatus::Stopped),
            "in_progress" => Ok(MeetingStatus::InProgress),
            _ => anyhow::bail!("Invalid meeting status: {}", s),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::NeverStarted => "never_started",
            MeetingStatus::Stopped => "stopped",
            MeetingStatus::InProgress => "in_progress",
        }
    }
}

/// A locally tracked meeting. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: i64,
    pub name: String,
    pub meeting_key: String,
    pub meeting_type: MeetingType,
    pub status: MeetingStatus,
    pub last_status_check: i64,
}

/// A recording hosted on the WebEx site.
///
/// `deleted` is 0 for live recordings, otherwise the time it was trashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
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
    pub deleted: i64,
}

impl Recording {
    pub fn is_deleted(&self) -> bool {
        self.deleted > 0
    }
}

/// Mapping between a local user and their WebEx account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUserAccount {
    pub id: i64,
    pub local_user_id: i64,
    pub remote_user_id: String,
    pub login_id: String,
    #[serde(skip_serializing)]
    pub password: String,
}

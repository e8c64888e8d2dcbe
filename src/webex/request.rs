//! Request bodies for the WebEx XML service.
//!
//! Builders return a bare `bodyContent` element. [`SecurityContext::wrap`]
//! turns one into a complete `serv:message` for a given set of credentials.

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;

use crate::db::RemoteUserAccount;

/// Upper bound on entries requested from a list call.
pub const LIST_LIMIT: u32 = 500;

const TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Service account credentials and site used when a call has no user.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub site_name: String,
    pub admin_username: String,
    pub admin_password: String,
}

impl SecurityContext {
    pub fn new(
        site_name: impl Into<String>,
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
        }
    }

    /// Wrap a body with a security header for `account`, or the service
    /// account when `account` is `None`.
    pub fn wrap(&self, body: &str, account: Option<&RemoteUserAccount>) -> String {
        let (login, password) = match account {
            Some(account) => (account.login_id.as_str(), account.password.as_str()),
            None => (self.admin_username.as_str(), self.admin_password.as_str()),
        };

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<serv:message xmlns:serv="http://www.webex.com/schemas/2002/06/service" "#,
                r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
                "<header><securityContext>",
                "<webExID>{}</webExID><password>{}</password><siteName>{}</siteName>",
                "</securityContext></header>",
                "<body>{}</body></serv:message>"
            ),
            escape(login),
            escape(password),
            escape(self.site_name.as_str()),
            body
        )
    }
}

fn body_content(binding: &str, inner: &str) -> String {
    format!(
        r#"<bodyContent xsi:type="java:com.webex.service.binding.{}">{}</bodyContent>"#,
        binding, inner
    )
}

fn tag(name: &str, value: &str) -> String {
    format!("<{0}>{1}</{0}>", name, escape(value))
}

pub fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Fields for a new WebEx host account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub login_id: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

pub fn create_user(user: &NewUser<'_>) -> String {
    let inner = [
        tag("firstName", user.first_name),
        tag("lastName", user.last_name),
        tag("webExId", user.login_id),
        tag("email", user.email),
        tag("password", user.password),
        "<privilege><host>true</host></privilege>".to_string(),
        tag("active", "ACTIVATED"),
    ]
    .concat();
    body_content("user.CreateUser", &inner)
}

pub fn get_user_info(login_id: &str) -> String {
    body_content("user.GetUser", &tag("webExId", login_id))
}

pub fn set_user_password(login_id: &str, password: &str) -> String {
    let inner = [tag("webExId", login_id), tag("password", password)].concat();
    body_content("user.SetUser", &inner)
}

pub fn list_open_sessions() -> String {
    body_content("ep.LstOpenSession", "")
}

fn list_control() -> String {
    format!(
        "<listControl><startFrom>0</startFrom><maximumNum>{}</maximumNum></listControl>",
        LIST_LIMIT
    )
}

/// Recordings created between `start` and `end`.
pub fn list_recordings(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let inner = [
        list_control(),
        "<createTimeScope>".to_string(),
        tag("createTimeStart", &format_time(start)),
        tag("createTimeEnd", &format_time(end)),
        "</createTimeScope>".to_string(),
        tag("returnSessionDetails", "true"),
    ]
    .concat();
    body_content("ep.LstRecording", &inner)
}

/// Recordings made in one session.
pub fn list_meeting_recordings(meeting_key: &str) -> String {
    let inner = [
        list_control(),
        tag("sessionKey", meeting_key),
        tag("returnSessionDetails", "true"),
    ]
    .concat();
    body_content("ep.LstRecording", &inner)
}

pub fn get_recording_detail(recording_id: &str) -> String {
    body_content("ep.GetRecordingInfo", &tag("recordingID", recording_id))
}

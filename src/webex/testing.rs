//! Canned provider responses and a scripted transport for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::errors::ProviderError;
use super::gateway::Gateway;
use super::request::SecurityContext;
use super::transport::Transport;

pub fn success_response(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<serv:message xmlns:serv="http://www.webex.com/schemas/2002/06/service" "#,
            r#"xmlns:use="http://www.webex.com/schemas/2002/06/service/user" "#,
            r#"xmlns:ep="http://www.webex.com/schemas/2002/06/service/ep">"#,
            "<serv:header><serv:response><serv:result>SUCCESS</serv:result>",
            "<serv:gsbStatus>PRIMARY</serv:gsbStatus></serv:response></serv:header>",
            "<serv:body><serv:bodyContent>{}</serv:bodyContent></serv:body>",
            "</serv:message>"
        ),
        body
    )
}

pub fn failure_response(code: &str, reason: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<serv:message xmlns:serv="http://www.webex.com/schemas/2002/06/service">"#,
            "<serv:header><serv:response><serv:result>FAILURE</serv:result>",
            "<serv:reason>{}</serv:reason><serv:gsbStatus>PRIMARY</serv:gsbStatus>",
            "<serv:exceptionID>{}</serv:exceptionID></serv:response></serv:header>",
            "<serv:body><serv:bodyContent/></serv:body></serv:message>"
        ),
        reason, code
    )
}

/// Requests a [`ScriptedTransport`] has been asked to send.
#[derive(Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<String>>>);

impl RequestLog {
    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// Number of requests whose text contains `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.contains(needle))
            .count()
    }
}

/// Answers each request with the next scripted reply, in order.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    log: RequestLog,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            log: RequestLog::default(),
        }
    }

    pub fn log(&self) -> RequestLog {
        self.log.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &str) -> Result<String, ProviderError> {
        self.log.0.lock().unwrap().push(request.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("no scripted reply left".to_string())))
    }
}

/// A gateway over scripted replies, plus the log of what it sent.
pub fn scripted_gateway(replies: Vec<Result<String, ProviderError>>) -> (Gateway, RequestLog) {
    let transport = ScriptedTransport::new(replies);
    let log = transport.log();
    let gateway = Gateway::new(
        Box::new(transport),
        SecurityContext::new("acme", "admin", "admin-pass"),
    );
    (gateway, log)
}

//! Authenticated request/response cycle against the XML service.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use super::envelope::{ServiceResponse, XmlElement};
use super::errors::{codes, ErrorSet, ProviderError};
use super::password::generate_password;
use super::request::{self, SecurityContext};
use super::transport::{HttpTransport, Transport};
use crate::config::WebexConfig;
use crate::db::{RemoteUserAccount, UserRepository};

/// Why a call failed, together with everything the provider said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub error: ProviderError,
    pub errors: ErrorSet,
}

impl CallFailure {
    fn new(error: ProviderError, errors: ErrorSet) -> Self {
        Self { error, errors }
    }
}

/// Result of one logical call through [`Gateway::get_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The unwrapped `bodyContent`.
    Payload(XmlElement),
    /// The provider reported that nothing matched the query.
    Empty,
    Failed(CallFailure),
}

impl CallOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failed(_))
    }
}

/// Result of a single exchange, before any retry or no-data handling.
struct Exchange {
    body: Result<XmlElement, ProviderError>,
    errors: ErrorSet,
}

pub struct Gateway {
    transport: Box<dyn Transport>,
    security: SecurityContext,
}

impl Gateway {
    pub fn new(transport: Box<dyn Transport>, security: SecurityContext) -> Self {
        Self {
            transport,
            security,
        }
    }

    pub fn from_config(config: &WebexConfig) -> Result<Self, ProviderError> {
        let transport = HttpTransport::new(config.service_url())?;
        let security = SecurityContext::new(
            config.site.clone(),
            config.admin_username.clone(),
            config.admin_password.clone(),
        );
        Ok(Self::new(Box::new(transport), security))
    }

    /// Send `body` with the credentials of `account`, or of the service
    /// account when `None`.
    ///
    /// A bad-password failure on a user account resets that account's
    /// password and retries once. A no-data failure is reported as
    /// [`CallOutcome::Empty`]. Unless `expect_error` is set, other failures
    /// are logged.
    pub async fn get_response(
        &self,
        conn: &Connection,
        body: &str,
        mut account: Option<&mut RemoteUserAccount>,
        expect_error: bool,
    ) -> CallOutcome {
        let mut exchange = self.exchange(body, account.as_deref()).await;

        if exchange.body.is_err() && exchange.errors.contains(codes::BAD_PASSWORD) {
            if let Some(account) = account.as_deref_mut() {
                info!(
                    "Password rejected for {}, resetting and retrying once",
                    account.login_id
                );
                match self.reset_password(conn, account).await {
                    Ok(()) => exchange = self.exchange(body, Some(&*account)).await,
                    Err(failure) => warn!(
                        "Could not reset password for {}: {}",
                        account.login_id, failure.error
                    ),
                }
            }
        }

        match exchange.body {
            Ok(payload) => CallOutcome::Payload(payload),
            Err(_) if exchange.errors.contains(codes::NO_RECORDS) => {
                debug!("Provider reported no matching records");
                CallOutcome::Empty
            }
            Err(error) => {
                if !expect_error {
                    warn!("Error when processing WebEx request: {} ({})", error, exchange.errors);
                }
                CallOutcome::Failed(CallFailure::new(error, exchange.errors))
            }
        }
    }

    /// Give `account` a fresh password on the site and store it locally.
    ///
    /// The change is made with the service account, so it never triggers
    /// another reset.
    pub async fn reset_password(
        &self,
        conn: &Connection,
        account: &mut RemoteUserAccount,
    ) -> Result<(), CallFailure> {
        let password = generate_password();
        let body = request::set_user_password(&account.login_id, &password);

        let exchange = self.exchange(&body, None).await;
        if let Err(error) = exchange.body {
            return Err(CallFailure::new(error, exchange.errors));
        }

        UserRepository::update_password(conn, account.id, &password)
            .map_err(|e| CallFailure::new(e.into(), ErrorSet::new()))?;
        account.password = password;

        info!("Reset WebEx password for {}", account.login_id);
        Ok(())
    }

    async fn exchange(&self, body: &str, account: Option<&RemoteUserAccount>) -> Exchange {
        let message = self.security.wrap(body, account);

        let raw = match self.transport.send(&message).await {
            Ok(raw) => raw,
            Err(error) => {
                return Exchange {
                    body: Err(error),
                    errors: ErrorSet::new(),
                }
            }
        };

        match ServiceResponse::parse(&raw) {
            Ok(response) if response.success => Exchange {
                body: response.into_body(),
                errors: ErrorSet::new(),
            },
            Ok(response) => Exchange {
                body: Err(ProviderError::from_errors(&response.errors)),
                errors: response.errors,
            },
            Err(error) => Exchange {
                body: Err(error),
                errors: ErrorSet::new(),
            },
        }
    }
}

//! Mapping local users onto WebEx host accounts.
//!
//! An account is created on first use. When the site already has an account
//! under the derived login id and its email matches, that account is adopted
//! and given a fresh password.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::db::{RemoteUserAccount, UserRepository};
use crate::webex::request::{self, NewUser};
use crate::webex::responses::{CreatedUser, UserInfo};
use crate::webex::{codes, generate_password, CallOutcome, Gateway};

/// The host application's view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

pub struct UserProvisioner<'a> {
    gateway: &'a Gateway,
    prefix: String,
}

impl<'a> UserProvisioner<'a> {
    pub fn new(gateway: &'a Gateway, prefix: impl Into<String>) -> Self {
        Self {
            gateway,
            prefix: prefix.into(),
        }
    }

    pub fn login_id_for(&self, identity: &ExternalIdentity) -> String {
        format!("{}{}", self.prefix, identity.username)
    }

    /// Return the WebEx account for `identity`, creating or adopting one if
    /// there is no mapping yet.
    ///
    /// With `check_auth`, a stored account's credentials are verified against
    /// the site and replaced if they no longer work.
    pub async fn get_remote_user(
        &self,
        conn: &Connection,
        identity: &ExternalIdentity,
        check_auth: bool,
    ) -> Option<RemoteUserAccount> {
        if identity.id <= 0 || identity.username.trim().is_empty() {
            warn!("Refusing to provision incomplete identity {:?}", identity.id);
            return None;
        }

        match UserRepository::find_by_local_user(conn, identity.id) {
            Ok(Some(mut account)) => {
                if check_auth && !self.check_user_auth(conn, &mut account).await {
                    if let Err(failure) = self.gateway.reset_password(conn, &mut account).await {
                        warn!(
                            "Could not replace credentials for {}: {}",
                            account.login_id, failure.error
                        );
                    }
                }
                Some(account)
            }
            Ok(None) => self.create_remote_user(conn, identity).await,
            Err(e) => {
                error!("Failed to look up WebEx user for {}: {:#}", identity.id, e);
                None
            }
        }
    }

    /// Whether the stored credentials are accepted by the site.
    pub async fn check_user_auth(&self, conn: &Connection, account: &mut RemoteUserAccount) -> bool {
        let body = request::get_user_info(&account.login_id);
        let login_id = account.login_id.clone();
        match self.gateway.get_response(conn, &body, Some(account), true).await {
            CallOutcome::Failed(failure) => {
                debug!("Credentials for {} rejected: {}", login_id, failure.error);
                false
            }
            _ => true,
        }
    }

    async fn create_remote_user(
        &self,
        conn: &Connection,
        identity: &ExternalIdentity,
    ) -> Option<RemoteUserAccount> {
        let login_id = self.login_id_for(identity);
        let password = generate_password();

        let body = request::create_user(&NewUser {
            first_name: &identity.first_name,
            last_name: &identity.last_name,
            login_id: &login_id,
            email: &identity.email,
            password: &password,
        });

        match self.gateway.get_response(conn, &body, None, true).await {
            CallOutcome::Payload(payload) => {
                let created = match CreatedUser::from_body(&payload) {
                    Ok(created) => created,
                    Err(e) => {
                        error!("Unexpected createUser response for {}: {}", login_id, e);
                        return None;
                    }
                };
                match UserRepository::insert(conn, identity.id, &created.user_id, &login_id, &password)
                {
                    Ok(account) => {
                        info!("Created WebEx user {} ({})", login_id, created.user_id);
                        Some(account)
                    }
                    Err(e) => {
                        error!("Failed to save WebEx user {}: {:#}", login_id, e);
                        None
                    }
                }
            }
            CallOutcome::Empty => {
                warn!("createUser for {} returned no data", login_id);
                None
            }
            CallOutcome::Failed(failure) => {
                if failure.errors.contains(codes::DUPLICATE_LOGIN) {
                    return self.adopt_existing_user(conn, identity, &login_id).await;
                }
                if failure.errors.contains(codes::DUPLICATE_EMAIL) {
                    // Adoption on an email-only collision is undecided; the
                    // account found by email may have a different login id.
                    warn!(
                        "Email {} already used by another WebEx account, not adopting",
                        identity.email
                    );
                    return None;
                }
                warn!("Could not create WebEx user {}: {}", login_id, failure.error);
                None
            }
        }
    }

    async fn adopt_existing_user(
        &self,
        conn: &Connection,
        identity: &ExternalIdentity,
        login_id: &str,
    ) -> Option<RemoteUserAccount> {
        let body = request::get_user_info(login_id);
        let payload = match self.gateway.get_response(conn, &body, None, false).await {
            CallOutcome::Payload(payload) => payload,
            _ => return None,
        };

        let info = match UserInfo::from_body(&payload) {
            Ok(info) => info,
            Err(e) => {
                error!("Unexpected getUser response for {}: {}", login_id, e);
                return None;
            }
        };

        if info.email.to_lowercase() != identity.email.to_lowercase() {
            warn!(
                "WebEx user {} exists with a different email, not adopting",
                login_id
            );
            return None;
        }

        let mut account = match UserRepository::insert(conn, identity.id, &info.user_id, login_id, "") {
            Ok(account) => account,
            Err(e) => {
                error!("Failed to save adopted WebEx user {}: {:#}", login_id, e);
                return None;
            }
        };

        // The existing password is unknown, so replace it.
        if let Err(failure) = self.gateway.reset_password(conn, &mut account).await {
            warn!(
                "Adopted WebEx user {} but could not set a password: {}",
                login_id, failure.error
            );
        }

        info!("Adopted existing WebEx user {} ({})", login_id, info.user_id);
        Some(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use crate::webex::password::PASSWORD_SUFFIX;
    use crate::webex::testing::{failure_response, scripted_gateway, success_response};

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn identity() -> ExternalIdentity {
        ExternalIdentity {
            id: 7,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            username: "jdoe".to_string(),
            email: "jane@example.com".to_string(),
        }
    }

    fn user_info(email: &str) -> String {
        success_response(&format!(
            "<use:userId>9001</use:userId><use:email>{}</use:email>",
            email
        ))
    }

    #[tokio::test]
    async fn test_creates_new_user() {
        let conn = setup_db();
        let (gateway, log) =
            scripted_gateway(vec![Ok(success_response("<use:userId>9001</use:userId>"))]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        let account = provisioner
            .get_remote_user(&conn, &identity(), false)
            .await
            .unwrap();

        assert_eq!(account.local_user_id, 7);
        assert_eq!(account.remote_user_id, "9001");
        assert_eq!(account.login_id, "lms_jdoe");
        assert!(account.password.ends_with(PASSWORD_SUFFIX));
        assert!(log.all()[0].contains("<webExId>lms_jdoe</webExId>"));
        assert!(log.all()[0].contains("<webExID>admin</webExID>"));

        let stored = UserRepository::find_by_local_user(&conn, 7).unwrap().unwrap();
        assert_eq!(stored, account);
    }

    #[tokio::test]
    async fn test_existing_mapping_returned_without_remote_call() {
        let conn = setup_db();
        let existing = UserRepository::insert(&conn, 7, "9001", "lms_jdoe", "pw").unwrap();
        let (gateway, log) = scripted_gateway(vec![]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        let account = provisioner.get_remote_user(&conn, &identity(), false).await;

        assert_eq!(account, Some(existing));
        assert_eq!(log.len(), 0);
    }

    #[tokio::test]
    async fn test_check_auth_failure_replaces_password() {
        let conn = setup_db();
        UserRepository::insert(&conn, 7, "9001", "lms_jdoe", "pw").unwrap();
        let (gateway, log) = scripted_gateway(vec![
            Ok(failure_response("030001", "Corresponding User not found")),
            Ok(success_response("")),
        ]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        let account = provisioner
            .get_remote_user(&conn, &identity(), true)
            .await
            .unwrap();

        assert_ne!(account.password, "pw");
        assert_eq!(log.count_containing("user.SetUser"), 1);
        let stored = UserRepository::find_by_local_user(&conn, 7).unwrap().unwrap();
        assert_eq!(stored.password, account.password);
    }

    #[tokio::test]
    async fn test_check_auth_success_keeps_password() {
        let conn = setup_db();
        UserRepository::insert(&conn, 7, "9001", "lms_jdoe", "pw").unwrap();
        let (gateway, log) = scripted_gateway(vec![Ok(user_info("jane@example.com"))]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        let account = provisioner
            .get_remote_user(&conn, &identity(), true)
            .await
            .unwrap();

        assert_eq!(account.password, "pw");
        assert_eq!(log.len(), 1);
        assert!(log.all()[0].contains("<webExID>lms_jdoe</webExID>"));
    }

    #[tokio::test]
    async fn test_duplicate_login_adopts_matching_email() {
        let conn = setup_db();
        let (gateway, log) = scripted_gateway(vec![
            Ok(failure_response(codes::DUPLICATE_LOGIN, "Duplicated WebEx ID")),
            Ok(user_info("JANE@example.COM")),
            Ok(success_response("")),
        ]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        let account = provisioner
            .get_remote_user(&conn, &identity(), false)
            .await
            .unwrap();

        assert_eq!(account.remote_user_id, "9001");
        assert_eq!(account.login_id, "lms_jdoe");
        assert!(account.password.ends_with(PASSWORD_SUFFIX));
        assert_eq!(log.count_containing("user.SetUser"), 1);

        let stored = UserRepository::find_by_local_user(&conn, 7).unwrap().unwrap();
        assert_eq!(stored.password, account.password);
    }

    #[tokio::test]
    async fn test_duplicate_login_with_other_email_is_not_adopted() {
        let conn = setup_db();
        let (gateway, _log) = scripted_gateway(vec![
            Ok(failure_response(codes::DUPLICATE_LOGIN, "Duplicated WebEx ID")),
            Ok(user_info("someone@else.com")),
        ]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        assert!(provisioner
            .get_remote_user(&conn, &identity(), false)
            .await
            .is_none());
        assert!(UserRepository::find_by_local_user(&conn, 7).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_does_not_adopt() {
        let conn = setup_db();
        let (gateway, log) = scripted_gateway(vec![Ok(failure_response(
            codes::DUPLICATE_EMAIL,
            "Email address already exists",
        ))]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        assert!(provisioner
            .get_remote_user(&conn, &identity(), false)
            .await
            .is_none());
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_other_failure_yields_none() {
        let conn = setup_db();
        let (gateway, _log) = scripted_gateway(vec![Ok(failure_response(
            "999999",
            "Internal error",
        ))]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");

        assert!(provisioner
            .get_remote_user(&conn, &identity(), false)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_incomplete_identity_rejected() {
        let conn = setup_db();
        let (gateway, log) = scripted_gateway(vec![]);
        let provisioner = UserProvisioner::new(&gateway, "lms_");
        let mut nameless = identity();
        nameless.username = String::new();

        assert!(provisioner
            .get_remote_user(&conn, &nameless, false)
            .await
            .is_none());
        assert_eq!(log.len(), 0);
    }
}

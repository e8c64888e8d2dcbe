use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::schemas::RemoteUserAccount;

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<RemoteUserAccount> {
    Ok(RemoteUserAccount {
        id: row.get(0)?,
        local_user_id: row.get(1)?,
        remote_user_id: row.get(2)?,
        login_id: row.get(3)?,
        password: row.get(4)?,
    })
}

/// Repository for local user to WebEx account mappings.
pub struct UserRepository;

impl UserRepository {
    /// Store a new mapping and return it with its assigned id.
    pub fn insert(
        conn: &Connection,
        local_user_id: i64,
        remote_user_id: &str,
        login_id: &str,
        password: &str,
    ) -> Result<RemoteUserAccount> {
        conn.execute(
            "INSERT INTO remote_users (local_user_id, remote_user_id, login_id, password) \
             VALUES (?1, ?2, ?3, ?4)",
            params![local_user_id, remote_user_id, login_id, password],
        )
        .context("Failed to insert remote user")?;

        Ok(RemoteUserAccount {
            id: conn.last_insert_rowid(),
            local_user_id,
            remote_user_id: remote_user_id.to_string(),
            login_id: login_id.to_string(),
            password: password.to_string(),
        })
    }

    pub fn find_by_local_user(conn: &Connection, local_user_id: i64) -> Result<Option<RemoteUserAccount>> {
        conn.query_row(
            "SELECT id, local_user_id, remote_user_id, login_id, password \
             FROM remote_users WHERE local_user_id = ?1",
            params![local_user_id],
            account_from_row,
        )
        .optional()
        .context("Failed to query remote user")
    }

    pub fn update_password(conn: &Connection, id: i64, password: &str) -> Result<()> {
        conn.execute(
            "UPDATE remote_users SET password = ?1 WHERE id = ?2",
            params![password, id],
        )
        .context("Failed to update remote user password")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_find() {
        let conn = setup_db();
        let account = UserRepository::insert(&conn, 7, "1001", "lms_jdoe", "pw").unwrap();
        assert!(account.id > 0);

        let found = UserRepository::find_by_local_user(&conn, 7).unwrap().unwrap();
        assert_eq!(found, account);
        assert!(UserRepository::find_by_local_user(&conn, 8).unwrap().is_none());
    }

    #[test]
    fn test_one_mapping_per_local_user() {
        let conn = setup_db();
        UserRepository::insert(&conn, 7, "1001", "lms_jdoe", "pw").unwrap();
        assert!(UserRepository::insert(&conn, 7, "1002", "lms_other", "pw").is_err());
    }

    #[test]
    fn test_update_password() {
        let conn = setup_db();
        let account = UserRepository::insert(&conn, 7, "1001", "lms_jdoe", "").unwrap();

        UserRepository::update_password(&conn, account.id, "new-pass").unwrap();

        let found = UserRepository::find_by_local_user(&conn, 7).unwrap().unwrap();
        assert_eq!(found.password, "new-pass");
    }
}

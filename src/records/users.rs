use rusqlite::Connection;

use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    count_users, insert_user, list_active_users, now_timestamp, set_user_active,
    update_password_hash, username_exists,
};
use crate::models::{Role, User};
use crate::password::hash_password;
use crate::session::Session;
use crate::validation::{validate_credentials, ValidationErrors};

impl Records {
    /// Create an active account. The password is stored hashed.
    pub fn create_user(
        &self,
        session: &Session,
        username: &str,
        password: &str,
        role: Role,
        reference_id: Option<i64>,
    ) -> Result<User, RecordsError> {
        session.require(Capability::ManageUsers)?;
        validate_credentials(username, password)?;
        self.recorder.record("Create User", || {
            let conn = self.connect()?;
            insert_account(&conn, username, password, role, reference_id)
        })
    }

    /// Create the first Admin account. Does nothing once any user exists.
    pub fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, RecordsError> {
        validate_credentials(username, password)?;
        self.recorder.record("Bootstrap Admin", || {
            let conn = self.connect()?;
            if count_users(&conn)? > 0 {
                return Ok(None);
            }
            let user = insert_account(&conn, username, password, Role::Admin, None)?;
            tracing::info!(username = %user.username, "Initial admin account created");
            Ok(Some(user))
        })
    }

    /// Deactivated accounts stay in the table but can no longer log in.
    pub fn deactivate_user(&self, session: &Session, user_id: i64) -> Result<(), RecordsError> {
        self.run(session, Capability::ManageUsers, "Deactivate User", || {
            let conn = self.connect()?;
            set_user_active(&conn, user_id, false)?;
            tracing::info!(user_id, "User deactivated");
            Ok(())
        })
    }

    /// Users may change their own password; anyone else's needs `ManageUsers`.
    pub fn change_password(
        &self,
        session: &Session,
        user_id: i64,
        new_password: &str,
    ) -> Result<(), RecordsError> {
        let own_account = session
            .current_user()
            .is_some_and(|u| u.is_persisted() && u.id == user_id);
        if !own_account {
            session.require(Capability::ManageUsers)?;
        }
        if new_password.is_empty() {
            return Err(ValidationErrors::single("password", "Password is required").into());
        }
        self.recorder.record("Change Password", || {
            let conn = self.connect()?;
            Ok(update_password_hash(&conn, user_id, &hash_password(new_password))?)
        })
    }

    pub fn list_active_users(&self, session: &Session) -> Result<Vec<User>, RecordsError> {
        self.run(session, Capability::ManageUsers, "Load Active Users", || {
            let conn = self.connect()?;
            Ok(list_active_users(&conn)?)
        })
    }

    pub fn username_exists(&self, session: &Session, username: &str) -> Result<bool, RecordsError> {
        self.run(session, Capability::ManageUsers, "Check Username", || {
            let conn = self.connect()?;
            Ok(username_exists(&conn, username.trim())?)
        })
    }
}

fn insert_account(
    conn: &Connection,
    username: &str,
    password: &str,
    role: Role,
    reference_id: Option<i64>,
) -> Result<User, RecordsError> {
    let username = username.trim();
    if username_exists(conn, username)? {
        return Err(ValidationErrors::single("username", "Username already exists").into());
    }
    let user = insert_user(
        conn,
        &User {
            id: 0,
            username: username.to_string(),
            password_hash: hash_password(password),
            role,
            reference_id,
            is_active: true,
            created_at: now_timestamp(),
            last_login: None,
        },
    )?;
    Ok(user)
}

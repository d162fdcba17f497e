//! Login session for one operator.
//!
//! The session is a plain value owned by the caller and passed to every
//! records call; there is no process-wide "current user".
//!
//! State machine:
//!
//! ```text
//! Anonymous ──choose_role(Admin|Doctor)──▶ RoleChosen(role)
//! RoleChosen ──login(ok)─────────────────▶ Authenticated(user)
//! Anonymous | RoleChosen ──login_as_patient──▶ Authenticated(Patient)
//! any ──logout──▶ Anonymous
//! ```
//!
//! A failed login leaves the state where it was.

use rusqlite::Connection;

use crate::authorization::{self, AccessDenied, Capability};
use crate::db::repository::{get_user_by_username, now_timestamp, record_login};
use crate::db::DatabaseError;
use crate::models::{Role, User};
use crate::password::verify_password;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    RoleChosen(Role),
    Authenticated(User),
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::RoleChosen(_) => "role chosen",
            SessionState::Authenticated(_) => "authenticated",
        }
    }
}

/// Login failures. Unknown user and wrong password share one message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    NotFound,

    #[error("This account has been deactivated")]
    Inactive,

    #[error("Invalid credentials for {expected} login")]
    RoleMismatch { expected: Role },

    #[error("Invalid username or password")]
    BadCredential,

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Transitions
// ═══════════════════════════════════════════════════════════

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Pick the staff role whose credentials will be entered next.
    pub fn choose_role(&mut self, role: Role) -> Result<(), AuthError> {
        if matches!(self.state, SessionState::Authenticated(_)) || role == Role::Patient {
            return Err(AuthError::InvalidTransition {
                action: "choose a staff role",
                state: self.state.label(),
            });
        }
        self.state = SessionState::RoleChosen(role);
        Ok(())
    }

    /// Authenticate against the `users` table for the chosen role.
    ///
    /// Checks run in a fixed order: unknown user, deactivated account,
    /// role mismatch, password. On success `last_login` is recorded.
    pub fn login(
        &mut self,
        conn: &Connection,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let expected = match self.state {
            SessionState::RoleChosen(role) => role,
            _ => {
                return Err(AuthError::InvalidTransition {
                    action: "log in",
                    state: self.state.label(),
                })
            }
        };

        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please enter both username and password".into(),
            ));
        }

        let mut user = get_user_by_username(conn, username)?.ok_or(AuthError::NotFound)?;
        if !user.is_active {
            return Err(AuthError::Inactive);
        }
        if user.role != expected {
            return Err(AuthError::RoleMismatch { expected });
        }
        if !verify_password(password, &user.password_hash) {
            tracing::info!(username, "Login rejected");
            return Err(AuthError::BadCredential);
        }

        let now = now_timestamp();
        record_login(conn, user.id, &now)?;
        user.last_login = Some(now);

        tracing::info!(username, role = %user.role, "Login succeeded");
        self.state = SessionState::Authenticated(user.clone());
        Ok(user)
    }

    /// Enter the patient kiosk mode. No credentials, no store access.
    pub fn login_as_patient(&mut self) -> Result<User, AuthError> {
        if matches!(self.state, SessionState::Authenticated(_)) {
            return Err(AuthError::InvalidTransition {
                action: "start a patient session",
                state: self.state.label(),
            });
        }
        let user = User::synthetic_patient(now_timestamp());
        self.state = SessionState::Authenticated(user.clone());
        tracing::info!("Patient session started");
        Ok(user)
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated(user) = &self.state {
            tracing::info!(username = %user.username, "Logged out");
        }
        self.state = SessionState::Anonymous;
    }

    // ── Queries ──────────────────────────────────────────

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// The authenticated user, if their role holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<&User, AccessDenied> {
        authorization::require(self.role(), capability)?;
        self.current_user().ok_or(AccessDenied {
            role: None,
            capability,
        })
    }

    /// Capabilities of the current role; empty when not authenticated.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.role()
            .map(authorization::capabilities_for)
            .unwrap_or_default()
    }
}

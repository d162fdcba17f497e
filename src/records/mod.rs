//! Records facade.
//!
//! Single entry point for every clinic operation. Each call:
//! 1. checks the session's capability
//! 2. validates caller-supplied data
//! 3. runs the store work (through the entity cache where one exists)
//! 4. is timed by the performance recorder
//!
//! `Records` is `Send + Sync`; one instance can serve several threads.

mod appointments;
mod departments;
mod doctors;
mod feedback;
mod inventory;
mod notes;
mod patients;
mod prescriptions;
mod statistics;
mod users;

use rusqlite::Connection;

use crate::authorization::{AccessDenied, Capability};
use crate::cache::EntityCache;
use crate::config::AppConfig;
use crate::db::{Database, DatabaseError};
use crate::models::{Doctor, InventoryItem, Patient};
use crate::notes::{open_note_store, NoteStore, NoteStoreError};
use crate::performance::PerformanceRecorder;
use crate::session::{AuthError, Session};
use crate::validation::ValidationErrors;

pub use patients::sort_patients;
pub use statistics::StatisticsTask;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Unauthorized(#[from] AccessDenied),

    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("Storage failure: {0}")]
    Storage(DatabaseError),

    #[error("Note store failure: {0}")]
    Notes(#[from] NoteStoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statistics worker stopped without a result")]
    WorkerLost,
}

impl From<DatabaseError> for RecordsError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => RecordsError::NotFound {
                entity: entity_type,
                id,
            },
            other => RecordsError::Storage(other),
        }
    }
}

impl From<rusqlite::Error> for RecordsError {
    fn from(err: rusqlite::Error) -> Self {
        RecordsError::Storage(DatabaseError::Sqlite(err))
    }
}

impl RecordsError {
    pub(crate) fn not_found(entity: &str, id: i64) -> Self {
        RecordsError::NotFound {
            entity: entity.into(),
            id,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Facade
// ═══════════════════════════════════════════════════════════

pub struct Records {
    db: Database,
    patients: EntityCache<Patient>,
    doctors: EntityCache<Doctor>,
    inventory: EntityCache<InventoryItem>,
    notes: Box<dyn NoteStore>,
    recorder: PerformanceRecorder,
}

impl Records {
    pub fn new(db: Database, notes: Box<dyn NoteStore>, recorder: PerformanceRecorder) -> Self {
        Self {
            db,
            patients: EntityCache::new("patients"),
            doctors: EntityCache::new("doctors"),
            inventory: EntityCache::new("inventory"),
            notes,
            recorder,
        }
    }

    /// Open the database, note store and performance log named by `config`.
    pub fn open(config: &AppConfig) -> Result<Self, RecordsError> {
        let db = Database::open(&config.database_path)?;
        let notes = open_note_store(config.notes_database_path.as_deref());
        let recorder = PerformanceRecorder::new(config.performance_log_path.clone());
        Ok(Self::new(db, notes, recorder))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn recorder(&self) -> &PerformanceRecorder {
        &self.recorder
    }

    fn connect(&self) -> Result<Connection, RecordsError> {
        Ok(self.db.connect()?)
    }

    /// Capability check, then the timed body.
    fn run<T, F>(
        &self,
        session: &Session,
        capability: Capability,
        operation: &str,
        body: F,
    ) -> Result<T, RecordsError>
    where
        F: FnOnce() -> Result<T, RecordsError>,
    {
        session.require(capability)?;
        self.recorder.record(operation, body)
    }

    // ── Session ──────────────────────────────────────────

    /// Staff login against the user table. See `Session::login`.
    pub fn login(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<(), RecordsError> {
        self.recorder.record("Login", || {
            let conn = self.connect()?;
            session.login(&conn, username, password)?;
            Ok(())
        })
    }
}

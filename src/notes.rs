//! Patient note document store.
//!
//! Notes are schemaless documents (`content` is an arbitrary key/text map)
//! kept apart from the relational records, in their own SQLite file as
//! JSON. When no store is configured, or it cannot be opened, a disabled
//! store takes its place: writes are dropped and reads come back empty.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::models::PatientNote;

#[derive(Debug, thiserror::Error)]
pub enum NoteStoreError {
    #[error("Note store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed note document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait NoteStore: Send + Sync {
    fn put(&self, note: &PatientNote) -> Result<(), NoteStoreError>;

    /// Notes for one patient, in insertion order.
    fn list(&self, patient_id: i64) -> Result<Vec<PatientNote>, NoteStoreError>;

    fn is_enabled(&self) -> bool {
        true
    }
}

// ═══════════════════════════════════════════════════════════
// SQLite-backed store
// ═══════════════════════════════════════════════════════════

const NOTES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS patient_notes (
    id TEXT PRIMARY KEY,
    patient_id INTEGER NOT NULL,
    document TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_patient_notes_patient ON patient_notes(patient_id);
";

#[derive(Debug, Clone)]
pub struct SqliteNoteStore {
    path: PathBuf,
}

impl SqliteNoteStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, NoteStoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path };
        store.connect()?.execute_batch(NOTES_SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, NoteStoreError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA busy_timeout=5000;")?;
        Ok(conn)
    }
}

impl NoteStore for SqliteNoteStore {
    fn put(&self, note: &PatientNote) -> Result<(), NoteStoreError> {
        let document = serde_json::to_string(note)?;
        self.connect()?.execute(
            "INSERT INTO patient_notes (id, patient_id, document) VALUES (?1, ?2, ?3)",
            params![note.id, note.patient_id, document],
        )?;
        Ok(())
    }

    fn list(&self, patient_id: i64) -> Result<Vec<PatientNote>, NoteStoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT document FROM patient_notes WHERE patient_id = ?1 ORDER BY rowid",
        )?;
        let documents = stmt
            .query_map(params![patient_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        documents
            .iter()
            .map(|doc| serde_json::from_str(doc).map_err(NoteStoreError::from))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// Disabled store
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNoteStore;

impl NoteStore for DisabledNoteStore {
    fn put(&self, note: &PatientNote) -> Result<(), NoteStoreError> {
        tracing::debug!(patient_id = note.patient_id, "Note store disabled, note dropped");
        Ok(())
    }

    fn list(&self, _patient_id: i64) -> Result<Vec<PatientNote>, NoteStoreError> {
        Ok(Vec::new())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Open the configured store, falling back to `DisabledNoteStore`.
pub fn open_note_store(path: Option<&Path>) -> Box<dyn NoteStore> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        tracing::warn!("Note store not configured, patient notes will not be saved");
        return Box::new(DisabledNoteStore);
    };
    match SqliteNoteStore::open(path) {
        Ok(store) => {
            tracing::info!(path = %path.display(), "Note store ready");
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Note store unavailable, notes disabled");
            Box::new(DisabledNoteStore)
        }
    }
}

//! Scoped transactions.
//!
//! `in_transaction` binds begin/commit/rollback to one closure. The
//! closure's `Ok` commits; an `Err` (or a panic) drops the
//! `rusqlite::Transaction`, which rolls back. Nested use on the same
//! connection is rejected by SQLite.

use rusqlite::{Connection, Transaction};

use super::DatabaseError;

/// Run `body` inside a transaction on `conn`.
///
/// The error type only needs to absorb `DatabaseError` so callers can
/// return their own richer errors (e.g. `NotFound`) from the body.
pub fn in_transaction<T, E, F>(conn: &Connection, body: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<DatabaseError>,
{
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| E::from(DatabaseError::Sqlite(e)))?;

    match body(&tx) {
        Ok(value) => {
            tx.commit().map_err(|e| E::from(DatabaseError::Sqlite(e)))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!("Rollback failed: {rollback_err}");
            } else {
                tracing::debug!("Transaction rolled back");
            }
            Err(err)
        }
    }
}

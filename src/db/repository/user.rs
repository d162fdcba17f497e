use rusqlite::{params, Connection, OptionalExtension};

use super::{enum_column, format_timestamp, not_found, optional_timestamp_column, timestamp_column};
use crate::db::DatabaseError;
use crate::models::User;

const USER_COLUMNS: &str =
    "id, username, password_hash, role, reference_id, is_active, created_at, last_login";

pub fn insert_user(conn: &Connection, user: &User) -> Result<User, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, password_hash, role, reference_id, is_active, created_at, last_login)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.username,
            user.password_hash,
            user.role.as_str(),
            user.reference_id,
            user.is_active,
            format_timestamp(&user.created_at),
            user.last_login.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        ..user.clone()
    })
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_user)
        .optional()
        .map_err(DatabaseError::from)
}

/// Lookup regardless of `is_active`; the session decides what inactive means.
pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    conn.query_row(&sql, params![username], row_to_user)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        params![username],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn list_active_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY username");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_user)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub fn record_login(
    conn: &Connection,
    id: i64,
    at: &chrono::NaiveDateTime,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE users SET last_login = ?2 WHERE id = ?1",
        params![id, format_timestamp(at)],
    )?;
    if affected == 0 {
        return Err(not_found("user", id));
    }
    Ok(())
}

pub fn set_user_active(conn: &Connection, id: i64, active: bool) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE users SET is_active = ?2 WHERE id = ?1",
        params![id, active],
    )?;
    if affected == 0 {
        return Err(not_found("user", id));
    }
    Ok(())
}

pub fn update_password_hash(
    conn: &Connection,
    id: i64,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE users SET password_hash = ?2 WHERE id = ?1",
        params![id, password_hash],
    )?;
    if affected == 0 {
        return Err(not_found("user", id));
    }
    Ok(())
}

fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: enum_column(row, 3)?,
        reference_id: row.get(4)?,
        is_active: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        last_login: optional_timestamp_column(row, 7)?,
    })
}

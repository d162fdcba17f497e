use rusqlite::{params, Connection, OptionalExtension};

use super::not_found;
use crate::db::DatabaseError;
use crate::models::Department;

pub fn insert_department(
    conn: &Connection,
    department: &Department,
) -> Result<Department, DatabaseError> {
    conn.execute(
        "INSERT INTO departments (name, location) VALUES (?1, ?2)",
        params![department.name, department.location],
    )?;
    Ok(Department {
        id: conn.last_insert_rowid(),
        ..department.clone()
    })
}

pub fn get_department(conn: &Connection, id: i64) -> Result<Option<Department>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, location FROM departments WHERE id = ?1",
        params![id],
        row_to_department,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Exact name lookup, ignoring case.
pub fn get_department_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Department>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, location FROM departments WHERE lower(name) = lower(?1) LIMIT 1",
        params![name.trim()],
        row_to_department,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn list_departments(conn: &Connection) -> Result<Vec<Department>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, location FROM departments ORDER BY name")?;
    let rows = stmt.query_map([], row_to_department)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_department(
    conn: &Connection,
    department: &Department,
) -> Result<Department, DatabaseError> {
    let affected = conn.execute(
        "UPDATE departments SET name = ?2, location = ?3 WHERE id = ?1",
        params![department.id, department.name, department.location],
    )?;
    if affected == 0 {
        return Err(not_found("department", department.id));
    }
    Ok(department.clone())
}

/// Delete a department. Fails on the foreign key while doctors still reference it.
/// Returns whether a row was removed.
pub fn delete_department(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM departments WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

fn row_to_department(row: &rusqlite::Row) -> Result<Department, rusqlite::Error> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
    })
}

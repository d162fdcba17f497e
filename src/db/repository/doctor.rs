use rusqlite::{params, Connection, OptionalExtension};

use super::{format_timestamp, not_found, timestamp_column};
use crate::db::DatabaseError;
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str =
    "id, first_name, last_name, specialization, email, phone, department_id, created_at";

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<Doctor, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (first_name, last_name, specialization, email, phone, department_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            doctor.first_name,
            doctor.last_name,
            doctor.specialization,
            doctor.email,
            doctor.phone,
            doctor.department_id,
            format_timestamp(&doctor.created_at),
        ],
    )?;
    Ok(Doctor {
        id: conn.last_insert_rowid(),
        ..doctor.clone()
    })
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_doctor)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_doctor)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_doctor(conn: &Connection, doctor: &Doctor) -> Result<Doctor, DatabaseError> {
    let affected = conn.execute(
        "UPDATE doctors
         SET first_name = ?2, last_name = ?3, specialization = ?4,
             email = ?5, phone = ?6, department_id = ?7
         WHERE id = ?1",
        params![
            doctor.id,
            doctor.first_name,
            doctor.last_name,
            doctor.specialization,
            doctor.email,
            doctor.phone,
            doctor.department_id,
        ],
    )?;
    if affected == 0 {
        return Err(not_found("doctor", doctor.id));
    }
    get_doctor(conn, doctor.id)?.ok_or_else(|| not_found("doctor", doctor.id))
}

/// Case-insensitive match on "first last". A leading "Dr." is ignored.
pub fn find_doctor_by_name(
    conn: &Connection,
    full_name: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    let trimmed = full_name.trim();
    let name = trimmed
        .strip_prefix("Dr.")
        .or_else(|| trimmed.strip_prefix("dr."))
        .unwrap_or(trimmed)
        .trim();
    let sql = format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors
         WHERE lower(first_name || ' ' || last_name) = lower(?1)
         ORDER BY id LIMIT 1"
    );
    conn.query_row(&sql, params![name], row_to_doctor)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn count_doctors(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
    Ok(count)
}

fn row_to_doctor(row: &rusqlite::Row) -> Result<Doctor, rusqlite::Error> {
    Ok(Doctor {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        specialization: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        department_id: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
    })
}

use rusqlite::{params, Connection, OptionalExtension};

use super::{date_column, format_date, format_timestamp, not_found, timestamp_column};
use crate::db::DatabaseError;
use crate::models::Patient;

const PATIENT_COLUMNS: &str =
    "id, first_name, last_name, gender, birth_date, email, phone, address, created_at";

/// Insert a patient and return it with the assigned id.
pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<Patient, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (first_name, last_name, gender, birth_date, email, phone, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.first_name,
            patient.last_name,
            patient.gender,
            format_date(&patient.birth_date),
            patient.email,
            patient.phone,
            patient.address,
            format_timestamp(&patient.created_at),
        ],
    )?;
    Ok(Patient {
        id: conn.last_insert_rowid(),
        ..patient.clone()
    })
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_patient)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Overwrite every mutable column. `created_at` is kept as stored.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<Patient, DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients
         SET first_name = ?2, last_name = ?3, gender = ?4, birth_date = ?5,
             email = ?6, phone = ?7, address = ?8
         WHERE id = ?1",
        params![
            patient.id,
            patient.first_name,
            patient.last_name,
            patient.gender,
            format_date(&patient.birth_date),
            patient.email,
            patient.phone,
            patient.address,
        ],
    )?;
    if affected == 0 {
        return Err(not_found("patient", patient.id));
    }
    get_patient(conn, patient.id)?.ok_or_else(|| not_found("patient", patient.id))
}

/// Name-fragment search on first or last name, backed by `LIKE`.
pub fn search_patients(conn: &Connection, fragment: &str) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = format!("%{}%", escape_like(fragment.trim()));
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE first_name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\'
         ORDER BY last_name, first_name"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// `%` and `_` in user input match literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive match on "first last".
pub fn find_patient_by_name(
    conn: &Connection,
    full_name: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE lower(first_name || ' ' || last_name) = lower(?1)
         ORDER BY id LIMIT 1"
    );
    conn.query_row(&sql, params![full_name.trim()], row_to_patient)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

fn row_to_patient(row: &rusqlite::Row) -> Result<Patient, rusqlite::Error> {
    Ok(Patient {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender: row.get(3)?,
        birth_date: date_column(row, 4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        address: row.get(7)?,
        created_at: timestamp_column(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_assigns_id_and_reads_back() {
        let conn = open_memory_database().unwrap();
        let stored = insert_patient(&conn, &new_patient("Jane", "Doe")).unwrap();
        assert!(stored.id > 0);

        let fetched = get_patient(&conn, stored.id).unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[test]
    fn get_missing_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn update_changes_columns_but_not_created_at() {
        let conn = open_memory_database().unwrap();
        let stored = seed_patient(&conn, "Jane", "Doe");

        let mut edited = stored.clone();
        edited.phone = Some("5559876543".into());
        edited.created_at = ts("2030-01-01 00:00:00");
        let updated = update_patient(&conn, &edited).unwrap();

        assert_eq!(updated.phone.as_deref(), Some("5559876543"));
        assert_eq!(updated.created_at, stored.created_at);
    }

    #[test]
    fn update_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        let mut ghost = new_patient("No", "One");
        ghost.id = 99;
        match update_patient(&conn, &ghost) {
            Err(DatabaseError::NotFound { entity_type, id }) => {
                assert_eq!(entity_type, "patient");
                assert_eq!(id, 99);
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn search_matches_first_or_last_name_fragment() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, "Jane", "Doe");
        seed_patient(&conn, "John", "Smith");
        seed_patient(&conn, "Anna", "Janssen");

        let hits = search_patients(&conn, "jan").unwrap();
        let names: Vec<String> = hits.iter().map(|p| p.full_name()).collect();
        assert_eq!(names, vec!["Jane Doe", "Anna Janssen"]);
    }

    #[test]
    fn search_wildcards_match_literally() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, "Jane", "Doe");
        seed_patient(&conn, "John", "Smith");
        assert!(search_patients(&conn, "%").unwrap().is_empty());
        assert!(search_patients(&conn, "_").unwrap().is_empty());

        seed_patient(&conn, "Ann_e", "Lee");
        let hits = search_patients(&conn, "_").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Ann_e");
    }

    #[test]
    fn find_by_name_ignores_case() {
        let conn = open_memory_database().unwrap();
        let jane = seed_patient(&conn, "Jane", "Doe");
        let found = find_patient_by_name(&conn, "  jane DOE ").unwrap().unwrap();
        assert_eq!(found.id, jane.id);
        assert!(find_patient_by_name(&conn, "Jane Smith").unwrap().is_none());
    }

    #[test]
    fn list_and_count_agree() {
        let conn = open_memory_database().unwrap();
        seed_patient(&conn, "Jane", "Doe");
        seed_patient(&conn, "John", "Smith");
        assert_eq!(list_patients(&conn).unwrap().len(), 2);
        assert_eq!(count_patients(&conn).unwrap(), 2);
    }
}

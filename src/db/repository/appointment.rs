use rusqlite::{params, Connection, OptionalExtension};

use super::{enum_column, format_timestamp, not_found, timestamp_column};
use crate::db::{in_transaction, DatabaseError};
use crate::models::{Appointment, AppointmentStatus};

const APPOINTMENT_COLUMNS: &str = "id, patient_id, doctor_id, appointment_date, status, notes";

pub fn insert_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<Appointment, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, appointment_date, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            appointment.patient_id,
            appointment.doctor_id,
            format_timestamp(&appointment.appointment_date),
            appointment.status.as_str(),
            appointment.notes,
        ],
    )?;
    Ok(Appointment {
        id: conn.last_insert_rowid(),
        ..appointment.clone()
    })
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_appointment)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY appointment_date, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn list_appointments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_id = ?1 ORDER BY appointment_date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id], row_to_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn list_appointments_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE doctor_id = ?1 ORDER BY appointment_date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id], row_to_appointment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn update_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<Appointment, DatabaseError> {
    let affected = conn.execute(
        "UPDATE appointments
         SET patient_id = ?2, doctor_id = ?3, appointment_date = ?4, status = ?5, notes = ?6
         WHERE id = ?1",
        params![
            appointment.id,
            appointment.patient_id,
            appointment.doctor_id,
            format_timestamp(&appointment.appointment_date),
            appointment.status.as_str(),
            appointment.notes,
        ],
    )?;
    if affected == 0 {
        return Err(not_found("appointment", appointment.id));
    }
    Ok(appointment.clone())
}

pub fn set_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> Result<Appointment, DatabaseError> {
    let affected = conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if affected == 0 {
        return Err(not_found("appointment", id));
    }
    get_appointment(conn, id)?.ok_or_else(|| not_found("appointment", id))
}

/// Delete one appointment, detaching any prescription written against it.
/// Returns whether the appointment existed.
pub fn delete_appointment(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    in_transaction(conn, |tx| {
        tx.execute(
            "UPDATE prescriptions SET appointment_id = NULL WHERE appointment_id = ?1",
            params![id],
        )?;
        let affected = tx.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}

pub fn count_appointments(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
    Ok(count)
}

fn row_to_appointment(row: &rusqlite::Row) -> Result<Appointment, rusqlite::Error> {
    Ok(Appointment {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        appointment_date: timestamp_column(row, 3)?,
        status: enum_column(row, 4)?,
        notes: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_list_per_owner() {
        let conn = open_memory_database().unwrap();
        let jane = seed_patient(&conn, "Jane", "Doe");
        let john = seed_patient(&conn, "John", "Smith");
        let house = seed_doctor(&conn, "Gregory", "House");
        let wilson = seed_doctor(&conn, "James", "Wilson");

        seed_appointment(&conn, jane.id, house.id);
        seed_appointment(&conn, jane.id, wilson.id);
        seed_appointment(&conn, john.id, house.id);

        assert_eq!(list_appointments(&conn).unwrap().len(), 3);
        assert_eq!(list_appointments_for_patient(&conn, jane.id).unwrap().len(), 2);
        assert_eq!(list_appointments_for_doctor(&conn, house.id).unwrap().len(), 2);
        assert_eq!(list_appointments_for_doctor(&conn, wilson.id).unwrap().len(), 1);
    }

    #[test]
    fn status_transitions_persist() {
        let conn = open_memory_database().unwrap();
        let jane = seed_patient(&conn, "Jane", "Doe");
        let house = seed_doctor(&conn, "Gregory", "House");
        let appt = seed_appointment(&conn, jane.id, house.id);

        let cancelled = set_appointment_status(&conn, appt.id, AppointmentStatus::Cancelled).unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(
            get_appointment(&conn, appt.id).unwrap().unwrap().status,
            AppointmentStatus::Cancelled
        );
    }

    #[test]
    fn status_change_on_missing_is_not_found() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            set_appointment_status(&conn, 5, AppointmentStatus::Completed),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn appointment_for_unknown_patient_is_rejected() {
        let conn = open_memory_database().unwrap();
        let house = seed_doctor(&conn, "Gregory", "House");
        let result = insert_appointment(
            &conn,
            &Appointment {
                id: 0,
                patient_id: 999,
                doctor_id: house.id,
                appointment_date: ts("2024-05-06 10:30:00"),
                status: AppointmentStatus::Scheduled,
                notes: None,
            },
        );
        assert!(result.is_err());
        assert_eq!(count_appointments(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_detaches_prescriptions_first() {
        let conn = open_memory_database().unwrap();
        let jane = seed_patient(&conn, "Jane", "Doe");
        let house = seed_doctor(&conn, "Gregory", "House");
        let appt = seed_appointment(&conn, jane.id, house.id);
        conn.execute(
            "INSERT INTO prescriptions (patient_id, doctor_id, appointment_id, prescription_date)
             VALUES (?1, ?2, ?3, '2024-05-06 11:00:00')",
            params![jane.id, house.id, appt.id],
        )
        .unwrap();

        assert!(delete_appointment(&conn, appt.id).unwrap());
        let detached: Option<i64> = conn
            .query_row("SELECT appointment_id FROM prescriptions", [], |row| row.get(0))
            .unwrap();
        assert!(detached.is_none());
        assert!(!delete_appointment(&conn, appt.id).unwrap());
    }
}

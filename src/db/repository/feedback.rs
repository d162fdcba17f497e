use rusqlite::{params, Connection};

use super::{format_timestamp, timestamp_column};
use crate::db::DatabaseError;
use crate::models::PatientFeedback;

pub fn insert_feedback(
    conn: &Connection,
    feedback: &PatientFeedback,
) -> Result<PatientFeedback, DatabaseError> {
    conn.execute(
        "INSERT INTO patient_feedback (patient_id, rating, comments, feedback_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            feedback.patient_id,
            feedback.rating,
            feedback.comments,
            format_timestamp(&feedback.feedback_date),
        ],
    )?;
    Ok(PatientFeedback {
        id: conn.last_insert_rowid(),
        ..feedback.clone()
    })
}

/// All feedback, newest first.
pub fn list_feedback(conn: &Connection) -> Result<Vec<PatientFeedback>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, rating, comments, feedback_date
         FROM patient_feedback ORDER BY feedback_date DESC, id DESC",
    )?;
    let rows = stmt.query_map([], row_to_feedback)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn list_feedback_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<PatientFeedback>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, rating, comments, feedback_date
         FROM patient_feedback WHERE patient_id = ?1
         ORDER BY feedback_date DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![patient_id], row_to_feedback)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_feedback(row: &rusqlite::Row) -> Result<PatientFeedback, rusqlite::Error> {
    Ok(PatientFeedback {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        rating: row.get(2)?,
        comments: row.get(3)?,
        feedback_date: timestamp_column(row, 4)?,
    })
}

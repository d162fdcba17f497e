//! Cascade deletion for doctors and patients.
//!
//! Dependents go first, then the owning row, all inside one transaction.
//! Prescriptions owned by someone else but attached to one of the
//! removed appointments are detached rather than deleted.

use rusqlite::{params, Connection, Transaction};
use serde::Serialize;

use crate::db::{in_transaction, DatabaseError};

/// Rows touched by one cascade, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub feedback: usize,
    pub prescription_items: usize,
    pub prescriptions: usize,
    pub detached_prescriptions: usize,
    pub appointments: usize,
    /// Whether the doctor or patient row itself existed.
    pub removed: bool,
}

#[derive(Debug, Clone, Copy)]
enum Owner {
    Doctor,
    Patient,
}

impl Owner {
    fn table(self) -> &'static str {
        match self {
            Owner::Doctor => "doctors",
            Owner::Patient => "patients",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Owner::Doctor => "doctor_id",
            Owner::Patient => "patient_id",
        }
    }
}

/// Remove a doctor with their prescriptions and appointments.
///
/// A missing id is a successful no-op.
pub fn delete_doctor_cascade(conn: &Connection, id: i64) -> Result<CascadeReport, DatabaseError> {
    let report = in_transaction(conn, |tx| delete_owned_rows(tx, Owner::Doctor, id))?;
    tracing::info!(doctor_id = id, ?report, "Doctor cascade committed");
    Ok(report)
}

/// Remove a patient with their feedback, prescriptions and appointments.
///
/// A missing id is a successful no-op.
pub fn delete_patient_cascade(
    conn: &Connection,
    id: i64,
) -> Result<CascadeReport, DatabaseError> {
    let report = in_transaction(conn, |tx| delete_owned_rows(tx, Owner::Patient, id))?;
    tracing::info!(patient_id = id, ?report, "Patient cascade committed");
    Ok(report)
}

fn delete_owned_rows(
    tx: &Transaction<'_>,
    owner: Owner,
    id: i64,
) -> Result<CascadeReport, DatabaseError> {
    let column = owner.column();
    let mut report = CascadeReport::default();

    if let Owner::Patient = owner {
        report.feedback = tx.execute(
            "DELETE FROM patient_feedback WHERE patient_id = ?1",
            params![id],
        )?;
    }

    report.prescription_items = tx.execute(
        &format!(
            "DELETE FROM prescription_items
             WHERE prescription_id IN (SELECT id FROM prescriptions WHERE {column} = ?1)"
        ),
        params![id],
    )?;
    report.prescriptions = tx.execute(
        &format!("DELETE FROM prescriptions WHERE {column} = ?1"),
        params![id],
    )?;
    report.detached_prescriptions = tx.execute(
        &format!(
            "UPDATE prescriptions SET appointment_id = NULL
             WHERE appointment_id IN (SELECT id FROM appointments WHERE {column} = ?1)"
        ),
        params![id],
    )?;
    report.appointments = tx.execute(
        &format!("DELETE FROM appointments WHERE {column} = ?1"),
        params![id],
    )?;
    report.removed = tx.execute(
        &format!("DELETE FROM {} WHERE id = ?1", owner.table()),
        params![id],
    )? > 0;

    Ok(report)
}

//! Prescription aggregate: a header row plus its `prescription_items`.
//!
//! Every write runs in one transaction. A failed item insert rolls the
//! header back with it, so readers never see a header with a partial
//! item set.

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::{format_timestamp, not_found, timestamp_column};
use crate::db::{in_transaction, DatabaseError};
use crate::models::{Prescription, PrescriptionItem};

const HEADER_COLUMNS: &str =
    "id, patient_id, doctor_id, appointment_id, notes, prescription_date";

// ═══════════════════════════════════════════════════════════
// Writes
// ═══════════════════════════════════════════════════════════

/// Insert header and items. Returns the stored aggregate with every id assigned.
pub fn create_prescription(
    conn: &Connection,
    prescription: &Prescription,
) -> Result<Prescription, DatabaseError> {
    let stored = in_transaction(conn, |tx| -> Result<Prescription, DatabaseError> {
        tx.execute(
            "INSERT INTO prescriptions (patient_id, doctor_id, appointment_id, notes, prescription_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                prescription.patient_id,
                prescription.doctor_id,
                prescription.appointment_id,
                prescription.notes,
                format_timestamp(&prescription.prescription_date),
            ],
        )?;
        let id = tx.last_insert_rowid();
        insert_items(tx, id, &prescription.items)?;
        load_prescription(tx, id)?.ok_or_else(|| not_found("prescription", id))
    })?;

    tracing::debug!(
        prescription_id = stored.id,
        items = stored.items.len(),
        "Prescription created"
    );
    Ok(stored)
}

/// Replace header fields and the whole item set.
pub fn update_prescription(
    conn: &Connection,
    prescription: &Prescription,
) -> Result<Prescription, DatabaseError> {
    let id = prescription.id;
    let stored = in_transaction(conn, |tx| -> Result<Prescription, DatabaseError> {
        let affected = tx.execute(
            "UPDATE prescriptions
             SET patient_id = ?2, doctor_id = ?3, appointment_id = ?4, notes = ?5, prescription_date = ?6
             WHERE id = ?1",
            params![
                id,
                prescription.patient_id,
                prescription.doctor_id,
                prescription.appointment_id,
                prescription.notes,
                format_timestamp(&prescription.prescription_date),
            ],
        )?;
        if affected == 0 {
            return Err(not_found("prescription", id));
        }
        tx.execute(
            "DELETE FROM prescription_items WHERE prescription_id = ?1",
            params![id],
        )?;
        insert_items(tx, id, &prescription.items)?;
        load_prescription(tx, id)?.ok_or_else(|| not_found("prescription", id))
    })?;

    tracing::debug!(prescription_id = id, items = stored.items.len(), "Prescription updated");
    Ok(stored)
}

/// Delete items then header. Returns whether the header existed.
pub fn delete_prescription(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    in_transaction(conn, |tx| {
        tx.execute(
            "DELETE FROM prescription_items WHERE prescription_id = ?1",
            params![id],
        )?;
        let affected = tx.execute("DELETE FROM prescriptions WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}

fn insert_items(
    tx: &Transaction<'_>,
    prescription_id: i64,
    items: &[PrescriptionItem],
) -> Result<(), DatabaseError> {
    let mut stmt = tx.prepare(
        "INSERT INTO prescription_items (prescription_id, inventory_id, quantity, dosage_instructions)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for item in items {
        stmt.execute(params![
            prescription_id,
            item.inventory_id,
            item.quantity,
            item.dosage_instructions,
        ])?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// Reads
// ═══════════════════════════════════════════════════════════

pub fn get_prescription(conn: &Connection, id: i64) -> Result<Option<Prescription>, DatabaseError> {
    load_prescription(conn, id)
}

/// Every prescription, newest first.
pub fn list_prescriptions(conn: &Connection) -> Result<Vec<Prescription>, DatabaseError> {
    let sql = format!(
        "SELECT {HEADER_COLUMNS} FROM prescriptions ORDER BY prescription_date DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let headers = stmt
        .query_map([], row_to_header)?
        .collect::<Result<Vec<_>, _>>()?;
    with_items(conn, headers)
}

pub fn list_prescriptions_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Prescription>, DatabaseError> {
    let sql = format!(
        "SELECT {HEADER_COLUMNS} FROM prescriptions
         WHERE patient_id = ?1
         ORDER BY prescription_date DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let headers = stmt
        .query_map(params![patient_id], row_to_header)?
        .collect::<Result<Vec<_>, _>>()?;
    with_items(conn, headers)
}

fn load_prescription(conn: &Connection, id: i64) -> Result<Option<Prescription>, DatabaseError> {
    let sql = format!("SELECT {HEADER_COLUMNS} FROM prescriptions WHERE id = ?1");
    let header = conn.query_row(&sql, params![id], row_to_header).optional()?;
    match header {
        Some(mut prescription) => {
            prescription.items = list_items(conn, id)?;
            Ok(Some(prescription))
        }
        None => Ok(None),
    }
}

fn with_items(
    conn: &Connection,
    headers: Vec<Prescription>,
) -> Result<Vec<Prescription>, DatabaseError> {
    headers
        .into_iter()
        .map(|mut prescription| {
            prescription.items = list_items(conn, prescription.id)?;
            Ok(prescription)
        })
        .collect()
}

/// Items in insertion order, with the inventory name joined in.
fn list_items(
    conn: &Connection,
    prescription_id: i64,
) -> Result<Vec<PrescriptionItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT pi.id, pi.prescription_id, pi.inventory_id, pi.quantity,
                pi.dosage_instructions, mi.item_name
         FROM prescription_items pi
         LEFT JOIN medical_inventory mi ON mi.id = pi.inventory_id
         WHERE pi.prescription_id = ?1
         ORDER BY pi.id",
    )?;
    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok(PrescriptionItem {
            id: row.get(0)?,
            prescription_id: row.get(1)?,
            inventory_id: row.get(2)?,
            quantity: row.get(3)?,
            dosage_instructions: row.get(4)?,
            medicine_name: row.get(5)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_header(row: &rusqlite::Row) -> Result<Prescription, rusqlite::Error> {
    Ok(Prescription {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        appointment_id: row.get(3)?,
        notes: row.get(4)?,
        prescription_date: timestamp_column(row, 5)?,
        items: Vec::new(),
    })
}

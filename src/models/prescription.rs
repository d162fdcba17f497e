use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Prescription header plus its owned line items.
///
/// The header and the items are written and removed as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub notes: Option<String>,
    pub prescription_date: NaiveDateTime,
    pub items: Vec<PrescriptionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionItem {
    pub id: i64,
    pub prescription_id: i64,
    pub inventory_id: i64,
    pub quantity: i64,
    pub dosage_instructions: String,
    /// Joined from inventory on read; ignored on write.
    #[serde(default)]
    pub medicine_name: Option<String>,
}

impl PrescriptionItem {
    /// Unsaved line item for `inventory_id`.
    pub fn new(inventory_id: i64, quantity: i64, dosage_instructions: impl Into<String>) -> Self {
        Self {
            id: 0,
            prescription_id: 0,
            inventory_id,
            quantity,
            dosage_instructions: dosage_instructions.into(),
            medicine_name: None,
        }
    }
}

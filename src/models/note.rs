use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form clinical note kept in the document store.
///
/// Serialised field names match the stored document shape
/// `{id, patientId, category, createdAt, content}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientNote {
    pub id: String,
    pub patient_id: i64,
    pub category: String,
    pub created_at: NaiveDateTime,
    pub content: BTreeMap<String, String>,
}

impl PatientNote {
    pub fn new(
        patient_id: i64,
        category: impl Into<String>,
        content: BTreeMap<String, String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            patient_id,
            category: category.into(),
            created_at,
            content,
        }
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Username given to the credential-less patient session.
pub const SYNTHETIC_PATIENT_USERNAME: &str = "Patient";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Links to the doctor or patient row this account acts for.
    pub reference_id: Option<i64>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl User {
    /// Non-persisted patient-role user for the patient kiosk login.
    pub fn synthetic_patient(now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            username: SYNTHETIC_PATIENT_USERNAME.into(),
            password_hash: String::new(),
            role: Role::Patient,
            reference_id: None,
            is_active: true,
            created_at: now,
            last_login: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

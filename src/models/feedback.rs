use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFeedback {
    pub id: i64,
    pub patient_id: i64,
    /// 1 to 5 inclusive.
    pub rating: u8,
    pub comments: Option<String>,
    pub feedback_date: NaiveDateTime,
}

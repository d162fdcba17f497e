use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::cache::Cached;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }
}

impl Cached for Doctor {
    fn cache_key(&self) -> i64 {
        self.id
    }
}

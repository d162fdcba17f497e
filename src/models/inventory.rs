use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::cache::Cached;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub last_updated: NaiveDateTime,
}

impl Cached for InventoryItem {
    fn cache_key(&self) -> i64 {
        self.id
    }
}

use rusqlite::{params, Connection, OptionalExtension};

use super::{format_timestamp, not_found, now_timestamp, timestamp_column};
use crate::db::DatabaseError;
use crate::models::InventoryItem;

const INVENTORY_COLUMNS: &str = "id, item_name, category, quantity, unit_price, last_updated";

pub fn insert_inventory_item(
    conn: &Connection,
    item: &InventoryItem,
) -> Result<InventoryItem, DatabaseError> {
    conn.execute(
        "INSERT INTO medical_inventory (item_name, category, quantity, unit_price, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.item_name,
            item.category,
            item.quantity,
            item.unit_price,
            format_timestamp(&item.last_updated),
        ],
    )?;
    Ok(InventoryItem {
        id: conn.last_insert_rowid(),
        ..item.clone()
    })
}

pub fn get_inventory_item(
    conn: &Connection,
    id: i64,
) -> Result<Option<InventoryItem>, DatabaseError> {
    let sql = format!("SELECT {INVENTORY_COLUMNS} FROM medical_inventory WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_inventory_item)
        .optional()
        .map_err(DatabaseError::from)
}

pub fn list_inventory(conn: &Connection) -> Result<Vec<InventoryItem>, DatabaseError> {
    let sql = format!("SELECT {INVENTORY_COLUMNS} FROM medical_inventory ORDER BY item_name, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_inventory_item)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Overwrite the item and stamp `last_updated` with the current time.
pub fn update_inventory_item(
    conn: &Connection,
    item: &InventoryItem,
) -> Result<InventoryItem, DatabaseError> {
    let affected = conn.execute(
        "UPDATE medical_inventory
         SET item_name = ?2, category = ?3, quantity = ?4, unit_price = ?5, last_updated = ?6
         WHERE id = ?1",
        params![
            item.id,
            item.item_name,
            item.category,
            item.quantity,
            item.unit_price,
            format_timestamp(&now_timestamp()),
        ],
    )?;
    if affected == 0 {
        return Err(not_found("inventory_item", item.id));
    }
    get_inventory_item(conn, item.id)?.ok_or_else(|| not_found("inventory_item", item.id))
}

/// Fails on the foreign key while a prescription item still references the row.
pub fn delete_inventory_item(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM medical_inventory WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

fn row_to_inventory_item(row: &rusqlite::Row) -> Result<InventoryItem, rusqlite::Error> {
    Ok(InventoryItem {
        id: row.get(0)?,
        item_name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: row.get(4)?,
        last_updated: timestamp_column(row, 5)?,
    })
}

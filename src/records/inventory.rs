use super::{Records, RecordsError};
use crate::authorization::Capability;
use crate::db::repository::{
    delete_inventory_item, get_inventory_item, insert_inventory_item, list_inventory,
    now_timestamp, update_inventory_item,
};
use crate::models::InventoryItem;
use crate::session::Session;
use crate::validation::validate_inventory_item;

impl Records {
    /// Insert a stock item with `last_updated` set to now.
    pub fn add_inventory_item(
        &self,
        session: &Session,
        item: &InventoryItem,
    ) -> Result<InventoryItem, RecordsError> {
        session.require(Capability::ManageInventory)?;
        validate_inventory_item(item)?;
        self.recorder.record("Add Inventory Item", || {
            self.inventory.write_then_put(|| {
                let conn = self.connect()?;
                let stamped = InventoryItem {
                    last_updated: now_timestamp(),
                    ..item.clone()
                };
                Ok(insert_inventory_item(&conn, &stamped)?)
            })
        })
    }

    pub fn get_inventory_item(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<InventoryItem, RecordsError> {
        self.run(session, Capability::ViewInventory, "Get Inventory Item", || {
            self.inventory
                .get_or_load(id, || {
                    let conn = self.connect()?;
                    Ok::<_, RecordsError>(get_inventory_item(&conn, id)?)
                })?
                .ok_or_else(|| RecordsError::not_found("inventory item", id))
        })
    }

    /// Full reload, ordered by item name.
    pub fn list_inventory(&self, session: &Session) -> Result<Vec<InventoryItem>, RecordsError> {
        self.run(session, Capability::ViewInventory, "Load All Inventory", || {
            self.inventory.refresh_all(|| {
                let conn = self.connect()?;
                Ok(list_inventory(&conn)?)
            })
        })
    }

    /// Store the new values; `last_updated` is stamped by the store.
    pub fn update_inventory_item(
        &self,
        session: &Session,
        item: &InventoryItem,
    ) -> Result<InventoryItem, RecordsError> {
        session.require(Capability::ManageInventory)?;
        validate_inventory_item(item)?;
        self.recorder.record("Update Inventory Item", || {
            self.inventory.write_then_put(|| {
                let conn = self.connect()?;
                Ok(update_inventory_item(&conn, item)?)
            })
        })
    }

    /// Fails with a storage error while prescription items still reference it.
    pub fn delete_inventory_item(&self, session: &Session, id: i64) -> Result<bool, RecordsError> {
        self.run(session, Capability::ManageInventory, "Delete Inventory Item", || {
            self.inventory.write_then_invalidate(id, || {
                let conn = self.connect()?;
                Ok(delete_inventory_item(&conn, id)?)
            })
        })
    }
}

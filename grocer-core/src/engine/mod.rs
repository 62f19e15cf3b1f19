//! The consistency engine.
//!
//! [`GroceryEngine`] owns the catalog and every shopping list. All changes
//! go through its methods (or [`GroceryEngine::dispatch`]), which keep line
//! items consistent with the catalog and write the result through a
//! [`Persistence`] adapter. A failed write restores the state from before
//! the call and returns [`GroceryError::PersistenceFailure`].

mod intent;
mod transaction;

use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub use intent::{Intent, Outcome};
use transaction::Transaction;

use crate::error::{EntityKind, GroceryError};
use crate::models::{AppData, Catalog, Direction, LineItem, ShoppingList};
use crate::persistence::{ChangeEvent, DocType, Persistence};
use crate::stores::{ItemEdit, ListStore};

/// Name of the store created in an empty catalog on first start.
pub const SEED_STORE_NAME: &str = "Market";

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Name of the category every new store starts with.
    pub default_category: String,
    /// Name of the list created when no active list exists.
    pub default_list_name: String,
    /// Add one store to an empty catalog at load time.
    pub seed_catalog: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_category: "General".to_string(),
            default_list_name: "My First List".to_string(),
            seed_catalog: false,
        }
    }
}

/// A write the engine owes the adapter after a change.
#[derive(Debug, Clone, PartialEq)]
enum PersistOp {
    Catalog,
    List(String),
    Archive(String),
    Restore(String),
    DeleteArchived(String),
    ReplaceAll,
}

/// Message returned by the copy operation.
pub fn copy_message(items_copied: usize) -> String {
    if items_copied == 0 {
        "No new items to copy.".to_string()
    } else {
        format!("Successfully copied {} item(s).", items_copied)
    }
}

pub struct GroceryEngine<P: Persistence> {
    catalog: Catalog,
    lists: ListStore,
    persistence: P,
    options: EngineOptions,
}

impl<P: Persistence> GroceryEngine<P> {
    /// Loads state from the adapter and makes it usable: legacy line items
    /// are repaired, an empty catalog is optionally seeded, and a default
    /// list is created when there is no active list.
    pub fn load(mut persistence: P, options: EngineOptions) -> Result<Self, GroceryError> {
        let loaded = persistence.load_all()?;
        let mut catalog = loaded.data.master_stores;
        let mut lists = ListStore::new(loaded.data.lists, loaded.data.archived_lists);
        let mut ops = Vec::new();

        let repaired = lists.repair();
        if !repaired.is_empty() {
            warn!(lists = ?repaired, "Repaired legacy line item ids");
            ops.extend(repaired.into_iter().map(PersistOp::List));
        }

        if options.seed_catalog && catalog.is_empty() {
            catalog.seed(SEED_STORE_NAME, &options.default_category)?;
            info!(store = SEED_STORE_NAME, "Seeded empty catalog");
            ops.push(PersistOp::Catalog);
        }

        if let Some(id) = lists.ensure_active(&options.default_list_name) {
            info!(list_id = %id, "Created default list");
            ops.push(PersistOp::List(id));
        }

        if let Some(remembered) = loaded.active_list_id.as_deref() {
            if lists.select(remembered).is_err() {
                debug!(list_id = remembered, "Remembered list is no longer active");
            }
        }

        let mut engine = Self {
            catalog,
            lists,
            persistence,
            options,
        };
        for op in &ops {
            engine.run_op(op)?;
        }
        info!(
            stores = engine.catalog.stores().len(),
            lists = engine.lists.lists().len(),
            archived = engine.lists.archived_lists().len(),
            "Loaded grocery data"
        );
        Ok(engine)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    pub fn active_list(&self) -> Option<&ShoppingList> {
        self.lists.active()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    /// Snapshot of the full state in export shape.
    pub fn export_data(&self) -> AppData {
        AppData {
            lists: self.lists.lists().to_vec(),
            archived_lists: self.lists.archived_lists().to_vec(),
            master_stores: self.catalog.clone(),
        }
    }

    /// Changes pushed by the adapter. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.persistence.subscribe()
    }

    fn run_op(&mut self, op: &PersistOp) -> Result<(), crate::persistence::PersistenceError> {
        match op {
            PersistOp::Catalog => self.persistence.save_catalog(&self.catalog),
            PersistOp::List(id) => match self.lists.any_list(id) {
                Some(list) => self.persistence.save_list(list),
                None => Ok(()),
            },
            PersistOp::Archive(id) => match self.lists.archived_list(id) {
                Some(list) => self.persistence.archive_list(list),
                None => Ok(()),
            },
            PersistOp::Restore(id) => match self.lists.list(id) {
                Some(list) => self.persistence.restore_list(list),
                None => Ok(()),
            },
            PersistOp::DeleteArchived(id) => self.persistence.delete_archived_list(id),
            PersistOp::ReplaceAll => {
                let data = self.export_data();
                self.persistence.replace_all(&data)
            }
        }
    }

    /// Runs the writes for a change, undoing the change if any fails.
    fn commit(&mut self, tx: Transaction, ops: Vec<PersistOp>) -> Result<(), GroceryError> {
        for (done, op) in ops.iter().enumerate() {
            if let Err(e) = self.run_op(op) {
                error!(error = %e, op = ?op, "Persistence failed, rolling back");
                if done > 0 {
                    warn!(written = ?&ops[..done], "Earlier writes of this change were kept by storage");
                }
                tx.rollback(&mut self.catalog, &mut self.lists);
                return Err(GroceryError::PersistenceFailure(e));
            }
        }
        Ok(())
    }

    fn remember_active(&mut self) {
        if let Some(id) = self.lists.active_id().map(str::to_string) {
            if let Err(e) = self.persistence.save_active_list_id(&id) {
                warn!(error = %e, "Could not remember selected list");
            }
        }
    }

    fn list_ops(ids: Vec<String>) -> impl Iterator<Item = PersistOp> {
        ids.into_iter().map(PersistOp::List)
    }

    // Catalog

    pub fn add_store(&mut self, name: &str) -> Result<String, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let id = self.catalog.add_store(name, &self.options.default_category)?;
        self.commit(tx, vec![PersistOp::Catalog])?;
        info!(store_id = %id, "Added store");
        Ok(id)
    }

    pub fn rename_store(&mut self, store_id: &str, name: &str) -> Result<(), GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        self.catalog.rename_store(store_id, name)?;
        self.commit(tx, vec![PersistOp::Catalog])
    }

    /// Deletes a store and every line item pointing into it.
    pub fn delete_store(&mut self, store_id: &str) -> Result<(), GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog).lists(&self.lists);
        let store = self.catalog.delete_store(store_id)?;
        let item_ids: HashSet<String> = store
            .categories
            .iter()
            .flat_map(|c| c.items.iter().map(|i| i.id.clone()))
            .collect();
        let touched = self
            .lists
            .remove_matching(|li| li.store_id == store.id || item_ids.contains(&li.item_id));

        let mut ops = vec![PersistOp::Catalog];
        ops.extend(Self::list_ops(touched));
        self.commit(tx, ops)?;
        info!(store_id, "Deleted store");
        Ok(())
    }

    pub fn move_store(&mut self, store_id: &str, direction: Direction) -> Result<bool, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let moved = self.catalog.move_store(store_id, direction)?;
        if moved {
            self.commit(tx, vec![PersistOp::Catalog])?;
        }
        Ok(moved)
    }

    pub fn add_category(&mut self, store_id: &str, name: &str) -> Result<String, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let id = self.catalog.add_category(store_id, name)?;
        self.commit(tx, vec![PersistOp::Catalog])?;
        Ok(id)
    }

    pub fn rename_category(
        &mut self,
        store_id: &str,
        category_id: &str,
        name: &str,
    ) -> Result<(), GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        self.catalog.rename_category(store_id, category_id, name)?;
        self.commit(tx, vec![PersistOp::Catalog])
    }

    /// Deletes a category and every line item pointing into it. A store's
    /// last category cannot be deleted.
    pub fn delete_category(&mut self, store_id: &str, category_id: &str) -> Result<(), GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog).lists(&self.lists);
        let category = self.catalog.delete_category(store_id, category_id)?;
        let item_ids: HashSet<String> = category.items.iter().map(|i| i.id.clone()).collect();
        let touched = self.lists.remove_matching(|li| {
            li.in_group(store_id, &category.id) || item_ids.contains(&li.item_id)
        });

        let mut ops = vec![PersistOp::Catalog];
        ops.extend(Self::list_ops(touched));
        self.commit(tx, ops)?;
        info!(store_id, category_id, "Deleted category");
        Ok(())
    }

    pub fn move_category(
        &mut self,
        store_id: &str,
        category_id: &str,
        direction: Direction,
    ) -> Result<bool, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let moved = self.catalog.move_category(store_id, category_id, direction)?;
        if moved {
            self.commit(tx, vec![PersistOp::Catalog])?;
        }
        Ok(moved)
    }

    pub fn add_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        name: &str,
    ) -> Result<String, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let item = self.catalog.add_item(store_id, category_id, name)?;
        self.commit(tx, vec![PersistOp::Catalog])?;
        debug!(item_id = %item.id, "Added item");
        Ok(item.id)
    }

    /// Renames and/or moves an item, carrying the change into every line
    /// item derived from it on active and archived lists.
    pub fn edit_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
        name: &str,
        new_store_id: Option<&str>,
        new_category_id: Option<&str>,
    ) -> Result<ItemEdit, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog).lists(&self.lists);
        let edit = self.catalog.edit_item(
            store_id,
            category_id,
            item_id,
            name,
            new_store_id,
            new_category_id,
        )?;
        if !edit.changed() {
            return Ok(edit);
        }
        let touched = self.lists.propagate_edit(&edit);
        debug!(item_id, lists = touched.len(), "Propagated item edit");

        let mut ops = vec![PersistOp::Catalog];
        ops.extend(Self::list_ops(touched));
        self.commit(tx, ops)?;
        Ok(edit)
    }

    /// Deletes an item and every line item derived from it.
    pub fn delete_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
    ) -> Result<(), GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog).lists(&self.lists);
        let item = self.catalog.delete_item(store_id, category_id, item_id)?;
        let touched = self.lists.remove_matching(|li| li.item_id == item.id);

        let mut ops = vec![PersistOp::Catalog];
        ops.extend(Self::list_ops(touched));
        self.commit(tx, ops)
    }

    pub fn move_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
        direction: Direction,
    ) -> Result<bool, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let moved = self
            .catalog
            .move_item(store_id, category_id, item_id, direction)?;
        if moved {
            self.commit(tx, vec![PersistOp::Catalog])?;
        }
        Ok(moved)
    }

    pub fn duplicate_item(
        &mut self,
        source_store_id: &str,
        source_category_id: &str,
        item_id: &str,
        dest_store_id: &str,
        dest_category_id: &str,
    ) -> Result<String, GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog);
        let item = self.catalog.duplicate_item(
            source_store_id,
            source_category_id,
            item_id,
            dest_store_id,
            dest_category_id,
        )?;
        self.commit(tx, vec![PersistOp::Catalog])?;
        Ok(item.id)
    }

    // Lists

    /// Creates a list and makes it the active one.
    pub fn create_list(&mut self, name: &str) -> Result<String, GroceryError> {
        let tx = Transaction::new().lists(&self.lists);
        let id = self.lists.create(name)?;
        self.commit(tx, vec![PersistOp::List(id.clone())])?;
        self.remember_active();
        info!(list_id = %id, "Created list");
        Ok(id)
    }

    pub fn select_list(&mut self, list_id: &str) -> Result<(), GroceryError> {
        self.lists.select(list_id)?;
        self.remember_active();
        Ok(())
    }

    /// Archives an active list. The last active list cannot be archived.
    pub fn archive_list(&mut self, list_id: &str) -> Result<(), GroceryError> {
        let tx = Transaction::new().lists(&self.lists);
        self.lists.archive(list_id)?;
        self.commit(tx, vec![PersistOp::Archive(list_id.to_string())])?;
        self.remember_active();
        info!(list_id, "Archived list");
        Ok(())
    }

    /// Restores an archived list and makes it the active one.
    pub fn restore_list(&mut self, list_id: &str) -> Result<(), GroceryError> {
        let tx = Transaction::new().lists(&self.lists);
        self.lists.restore(list_id)?;
        self.commit(tx, vec![PersistOp::Restore(list_id.to_string())])?;
        self.remember_active();
        info!(list_id, "Restored list");
        Ok(())
    }

    /// Permanently deletes an archived list.
    pub fn delete_archived_list(&mut self, list_id: &str) -> Result<(), GroceryError> {
        let tx = Transaction::new().lists(&self.lists);
        self.lists.delete_archived(list_id)?;
        self.commit(tx, vec![PersistOp::DeleteArchived(list_id.to_string())])?;
        info!(list_id, "Deleted archived list");
        Ok(())
    }

    fn active_list_id(&self) -> Result<String, GroceryError> {
        self.lists
            .active_id()
            .map(str::to_string)
            .ok_or_else(|| GroceryError::InvariantViolation("No active list".to_string()))
    }

    fn snapshot_list(&self, list_id: &str) -> Result<Transaction, GroceryError> {
        let list = self
            .lists
            .list(list_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::List, list_id))?;
        Ok(Transaction::new().list(list))
    }

    /// Adds a catalog item to the active list.
    ///
    /// Adding an item that is already on the list returns
    /// [`GroceryError::DuplicateEntry`] and changes nothing.
    pub fn add_item_to_active_list(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
    ) -> Result<LineItem, GroceryError> {
        let item = self
            .catalog
            .item(store_id, category_id, item_id)
            .cloned()
            .ok_or_else(|| GroceryError::not_found(EntityKind::Item, item_id))?;
        let list_id = self.active_list_id()?;
        let tx = self.snapshot_list(&list_id)?;
        let line_item = self
            .lists
            .add_line_item(&list_id, store_id, category_id, &item)?;
        self.commit(tx, vec![PersistOp::List(list_id)])?;
        Ok(line_item)
    }

    /// Removes one line item by its own id. A missing id is reported as
    /// `NotFound` but is expected from stale views.
    pub fn remove_line_item(&mut self, list_id: &str, line_item_id: &str) -> Result<(), GroceryError> {
        let tx = self.snapshot_list(list_id)?;
        match self.lists.remove_line_item(list_id, line_item_id) {
            Ok(_) => self.commit(tx, vec![PersistOp::List(list_id.to_string())]),
            Err(e) => {
                warn!(list_id, line_item_id, "Line item already removed");
                Err(e)
            }
        }
    }

    /// Flips a line item's checked flag, returning the new value.
    pub fn toggle_checked(&mut self, list_id: &str, line_item_id: &str) -> Result<bool, GroceryError> {
        let tx = self.snapshot_list(list_id)?;
        let checked = self.lists.toggle_checked(list_id, line_item_id)?;
        self.commit(tx, vec![PersistOp::List(list_id.to_string())])?;
        Ok(checked)
    }

    /// Sets the display order of one store+category group on a list.
    pub fn reorder_within_group(
        &mut self,
        list_id: &str,
        store_id: &str,
        category_id: &str,
        ordered_line_item_ids: &[String],
    ) -> Result<usize, GroceryError> {
        let tx = self.snapshot_list(list_id)?;
        let count =
            self.lists
                .reorder_within_group(list_id, store_id, category_id, ordered_line_item_ids)?;
        self.commit(tx, vec![PersistOp::List(list_id.to_string())])?;
        Ok(count)
    }

    /// Copies line items whose catalog item is not on the destination yet.
    /// Returns how many were copied; zero is not an error.
    pub fn copy_items(&mut self, source_id: &str, destination_id: &str) -> Result<usize, GroceryError> {
        let tx = match self.lists.list(destination_id) {
            Some(list) => Transaction::new().list(list),
            None if source_id == destination_id => Transaction::new(),
            None => return Err(GroceryError::not_found(EntityKind::List, destination_id)),
        };
        let copied = self.lists.copy_items(source_id, destination_id)?;
        if copied > 0 {
            self.commit(tx, vec![PersistOp::List(destination_id.to_string())])?;
        }
        info!(source_id, destination_id, copied, "Copied list items");
        Ok(copied)
    }

    // Whole state

    /// Replaces all state with imported data.
    pub fn import_data(&mut self, data: AppData) -> Result<(), GroceryError> {
        let tx = Transaction::new().catalog(&self.catalog).lists(&self.lists);
        self.catalog = data.master_stores;
        self.lists = ListStore::new(data.lists, data.archived_lists);
        let repaired = self.lists.repair();
        if !repaired.is_empty() {
            warn!(lists = ?repaired, "Repaired legacy line item ids in import");
        }
        self.lists.ensure_active(&self.options.default_list_name);
        self.commit(tx, vec![PersistOp::ReplaceAll])?;
        self.remember_active();
        info!(
            stores = self.catalog.stores().len(),
            lists = self.lists.lists().len(),
            "Imported data"
        );
        Ok(())
    }

    /// Folds a document from another device into storage and takes the
    /// merged slice as the new truth.
    pub fn merge_remote(&mut self, doc_type: DocType, bytes: &[u8]) -> Result<(), GroceryError> {
        let event = self.persistence.merge_remote(doc_type, bytes)?;
        info!(doc_type = %doc_type, "Merged document from another device");
        self.apply_remote(event);
        Ok(())
    }

    /// Takes an externally originated change as the new truth for its
    /// slice.
    pub fn apply_remote(&mut self, event: ChangeEvent) {
        let mut touched = Vec::new();
        match event {
            ChangeEvent::Catalog(catalog) => {
                debug!("Applying remote catalog");
                self.catalog = catalog;
                let catalog = &self.catalog;
                touched = self.lists.remove_matching(|li| !catalog.has_item(&li.item_id));
                if !touched.is_empty() {
                    debug!(lists = touched.len(), "Dropped line items of removed items");
                }
            }
            ChangeEvent::Lists(lists) => {
                debug!(count = lists.len(), "Applying remote lists");
                self.lists.replace_lists(lists);
            }
            ChangeEvent::ArchivedLists(lists) => {
                debug!(count = lists.len(), "Applying remote archived lists");
                self.lists.replace_archived(lists);
            }
        }

        for id in self.lists.repair() {
            if !touched.contains(&id) {
                touched.push(id);
            }
        }
        let mut ops: Vec<PersistOp> = Self::list_ops(touched).collect();
        if let Some(id) = self.lists.ensure_active(&self.options.default_list_name) {
            ops.push(PersistOp::List(id));
        }
        for op in &ops {
            if let Err(e) = self.run_op(op) {
                warn!(error = %e, op = ?op, "Could not persist fix-up of remote change");
            }
        }
    }
}

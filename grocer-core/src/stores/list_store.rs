//! Active and archived shopping lists plus the line item rules that keep
//! them consistent with the catalog.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::ItemEdit;
use crate::error::{validate_name, EntityKind, GroceryError};
use crate::id::new_id;
use crate::models::{Item, LineItem, ShoppingList};

/// Owns every shopping list and which one is selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListStore {
    lists: Vec<ShoppingList>,
    archived: Vec<ShoppingList>,
    active_id: Option<String>,
}

impl ListStore {
    pub fn new(lists: Vec<ShoppingList>, archived: Vec<ShoppingList>) -> Self {
        let active_id = lists.first().map(|l| l.id.clone());
        Self {
            lists,
            archived,
            active_id,
        }
    }

    pub fn lists(&self) -> &[ShoppingList] {
        &self.lists
    }

    pub fn archived_lists(&self) -> &[ShoppingList] {
        &self.archived
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The selected list.
    pub fn active(&self) -> Option<&ShoppingList> {
        self.active_id.as_deref().and_then(|id| self.list(id))
    }

    /// An active (non-archived) list.
    pub fn list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn archived_list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.archived.iter().find(|l| l.id == list_id)
    }

    /// A list from either bucket.
    pub fn any_list(&self, list_id: &str) -> Option<&ShoppingList> {
        self.list(list_id).or_else(|| self.archived_list(list_id))
    }

    fn list_mut(&mut self, list_id: &str) -> Result<&mut ShoppingList, GroceryError> {
        self.lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::List, list_id))
    }

    pub(crate) fn replace_lists(&mut self, lists: Vec<ShoppingList>) {
        self.lists = lists;
        self.reselect();
    }

    pub(crate) fn replace_archived(&mut self, archived: Vec<ShoppingList>) {
        self.archived = archived;
    }

    /// Put a previously captured copy of one list back where it lives.
    pub(crate) fn restore_snapshot(&mut self, snapshot: ShoppingList) {
        let bucket = if snapshot.is_archived() {
            &mut self.archived
        } else {
            &mut self.lists
        };
        match bucket.iter_mut().find(|l| l.id == snapshot.id) {
            Some(slot) => *slot = snapshot,
            None => bucket.push(snapshot),
        }
    }

    /// Select a list, keeping the current selection when the id is not an
    /// active list.
    pub(crate) fn select(&mut self, list_id: &str) -> Result<(), GroceryError> {
        if self.list(list_id).is_none() {
            return Err(GroceryError::not_found(EntityKind::List, list_id));
        }
        self.active_id = Some(list_id.to_string());
        Ok(())
    }

    /// Point the selection at the first active list if it no longer
    /// refers to one.
    pub(crate) fn reselect(&mut self) {
        let valid = self
            .active_id
            .as_deref()
            .is_some_and(|id| self.list(id).is_some());
        if !valid {
            self.active_id = self.lists.first().map(|l| l.id.clone());
        }
    }

    /// Create a default list when no active list exists. Returns the new
    /// list's id if one was created.
    pub(crate) fn ensure_active(&mut self, default_name: &str) -> Option<String> {
        if !self.lists.is_empty() {
            self.reselect();
            return None;
        }
        let list = ShoppingList::new(new_id(), default_name);
        let id = list.id.clone();
        debug!(list_id = %id, "Created default list");
        self.lists.push(list);
        self.active_id = Some(id.clone());
        Some(id)
    }

    /// Create a list and select it.
    pub(crate) fn create(&mut self, name: &str) -> Result<String, GroceryError> {
        let name = validate_name(name, "List")?;
        let list = ShoppingList::new(new_id(), name);
        let id = list.id.clone();
        self.lists.push(list);
        self.active_id = Some(id.clone());
        Ok(id)
    }

    /// Move an active list to the archive. The last active list stays.
    pub(crate) fn archive(&mut self, list_id: &str) -> Result<(), GroceryError> {
        let idx = self
            .lists
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::List, list_id))?;
        if self.lists.len() == 1 {
            return Err(GroceryError::InvariantViolation(
                "Cannot archive the only active list".to_string(),
            ));
        }
        let mut list = self.lists.remove(idx);
        list.archived_at = Some(Utc::now());
        self.archived.insert(0, list);
        self.reselect();
        Ok(())
    }

    /// Bring an archived list back and select it.
    pub(crate) fn restore(&mut self, list_id: &str) -> Result<(), GroceryError> {
        let idx = self
            .archived
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::ArchivedList, list_id))?;
        let mut list = self.archived.remove(idx);
        list.archived_at = None;
        self.lists.push(list);
        self.active_id = Some(list_id.to_string());
        Ok(())
    }

    pub(crate) fn delete_archived(&mut self, list_id: &str) -> Result<ShoppingList, GroceryError> {
        let idx = self
            .archived
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::ArchivedList, list_id))?;
        Ok(self.archived.remove(idx))
    }

    /// Add a catalog item to a list unless one derived from it is already
    /// there.
    pub(crate) fn add_line_item(
        &mut self,
        list_id: &str,
        store_id: &str,
        category_id: &str,
        item: &Item,
    ) -> Result<LineItem, GroceryError> {
        let list = self.list_mut(list_id)?;
        if list.contains_item(&item.id) {
            return Err(GroceryError::DuplicateEntry {
                item_id: item.id.clone(),
                list_id: list_id.to_string(),
            });
        }
        let line_item = LineItem {
            id: new_id(),
            item_id: item.id.clone(),
            name: item.name.clone(),
            store_id: store_id.to_string(),
            category_id: category_id.to_string(),
            checked: false,
            order: list.next_group_order(store_id, category_id),
        };
        list.items.push(line_item.clone());
        Ok(line_item)
    }

    pub(crate) fn remove_line_item(
        &mut self,
        list_id: &str,
        line_item_id: &str,
    ) -> Result<LineItem, GroceryError> {
        let list = self.list_mut(list_id)?;
        let idx = list
            .items
            .iter()
            .position(|li| li.id == line_item_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::LineItem, line_item_id))?;
        Ok(list.items.remove(idx))
    }

    /// Flip a line item's checked flag, returning the new value.
    pub(crate) fn toggle_checked(
        &mut self,
        list_id: &str,
        line_item_id: &str,
    ) -> Result<bool, GroceryError> {
        let list = self.list_mut(list_id)?;
        let line_item = list
            .items
            .iter_mut()
            .find(|li| li.id == line_item_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::LineItem, line_item_id))?;
        line_item.checked = !line_item.checked;
        Ok(line_item.checked)
    }

    /// Number line items of one store+category group 0..n in the given
    /// order. Ids outside the group or unknown to the list are skipped.
    pub(crate) fn reorder_within_group(
        &mut self,
        list_id: &str,
        store_id: &str,
        category_id: &str,
        ordered_ids: &[String],
    ) -> Result<usize, GroceryError> {
        let list = self.list_mut(list_id)?;
        let mut next = 0;
        for line_item_id in ordered_ids {
            match list.items.iter_mut().find(|li| &li.id == line_item_id) {
                Some(li) if li.in_group(store_id, category_id) => {
                    li.order = next;
                    next += 1;
                }
                Some(_) => {
                    warn!(line_item_id = %line_item_id, "Skipping line item from another group");
                }
                None => {
                    warn!(line_item_id = %line_item_id, "Skipping unknown line item");
                }
            }
        }
        Ok(next as usize)
    }

    fn all_lists_mut(&mut self) -> impl Iterator<Item = &mut ShoppingList> {
        self.lists.iter_mut().chain(self.archived.iter_mut())
    }

    /// Bring every line item derived from an edited catalog item in line
    /// with it, across active and archived lists. Returns the ids of the
    /// lists that changed.
    pub(crate) fn propagate_edit(&mut self, edit: &ItemEdit) -> Vec<String> {
        let mut touched = Vec::new();
        for list in self.all_lists_mut() {
            let mut changed = false;
            let mut next_order = None;
            if edit.moved {
                next_order = Some(list.next_group_order(&edit.store_id, &edit.category_id));
            }
            for li in list.items.iter_mut().filter(|li| li.item_id == edit.item_id) {
                if li.name != edit.name {
                    li.name = edit.name.clone();
                    changed = true;
                }
                if !li.in_group(&edit.store_id, &edit.category_id) {
                    li.store_id = edit.store_id.clone();
                    li.category_id = edit.category_id.clone();
                    if let Some(order) = next_order.as_mut() {
                        li.order = *order;
                        *order += 1;
                    }
                    changed = true;
                }
            }
            if changed {
                touched.push(list.id.clone());
            }
        }
        touched
    }

    /// Remove every line item matching the predicate from every list.
    /// Returns the ids of the lists that changed.
    pub(crate) fn remove_matching(&mut self, predicate: impl Fn(&LineItem) -> bool) -> Vec<String> {
        let mut touched = Vec::new();
        for list in self.all_lists_mut() {
            let before = list.items.len();
            list.items.retain(|li| !predicate(li));
            if list.items.len() != before {
                debug!(
                    list_id = %list.id,
                    removed = before - list.items.len(),
                    "Removed line items for deleted catalog entries"
                );
                touched.push(list.id.clone());
            }
        }
        touched
    }

    /// Copy line items whose catalog item is not yet on the destination.
    ///
    /// The source may be active or archived; the destination must be an
    /// active list. Copies are unchecked and get fresh ids.
    pub(crate) fn copy_items(
        &mut self,
        source_id: &str,
        destination_id: &str,
    ) -> Result<usize, GroceryError> {
        if source_id == destination_id {
            return Err(GroceryError::InvalidInput(
                "Source and destination lists must be different".to_string(),
            ));
        }
        let source = self
            .any_list(source_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::List, source_id))?;
        let mut source_items: Vec<LineItem> = source.items.clone();
        source_items.sort_by(|a, b| {
            (&a.store_id, &a.category_id, a.order).cmp(&(&b.store_id, &b.category_id, b.order))
        });

        let destination = self.list_mut(destination_id)?;
        let mut present: HashSet<String> =
            destination.items.iter().map(|li| li.item_id.clone()).collect();

        let mut copied = 0;
        for item in source_items {
            if !present.insert(item.item_id.clone()) {
                continue;
            }
            let order = destination.next_group_order(&item.store_id, &item.category_id);
            destination.items.push(LineItem {
                id: new_id(),
                checked: false,
                order,
                ..item
            });
            copied += 1;
        }
        Ok(copied)
    }

    /// Fix line items written by older versions that reused the catalog
    /// item id as the line item id. Returns the ids of repaired lists.
    pub(crate) fn repair(&mut self) -> Vec<String> {
        let mut repaired = Vec::new();
        for list in self.all_lists_mut() {
            if repair_list(list) {
                repaired.push(list.id.clone());
            }
        }
        repaired
    }
}

fn repair_list(list: &mut ShoppingList) -> bool {
    let mut changed = false;
    let mut seen = HashSet::new();
    for li in &mut list.items {
        if li.item_id.is_empty() {
            li.item_id = li.id.clone();
            changed = true;
        }
        if li.id == li.item_id || li.id.is_empty() || !seen.insert(li.id.clone()) {
            li.id = new_id();
            seen.insert(li.id.clone());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            order: 0,
        }
    }

    fn store_with_list() -> (ListStore, String) {
        let mut store = ListStore::default();
        let id = store.create("Weekly").unwrap();
        (store, id)
    }

    #[test]
    fn test_create_selects_new_list() {
        let (mut store, first) = store_with_list();
        assert_eq!(store.active_id(), Some(first.as_str()));
        let second = store.create("Party").unwrap();
        assert_eq!(store.active_id(), Some(second.as_str()));
        assert!(matches!(store.create(" "), Err(GroceryError::InvalidInput(_))));
    }

    #[test]
    fn test_archive_last_list_rejected() {
        let (mut store, id) = store_with_list();
        let before = store.clone();
        let err = store.archive(&id).unwrap_err();
        assert!(matches!(err, GroceryError::InvariantViolation(_)));
        assert_eq!(store, before);
    }

    #[test]
    fn test_archive_active_selects_first_remaining() {
        let (mut store, first) = store_with_list();
        let second = store.create("Party").unwrap();
        let third = store.create("Camping").unwrap();

        store.archive(&third).unwrap();
        assert_eq!(store.active_id(), Some(first.as_str()));
        let archived = store.archived_list(&third).unwrap();
        assert!(archived.archived_at.is_some());

        store.select(&second).unwrap();
        store.archive(&first).unwrap();
        assert_eq!(store.active_id(), Some(second.as_str()));
    }

    #[test]
    fn test_restore_and_delete_archived() {
        let (mut store, first) = store_with_list();
        let second = store.create("Party").unwrap();
        store.archive(&first).unwrap();

        store.restore(&first).unwrap();
        assert_eq!(store.active_id(), Some(first.as_str()));
        assert!(store.list(&first).unwrap().archived_at.is_none());

        store.archive(&second).unwrap();
        store.delete_archived(&second).unwrap();
        assert!(store.any_list(&second).is_none());
        assert!(matches!(
            store.delete_archived(&second),
            Err(GroceryError::NotFound { kind: EntityKind::ArchivedList, .. })
        ));
        // Active lists cannot be deleted directly.
        assert!(store.delete_archived(&first).is_err());
    }

    #[test]
    fn test_add_line_item_dedups_on_item_id() {
        let (mut store, list_id) = store_with_list();
        let apples = item("i1", "Apples");

        let line = store.add_line_item(&list_id, "s1", "c1", &apples).unwrap();
        assert_ne!(line.id, "i1");
        assert_eq!(line.item_id, "i1");

        let err = store.add_line_item(&list_id, "s1", "c1", &apples).unwrap_err();
        assert!(err.is_informational());
        assert_eq!(store.list(&list_id).unwrap().items.len(), 1);

        let pears = store
            .add_line_item(&list_id, "s1", "c1", &item("i2", "Pears"))
            .unwrap();
        assert_eq!(pears.order, 1);
    }

    #[test]
    fn test_remove_and_toggle_address_line_item_id() {
        let (mut store, list_id) = store_with_list();
        let line = store
            .add_line_item(&list_id, "s1", "c1", &item("i1", "Apples"))
            .unwrap();

        assert!(store.toggle_checked(&list_id, "i1").is_err());
        assert!(store.toggle_checked(&list_id, &line.id).unwrap());
        assert!(store.remove_line_item(&list_id, "i1").is_err());
        store.remove_line_item(&list_id, &line.id).unwrap();
        assert!(matches!(
            store.remove_line_item(&list_id, &line.id),
            Err(GroceryError::NotFound { kind: EntityKind::LineItem, .. })
        ));
    }

    #[test]
    fn test_reorder_skips_other_groups() {
        let (mut store, list_id) = store_with_list();
        let a = store.add_line_item(&list_id, "s1", "c1", &item("i1", "A")).unwrap();
        let b = store.add_line_item(&list_id, "s1", "c1", &item("i2", "B")).unwrap();
        let other = store.add_line_item(&list_id, "s1", "c2", &item("i3", "C")).unwrap();

        let count = store
            .reorder_within_group(
                &list_id,
                "s1",
                "c1",
                &[b.id.clone(), other.id.clone(), "ghost".to_string(), a.id.clone()],
            )
            .unwrap();
        assert_eq!(count, 2);

        let list = store.list(&list_id).unwrap();
        assert_eq!(list.line_item(&b.id).unwrap().order, 0);
        assert_eq!(list.line_item(&a.id).unwrap().order, 1);
        assert_eq!(list.line_item(&other.id).unwrap().order, 0);
    }

    #[test]
    fn test_propagate_edit_reaches_archived_lists() {
        let (mut store, first) = store_with_list();
        let second = store.create("Party").unwrap();
        let apples = item("i1", "Apples");
        let original = store.add_line_item(&first, "s1", "c1", &apples).unwrap();
        store.add_line_item(&second, "s1", "c1", &apples).unwrap();
        store.archive(&first).unwrap();

        let edit = ItemEdit {
            item_id: "i1".to_string(),
            name: "Green Apples".to_string(),
            store_id: "s1".to_string(),
            category_id: "c2".to_string(),
            renamed: true,
            moved: true,
        };
        let touched = store.propagate_edit(&edit);
        assert_eq!(touched.len(), 2);

        let archived = store.archived_list(&first).unwrap();
        let line = archived.line_item(&original.id).unwrap();
        assert_eq!(line.name, "Green Apples");
        assert_eq!(line.item_id, "i1");
        assert_eq!(line.category_id, "c2");
    }

    #[test]
    fn test_remove_matching_across_buckets() {
        let (mut store, first) = store_with_list();
        let second = store.create("Party").unwrap();
        store.add_line_item(&first, "s1", "c1", &item("i1", "A")).unwrap();
        store.add_line_item(&second, "s1", "c1", &item("i1", "A")).unwrap();
        store.add_line_item(&second, "s2", "c9", &item("i2", "B")).unwrap();
        store.archive(&first).unwrap();

        let touched = store.remove_matching(|li| li.item_id == "i1");
        assert_eq!(touched.len(), 2);
        assert!(store.archived_list(&first).unwrap().items.is_empty());
        assert_eq!(store.list(&second).unwrap().items.len(), 1);
    }

    #[test]
    fn test_copy_items_is_idempotent() {
        let (mut store, source) = store_with_list();
        let destination = store.create("Party").unwrap();
        let a = store.add_line_item(&source, "s1", "c1", &item("i1", "A")).unwrap();
        store.add_line_item(&source, "s1", "c1", &item("i2", "B")).unwrap();
        store.add_line_item(&destination, "s1", "c1", &item("i2", "B")).unwrap();
        store.toggle_checked(&source, &a.id).unwrap();

        assert_eq!(store.copy_items(&source, &destination).unwrap(), 1);
        assert_eq!(store.copy_items(&source, &destination).unwrap(), 0);

        let dest = store.list(&destination).unwrap();
        let copy = dest.items.iter().find(|li| li.item_id == "i1").unwrap();
        assert_ne!(copy.id, a.id);
        assert!(!copy.checked);
        assert_eq!(copy.order, 1);
    }

    #[test]
    fn test_copy_items_errors() {
        let (mut store, source) = store_with_list();
        assert!(matches!(
            store.copy_items(&source, &source),
            Err(GroceryError::InvalidInput(_))
        ));
        assert!(matches!(
            store.copy_items("missing", &source),
            Err(GroceryError::NotFound { .. })
        ));
        assert!(matches!(
            store.copy_items(&source, "missing"),
            Err(GroceryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_repair_legacy_line_items() {
        let mut list = ShoppingList::new("l1", "Old");
        let legacy = LineItem {
            id: "i1".to_string(),
            item_id: String::new(),
            name: "Apples".to_string(),
            store_id: "s1".to_string(),
            category_id: "c1".to_string(),
            checked: true,
            order: 0,
        };
        list.items.push(legacy.clone());
        list.items.push(LineItem {
            item_id: "i2".to_string(),
            id: "dup".to_string(),
            ..legacy.clone()
        });
        list.items.push(LineItem {
            item_id: "i3".to_string(),
            id: "dup".to_string(),
            ..legacy
        });

        let mut store = ListStore::new(vec![list], vec![]);
        assert_eq!(store.repair(), vec!["l1".to_string()]);

        let items = &store.list("l1").unwrap().items;
        assert_eq!(items[0].item_id, "i1");
        assert_ne!(items[0].id, "i1");
        assert_eq!(items[1].id, "dup");
        assert_ne!(items[2].id, "dup");
        assert!(store.repair().is_empty());
    }

    #[test]
    fn test_ensure_active_creates_default() {
        let mut store = ListStore::default();
        let created = store.ensure_active("My First List").unwrap();
        assert_eq!(store.active_id(), Some(created.as_str()));
        assert_eq!(store.lists()[0].name, "My First List");
        assert!(store.ensure_active("My First List").is_none());
    }
}

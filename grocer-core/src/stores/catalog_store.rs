//! Catalog mutations.
//!
//! These only touch the catalog itself. Keeping line items consistent with
//! the result (rename propagation, cascading removal) is the engine's job.

use tracing::debug;

use crate::error::{validate_name, EntityKind, GroceryError};
use crate::id::new_id;
use crate::models::{Catalog, Category, Direction, Item, Store};

/// What an item edit changed, used to propagate it into lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEdit {
    pub item_id: String,
    pub name: String,
    pub store_id: String,
    pub category_id: String,
    pub renamed: bool,
    pub moved: bool,
}

impl ItemEdit {
    pub fn changed(&self) -> bool {
        self.renamed || self.moved
    }
}

/// Entries with a manual display order.
trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);
}

macro_rules! impl_ordered {
    ($($ty:ty),*) => {
        $(impl Ordered for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn order(&self) -> i64 {
                self.order
            }
            fn set_order(&mut self, order: i64) {
                self.order = order;
            }
        })*
    };
}

impl_ordered!(Store, Category, Item);

/// Swap an entry with its neighbour in display order, then renumber all
/// siblings 0..n. Returns false when already at the boundary.
fn move_entry<T: Ordered>(entries: &mut [T], id: &str, direction: Direction) -> Option<bool> {
    entries.sort_by_key(|e| e.order());
    let idx = entries.iter().position(|e| e.id() == id)?;
    let target = match direction {
        Direction::Up if idx > 0 => idx - 1,
        Direction::Down if idx + 1 < entries.len() => idx + 1,
        _ => return Some(false),
    };
    entries.swap(idx, target);
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.set_order(position as i64);
    }
    Some(true)
}

impl Catalog {
    fn store_mut(&mut self, store_id: &str) -> Result<&mut Store, GroceryError> {
        self.stores
            .iter_mut()
            .find(|s| s.id == store_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Store, store_id))
    }

    fn category_mut(
        &mut self,
        store_id: &str,
        category_id: &str,
    ) -> Result<&mut Category, GroceryError> {
        self.store_mut(store_id)?
            .categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Category, category_id))
    }

    fn require_item(
        &self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
    ) -> Result<&Item, GroceryError> {
        let category = self
            .store(store_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Store, store_id))?
            .category(category_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Category, category_id))?;
        category
            .item(item_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Item, item_id))
    }

    /// Add a store with one default category, placed last.
    pub(crate) fn add_store(
        &mut self,
        name: &str,
        default_category: &str,
    ) -> Result<String, GroceryError> {
        let name = validate_name(name, "Store")?;
        let order = self.stores.iter().map(|s| s.order).max().map_or(0, |m| m + 1);
        let store = Store {
            id: new_id(),
            name,
            order,
            categories: vec![Category {
                id: new_id(),
                name: default_category.to_string(),
                order: 0,
                items: Vec::new(),
            }],
        };
        debug!(store_id = %store.id, name = %store.name, "Added store");
        let id = store.id.clone();
        self.stores.push(store);
        Ok(id)
    }

    pub(crate) fn rename_store(&mut self, store_id: &str, name: &str) -> Result<(), GroceryError> {
        let store = self.store_mut(store_id)?;
        store.name = validate_name(name, "Store")?;
        Ok(())
    }

    /// Remove a store, returning it so callers can cascade into lists.
    pub(crate) fn delete_store(&mut self, store_id: &str) -> Result<Store, GroceryError> {
        let idx = self
            .stores
            .iter()
            .position(|s| s.id == store_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Store, store_id))?;
        Ok(self.stores.remove(idx))
    }

    pub(crate) fn add_category(&mut self, store_id: &str, name: &str) -> Result<String, GroceryError> {
        let store = self.store_mut(store_id)?;
        let name = validate_name(name, "Category")?;
        let order = store
            .categories
            .iter()
            .map(|c| c.order)
            .max()
            .map_or(0, |m| m + 1);
        let id = new_id();
        store.categories.push(Category {
            id: id.clone(),
            name,
            order,
            items: Vec::new(),
        });
        Ok(id)
    }

    pub(crate) fn rename_category(
        &mut self,
        store_id: &str,
        category_id: &str,
        name: &str,
    ) -> Result<(), GroceryError> {
        let category = self.category_mut(store_id, category_id)?;
        category.name = validate_name(name, "Category")?;
        Ok(())
    }

    /// Remove a category. A store's last category cannot be removed.
    pub(crate) fn delete_category(
        &mut self,
        store_id: &str,
        category_id: &str,
    ) -> Result<Category, GroceryError> {
        let store = self.store_mut(store_id)?;
        let idx = store
            .categories
            .iter()
            .position(|c| c.id == category_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Category, category_id))?;
        if store.categories.len() == 1 {
            return Err(GroceryError::InvariantViolation(format!(
                "Cannot delete the last category of store '{}'",
                store.name
            )));
        }
        Ok(store.categories.remove(idx))
    }

    pub(crate) fn add_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        name: &str,
    ) -> Result<Item, GroceryError> {
        let category = self.category_mut(store_id, category_id)?;
        let item = Item {
            id: new_id(),
            name: validate_name(name, "Item")?,
            order: category.next_item_order(),
        };
        category.items.push(item.clone());
        Ok(item)
    }

    /// Rename and/or move an item.
    ///
    /// Everything is validated before anything changes, so a missing
    /// destination leaves the item where it was.
    pub(crate) fn edit_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
        new_name: &str,
        new_store_id: Option<&str>,
        new_category_id: Option<&str>,
    ) -> Result<ItemEdit, GroceryError> {
        let current = self.require_item(store_id, category_id, item_id)?.clone();
        let name = validate_name(new_name, "Item")?;

        let dest_store = new_store_id.unwrap_or(store_id);
        let dest_category = match new_category_id {
            Some(id) => id,
            None if dest_store == store_id => category_id,
            None => {
                return Err(GroceryError::InvalidInput(
                    "A destination category is required when moving to another store".to_string(),
                ))
            }
        };
        let moved = dest_store != store_id || dest_category != category_id;
        if moved {
            self.category(dest_store, dest_category).ok_or_else(|| {
                match self.store(dest_store) {
                    None => GroceryError::not_found(EntityKind::Store, dest_store),
                    Some(_) => GroceryError::not_found(EntityKind::Category, dest_category),
                }
            })?;
        }

        let renamed = name != current.name;
        if moved {
            let source = self.category_mut(store_id, category_id)?;
            source.items.retain(|i| i.id != item_id);
            let destination = self.category_mut(dest_store, dest_category)?;
            let order = destination.next_item_order();
            destination.items.push(Item {
                id: current.id.clone(),
                name: name.clone(),
                order,
            });
        } else if renamed {
            let category = self.category_mut(store_id, category_id)?;
            if let Some(item) = category.items.iter_mut().find(|i| i.id == item_id) {
                item.name = name.clone();
            }
        }

        Ok(ItemEdit {
            item_id: current.id,
            name,
            store_id: dest_store.to_string(),
            category_id: dest_category.to_string(),
            renamed,
            moved,
        })
    }

    pub(crate) fn delete_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
    ) -> Result<Item, GroceryError> {
        let category = self.category_mut(store_id, category_id)?;
        let idx = category
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Item, item_id))?;
        Ok(category.items.remove(idx))
    }

    pub(crate) fn move_store(
        &mut self,
        store_id: &str,
        direction: Direction,
    ) -> Result<bool, GroceryError> {
        move_entry(&mut self.stores, store_id, direction)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Store, store_id))
    }

    pub(crate) fn move_category(
        &mut self,
        store_id: &str,
        category_id: &str,
        direction: Direction,
    ) -> Result<bool, GroceryError> {
        let store = self.store_mut(store_id)?;
        move_entry(&mut store.categories, category_id, direction)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Category, category_id))
    }

    pub(crate) fn move_item(
        &mut self,
        store_id: &str,
        category_id: &str,
        item_id: &str,
        direction: Direction,
    ) -> Result<bool, GroceryError> {
        let category = self.category_mut(store_id, category_id)?;
        move_entry(&mut category.items, item_id, direction)
            .ok_or_else(|| GroceryError::not_found(EntityKind::Item, item_id))
    }

    /// Copy an item's name into a new, independent item elsewhere.
    pub(crate) fn duplicate_item(
        &mut self,
        source_store_id: &str,
        source_category_id: &str,
        item_id: &str,
        dest_store_id: &str,
        dest_category_id: &str,
    ) -> Result<Item, GroceryError> {
        let name = self
            .require_item(source_store_id, source_category_id, item_id)?
            .name
            .clone();
        self.add_item(dest_store_id, dest_category_id, &name)
    }

    /// Seed an empty catalog with a single store.
    pub(crate) fn seed(&mut self, store_name: &str, default_category: &str) -> Result<(), GroceryError> {
        if self.stores.is_empty() {
            self.add_store(store_name, default_category)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with_item() -> (Catalog, String, String, String) {
        let mut catalog = Catalog::default();
        let store_id = catalog.add_store("Market", "General").unwrap();
        let category_id = catalog.store(&store_id).unwrap().categories[0].id.clone();
        let item = catalog.add_item(&store_id, &category_id, "Apples").unwrap();
        (catalog, store_id, category_id, item.id)
    }

    #[test]
    fn test_add_store_creates_default_category() {
        let mut catalog = Catalog::default();
        let first = catalog.add_store("  Market ", "General").unwrap();
        let second = catalog.add_store("Bakery", "General").unwrap();

        let store = catalog.store(&first).unwrap();
        assert_eq!(store.name, "Market");
        assert_eq!(store.categories.len(), 1);
        assert_eq!(store.categories[0].name, "General");
        assert_eq!(catalog.store(&second).unwrap().order, 1);
    }

    #[test]
    fn test_add_store_rejects_blank_name() {
        let mut catalog = Catalog::default();
        let err = catalog.add_store("  ", "General").unwrap_err();
        assert!(matches!(err, GroceryError::InvalidInput(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_rename_store_errors() {
        let (mut catalog, store_id, _, _) = catalog_with_item();
        assert!(matches!(
            catalog.rename_store("nope", "X"),
            Err(GroceryError::NotFound { kind: EntityKind::Store, .. })
        ));
        assert!(matches!(
            catalog.rename_store(&store_id, ""),
            Err(GroceryError::InvalidInput(_))
        ));
        assert_eq!(catalog.store(&store_id).unwrap().name, "Market");
    }

    #[test]
    fn test_delete_last_category_rejected() {
        let (mut catalog, store_id, category_id, _) = catalog_with_item();
        let err = catalog.delete_category(&store_id, &category_id).unwrap_err();
        assert!(matches!(err, GroceryError::InvariantViolation(_)));
        assert_eq!(catalog.store(&store_id).unwrap().categories.len(), 1);

        let other = catalog.add_category(&store_id, "Dairy").unwrap();
        let removed = catalog.delete_category(&store_id, &category_id).unwrap();
        assert_eq!(removed.items.len(), 1);
        assert_eq!(catalog.store(&store_id).unwrap().categories[0].id, other);
    }

    #[test]
    fn test_add_item_order_is_max_plus_one() {
        let (mut catalog, store_id, category_id, first) = catalog_with_item();
        let second = catalog.add_item(&store_id, &category_id, "Pears").unwrap();
        assert_eq!(second.order, 1);

        catalog.move_item(&store_id, &category_id, &first, Direction::Down).unwrap();
        catalog.delete_item(&store_id, &category_id, &second.id).unwrap();
        // Remaining item was renumbered to 1; next one follows it.
        let third = catalog.add_item(&store_id, &category_id, "Plums").unwrap();
        assert_eq!(third.order, 2);
    }

    #[test]
    fn test_edit_item_rename() {
        let (mut catalog, store_id, category_id, item_id) = catalog_with_item();
        let edit = catalog
            .edit_item(&store_id, &category_id, &item_id, "Green Apples", None, None)
            .unwrap();
        assert!(edit.renamed);
        assert!(!edit.moved);
        assert_eq!(
            catalog.item(&store_id, &category_id, &item_id).unwrap().name,
            "Green Apples"
        );
    }

    #[test]
    fn test_edit_item_move_recalculates_order() {
        let (mut catalog, store_id, category_id, item_id) = catalog_with_item();
        let dairy = catalog.add_category(&store_id, "Dairy").unwrap();
        catalog.add_item(&store_id, &dairy, "Milk").unwrap();

        let edit = catalog
            .edit_item(&store_id, &category_id, &item_id, "Apples", None, Some(&dairy))
            .unwrap();
        assert!(edit.moved);
        assert!(!edit.renamed);
        assert!(catalog.item(&store_id, &category_id, &item_id).is_none());
        let moved = catalog.item(&store_id, &dairy, &item_id).unwrap();
        assert_eq!(moved.order, 1);
    }

    #[test]
    fn test_edit_item_missing_destination_leaves_item() {
        let (mut catalog, store_id, category_id, item_id) = catalog_with_item();
        let before = catalog.clone();

        let err = catalog
            .edit_item(&store_id, &category_id, &item_id, "Renamed", None, Some("missing"))
            .unwrap_err();
        assert!(matches!(
            err,
            GroceryError::NotFound { kind: EntityKind::Category, .. }
        ));
        let err = catalog
            .edit_item(&store_id, &category_id, &item_id, "Renamed", Some("missing"), Some("c"))
            .unwrap_err();
        assert!(matches!(err, GroceryError::NotFound { kind: EntityKind::Store, .. }));
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_move_store_swaps_and_renumbers() {
        let mut catalog = Catalog::default();
        let a = catalog.add_store("A", "General").unwrap();
        let b = catalog.add_store("B", "General").unwrap();
        let c = catalog.add_store("C", "General").unwrap();
        // Gapped orders get normalised on the first move.
        catalog.stores[2].order = 10;

        assert!(catalog.move_store(&c, Direction::Up).unwrap());
        let order: Vec<(&str, i64)> = catalog
            .stores()
            .iter()
            .map(|s| (s.id.as_str(), s.order))
            .collect();
        assert_eq!(order, vec![(a.as_str(), 0), (c.as_str(), 1), (b.as_str(), 2)]);
    }

    #[test]
    fn test_move_at_boundary_is_noop() {
        let (mut catalog, store_id, category_id, item_id) = catalog_with_item();
        let before = catalog.clone();
        assert!(!catalog.move_store(&store_id, Direction::Up).unwrap());
        assert!(!catalog
            .move_item(&store_id, &category_id, &item_id, Direction::Down)
            .unwrap());
        assert_eq!(catalog, before);
        assert!(catalog.move_category(&store_id, "nope", Direction::Up).is_err());
    }

    #[test]
    fn test_duplicate_item_is_independent() {
        let (mut catalog, store_id, category_id, item_id) = catalog_with_item();
        let other_store = catalog.add_store("Bakery", "General").unwrap();
        let other_category = catalog.store(&other_store).unwrap().categories[0].id.clone();

        let copy = catalog
            .duplicate_item(&store_id, &category_id, &item_id, &other_store, &other_category)
            .unwrap();
        assert_ne!(copy.id, item_id);
        assert_eq!(copy.name, "Apples");
        assert_eq!(catalog.item_count(), 2);
    }
}

//! Master catalog: stores, their categories and the items in each.
//!
//! Every level carries a manual `order` that is the persisted source of
//! truth for display. Alphabetical sorting is only a view, see
//! [`Catalog::view`].

use serde::{Deserialize, Serialize};

/// A reference-catalog leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

/// A category within a store. Owns its items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Category {
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Items sorted by their manual order.
    pub fn sorted_items(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by_key(|i| i.order);
        items
    }

    pub(crate) fn next_item_order(&self) -> i64 {
        self.items.iter().map(|i| i.order).max().map_or(0, |m| m + 1)
    }
}

/// A store. Always holds at least one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Store {
    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    /// Categories sorted by their manual order.
    pub fn sorted_categories(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.iter().collect();
        categories.sort_by_key(|c| c.order);
        categories
    }
}

/// Direction for manual reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// How a catalog view is ordered. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Manual,
    Alphabetical,
}

/// The full set of stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Catalog {
    pub(crate) stores: Vec<Store>,
}

impl Catalog {
    pub fn new(stores: Vec<Store>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn store(&self, store_id: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.id == store_id)
    }

    pub fn category(&self, store_id: &str, category_id: &str) -> Option<&Category> {
        self.store(store_id).and_then(|s| s.category(category_id))
    }

    pub fn item(&self, store_id: &str, category_id: &str, item_id: &str) -> Option<&Item> {
        self.category(store_id, category_id)
            .and_then(|c| c.item(item_id))
    }

    /// Locate an item anywhere in the catalog, returning its store and
    /// category ids alongside it.
    pub fn find_item(&self, item_id: &str) -> Option<(&str, &str, &Item)> {
        self.stores.iter().find_map(|s| {
            s.categories.iter().find_map(|c| {
                c.item(item_id)
                    .map(|i| (s.id.as_str(), c.id.as_str(), i))
            })
        })
    }

    /// Whether an item with this id exists anywhere.
    pub fn has_item(&self, item_id: &str) -> bool {
        self.find_item(item_id).is_some()
    }

    /// Total number of items across all stores.
    pub fn item_count(&self) -> usize {
        self.stores
            .iter()
            .flat_map(|s| s.categories.iter())
            .map(|c| c.items.len())
            .sum()
    }

    /// A sorted, optionally filtered copy of the catalog for display.
    ///
    /// With a search term, only items whose name contains it
    /// (case-insensitive) are kept, and categories and stores left empty
    /// by the filter are dropped.
    pub fn view(&self, mode: SortMode, search: Option<&str>) -> Vec<Store> {
        let term = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut stores: Vec<Store> = self
            .stores
            .iter()
            .filter_map(|store| {
                let mut categories: Vec<Category> = store
                    .categories
                    .iter()
                    .filter_map(|category| {
                        let mut items: Vec<Item> = category
                            .items
                            .iter()
                            .filter(|i| match &term {
                                Some(t) => i.name.to_lowercase().contains(t),
                                None => true,
                            })
                            .cloned()
                            .collect();
                        if term.is_some() && items.is_empty() {
                            return None;
                        }
                        sort_entries(&mut items, mode, |i| (&i.name, i.order));
                        Some(Category {
                            items,
                            ..category.clone()
                        })
                    })
                    .collect();
                if term.is_some() && categories.is_empty() {
                    return None;
                }
                sort_entries(&mut categories, mode, |c| (&c.name, c.order));
                Some(Store {
                    categories,
                    ..store.clone()
                })
            })
            .collect();

        sort_entries(&mut stores, mode, |s| (&s.name, s.order));
        stores
    }
}

fn sort_entries<T>(entries: &mut [T], mode: SortMode, key: impl Fn(&T) -> (&String, i64)) {
    match mode {
        SortMode::Manual => entries.sort_by_key(|e| key(e).1),
        SortMode::Alphabetical => {
            entries.sort_by_key(|e| key(e).0.to_lowercase());
        }
    }
}

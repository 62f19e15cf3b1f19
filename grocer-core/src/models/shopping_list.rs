//! Shopping lists and their line items.
//!
//! A line item is a snapshot of a catalog item placed on one list. It has
//! its own id; `item_id` is only a weak reference back to the catalog and
//! is what duplicate detection matches on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Catalog;

/// One entry on a shopping list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    /// Catalog item this entry was created from.
    #[serde(default)]
    pub item_id: String,
    /// Cached copy of the catalog item's name.
    pub name: String,
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub checked: bool,
    /// Display order within the store+category group on this list.
    #[serde(default)]
    pub order: i64,
}

impl LineItem {
    pub fn in_group(&self, store_id: &str, category_id: &str) -> bool {
        self.store_id == store_id && self.category_id == category_id
    }
}

impl fmt::Display for LineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.checked { "[x]" } else { "[ ]" };
        write!(f, "{} {}", check, self.name)
    }
}

/// A named shopping list. Archived lists carry `archived_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(rename = "shoppingList", default)]
    pub items: Vec<LineItem>,
}

impl ShoppingList {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
            archived_at: None,
            items: Vec::new(),
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    pub fn line_item(&self, line_item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|li| li.id == line_item_id)
    }

    /// Whether a line item derived from this catalog item is on the list.
    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|li| li.item_id == item_id)
    }

    pub fn checked_count(&self) -> usize {
        self.items.iter().filter(|li| li.checked).count()
    }

    pub(crate) fn next_group_order(&self, store_id: &str, category_id: &str) -> i64 {
        self.items
            .iter()
            .filter(|li| li.in_group(store_id, category_id))
            .map(|li| li.order)
            .max()
            .map_or(0, |m| m + 1)
    }

    /// Line items grouped by store, then category, with names resolved
    /// through the catalog.
    ///
    /// Groups are sorted by name, line items by `order`. Ids the catalog no
    /// longer knows are grouped under "Unknown".
    pub fn grouped(&self, catalog: &Catalog) -> Vec<StoreGroup> {
        let mut stores: Vec<StoreGroup> = Vec::new();

        for line_item in &self.items {
            let store = catalog.store(&line_item.store_id);
            let store_name = store.map_or(UNKNOWN, |s| s.name.as_str());
            let category_name = store
                .and_then(|s| s.category(&line_item.category_id))
                .map_or(UNKNOWN, |c| c.name.as_str());

            let store_idx = match stores.iter().position(|g| g.store_id == line_item.store_id) {
                Some(idx) => idx,
                None => {
                    stores.push(StoreGroup {
                        store_id: line_item.store_id.clone(),
                        store_name: store_name.to_string(),
                        categories: Vec::new(),
                    });
                    stores.len() - 1
                }
            };
            let group = &mut stores[store_idx];

            let category_idx = match group
                .categories
                .iter()
                .position(|c| c.category_id == line_item.category_id)
            {
                Some(idx) => idx,
                None => {
                    group.categories.push(CategoryGroup {
                        category_id: line_item.category_id.clone(),
                        category_name: category_name.to_string(),
                        items: Vec::new(),
                    });
                    group.categories.len() - 1
                }
            };
            group.categories[category_idx].items.push(line_item.clone());
        }

        stores.sort_by_key(|g| g.store_name.to_lowercase());
        for store in &mut stores {
            store
                .categories
                .sort_by_key(|c| c.category_name.to_lowercase());
            for category in &mut store.categories {
                category.items.sort_by_key(|li| li.order);
            }
        }
        stores
    }
}

const UNKNOWN: &str = "Unknown";

/// Line items of one store on a list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreGroup {
    pub store_id: String,
    pub store_name: String,
    pub categories: Vec<CategoryGroup>,
}

/// Line items of one category within a [`StoreGroup`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category_id: String,
    pub category_name: String,
    pub items: Vec<LineItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Item, Store};

    fn line(id: &str, item_id: &str, store: &str, category: &str, order: i64) -> LineItem {
        LineItem {
            id: id.to_string(),
            item_id: item_id.to_string(),
            name: item_id.to_uppercase(),
            store_id: store.to_string(),
            category_id: category.to_string(),
            checked: false,
            order,
        }
    }

    #[test]
    fn test_serde_field_names() {
        let mut list = ShoppingList::new("l1", "Weekly");
        list.items.push(line("li1", "i1", "s1", "c1", 0));

        let json = serde_json::to_value(&list).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("archivedAt").is_none());
        assert_eq!(json["shoppingList"][0]["itemId"], "i1");
        assert_eq!(json["shoppingList"][0]["categoryId"], "c1");
    }

    #[test]
    fn test_deserialize_tolerates_missing_fields() {
        let json = r#"{
            "id": "l1",
            "name": "Old",
            "createdAt": "2024-03-01T10:00:00Z",
            "shoppingList": [{"id": "i1", "name": "Milk"}]
        }"#;
        let list: ShoppingList = serde_json::from_str(json).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].item_id, "");
        assert!(!list.items[0].checked);
    }

    #[test]
    fn test_contains_and_next_order() {
        let mut list = ShoppingList::new("l1", "Weekly");
        assert_eq!(list.next_group_order("s1", "c1"), 0);

        list.items.push(line("li1", "i1", "s1", "c1", 4));
        list.items.push(line("li2", "i2", "s1", "c2", 9));
        assert!(list.contains_item("i1"));
        assert!(!list.contains_item("li1"));
        assert_eq!(list.next_group_order("s1", "c1"), 5);
    }

    #[test]
    fn test_grouped_resolves_names_and_unknowns() {
        let catalog = Catalog::new(vec![Store {
            id: "s1".to_string(),
            name: "Market".to_string(),
            order: 0,
            categories: vec![Category {
                id: "c1".to_string(),
                name: "Produce".to_string(),
                order: 0,
                items: vec![Item {
                    id: "i1".to_string(),
                    name: "Apples".to_string(),
                    order: 0,
                }],
            }],
        }]);

        let mut list = ShoppingList::new("l1", "Weekly");
        list.items.push(line("li2", "i2", "s1", "c1", 1));
        list.items.push(line("li1", "i1", "s1", "c1", 0));
        list.items.push(line("li3", "i3", "gone", "c9", 0));

        let groups = list.grouped(&catalog);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].store_name, "Market");
        assert_eq!(groups[0].categories[0].category_name, "Produce");
        let ids: Vec<&str> = groups[0].categories[0]
            .items
            .iter()
            .map(|li| li.id.as_str())
            .collect();
        assert_eq!(ids, vec!["li1", "li2"]);
        assert_eq!(groups[1].store_name, "Unknown");
        assert_eq!(groups[1].categories[0].category_name, "Unknown");
    }
}

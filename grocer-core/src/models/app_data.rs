//! The complete application state as exported, imported and loaded.

use serde::{Deserialize, Serialize};

use super::{Catalog, ShoppingList};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub lists: Vec<ShoppingList>,
    pub archived_lists: Vec<ShoppingList>,
    pub master_stores: Catalog,
}

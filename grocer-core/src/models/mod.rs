mod app_data;
mod catalog;
mod shopping_list;

pub use app_data::AppData;
pub use catalog::{Catalog, Category, Direction, Item, SortMode, Store};
pub use shopping_list::{CategoryGroup, LineItem, ShoppingList, StoreGroup};

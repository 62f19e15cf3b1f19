mod catalog_store;
mod list_store;

pub use catalog_store::ItemEdit;
pub use list_store::ListStore;

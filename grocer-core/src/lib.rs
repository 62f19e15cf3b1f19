//! Grocer Core Library
//!
//! Catalog and shopping list model for Grocer applications, with the
//! engine that keeps them consistent and the adapters that store them.

pub mod engine;
pub mod error;
pub mod id;
pub mod models;
pub mod persistence;
pub mod remote;
pub mod stores;
pub mod transfer;

pub use engine::{copy_message, EngineOptions, GroceryEngine, Intent, Outcome};
pub use error::{EntityKind, GroceryError};
pub use id::new_id;
pub use models::{
    AppData, Catalog, Category, CategoryGroup, Direction, Item, LineItem, ShoppingList, SortMode,
    Store, StoreGroup,
};
pub use persistence::{
    AutomergePersistence, ChangeEvent, DocType, InMemoryPersistence, LoadedData, Persistence,
    PersistenceError,
};
pub use remote::{CopyResponse, RemoteClient, RemoteError};
pub use stores::{ItemEdit, ListStore};
pub use transfer::{parse_import, ExportEnvelope, TransferError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

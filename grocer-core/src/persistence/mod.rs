//! Persistence adapters.
//!
//! The engine changes its in-memory state first and then calls the adapter.
//! Any adapter error makes the engine restore its pre-change state, so an
//! adapter must report failure for every write that did not happen.
//!
//! Adapters also expose a change feed. Events on it are authoritative
//! replacements of one slice of state, typically written by another client.

pub mod automerge;
mod memory;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;

use crate::models::{AppData, Catalog, ShoppingList};

pub use self::automerge::{AutomergePersistence, DocType};
pub use memory::InMemoryPersistence;

/// Everything an adapter hands back at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedData {
    pub data: AppData,
    /// List selected when the previous session ended, if remembered.
    pub active_list_id: Option<String>,
}

/// A slice of state changed outside this engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ChangeEvent {
    Catalog(Catalog),
    Lists(Vec<ShoppingList>),
    ArchivedLists(Vec<ShoppingList>),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document error: {0}")]
    Document(#[from] ::automerge::AutomergeError),

    #[error("Failed to read {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage for the catalog and lists.
///
/// Lists live in one of two buckets, active and archived. `save_list`
/// writes to the bucket matching the list's `archived_at`.
pub trait Persistence: Send {
    fn load_all(&mut self) -> Result<LoadedData, PersistenceError>;

    fn save_catalog(&mut self, catalog: &Catalog) -> Result<(), PersistenceError>;

    /// Write the whole list, replacing any stored copy.
    fn save_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError>;

    /// Remove a list from the active bucket.
    fn delete_list(&mut self, list_id: &str) -> Result<(), PersistenceError>;

    /// Move a list from the active bucket to the archived bucket.
    fn archive_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError>;

    /// Move a list from the archived bucket back to the active bucket.
    fn restore_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError>;

    fn delete_archived_list(&mut self, list_id: &str) -> Result<(), PersistenceError>;

    /// Replace all stored state, used by import.
    fn replace_all(&mut self, data: &AppData) -> Result<(), PersistenceError>;

    /// Remember the selected list between sessions.
    fn save_active_list_id(&mut self, list_id: &str) -> Result<(), PersistenceError>;

    /// Receive changes as they land. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;

    /// Fold in a document written by another device and return the merged
    /// slice. Adapters without mergeable documents refuse.
    fn merge_remote(
        &mut self,
        doc_type: DocType,
        _bytes: &[u8],
    ) -> Result<ChangeEvent, PersistenceError> {
        Err(PersistenceError::Unavailable(format!(
            "{} documents cannot be merged by this storage",
            doc_type
        )))
    }
}

/// Fan-out point for change events.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Send an event to current subscribers. Having none is fine.
    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.send(event).is_err() {
            trace!("No subscribers for change event");
        }
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

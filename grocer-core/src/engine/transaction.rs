//! Pre-change snapshots used to undo an optimistic update.

use crate::models::{Catalog, ShoppingList};
use crate::stores::ListStore;

#[derive(Debug)]
enum Checkpoint {
    Catalog(Catalog),
    /// One list, restored into whichever bucket it lives in.
    List(ShoppingList),
    /// Every list plus the selection, for structural changes and fan-out.
    Lists(ListStore),
}

/// Captures the slices an operation is about to change.
///
/// Dropping or committing discards the snapshots. `rollback` puts them
/// back, newest first.
#[derive(Debug, Default)]
pub(crate) struct Transaction {
    checkpoints: Vec<Checkpoint>,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn catalog(mut self, catalog: &Catalog) -> Self {
        self.checkpoints.push(Checkpoint::Catalog(catalog.clone()));
        self
    }

    pub(crate) fn list(mut self, list: &ShoppingList) -> Self {
        self.checkpoints.push(Checkpoint::List(list.clone()));
        self
    }

    pub(crate) fn lists(mut self, lists: &ListStore) -> Self {
        self.checkpoints.push(Checkpoint::Lists(lists.clone()));
        self
    }

    pub(crate) fn rollback(self, catalog: &mut Catalog, lists: &mut ListStore) {
        for checkpoint in self.checkpoints.into_iter().rev() {
            match checkpoint {
                Checkpoint::Catalog(snapshot) => *catalog = snapshot,
                Checkpoint::List(snapshot) => lists.restore_snapshot(snapshot),
                Checkpoint::Lists(snapshot) => *lists = snapshot,
            }
        }
    }
}

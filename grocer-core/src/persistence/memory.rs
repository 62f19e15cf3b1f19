//! In-process persistence with failure injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use super::{ChangeEvent, ChangeHub, LoadedData, Persistence, PersistenceError};
use crate::models::{AppData, Catalog, ShoppingList};

#[derive(Debug, Default)]
struct MemoryState {
    data: AppData,
    active_list_id: Option<String>,
}

/// Keeps everything in memory. Clones share the same state, so a test can
/// keep a handle after giving one to the engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistence {
    state: Arc<Mutex<MemoryState>>,
    fail_next: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    fail_after: Arc<Mutex<Option<usize>>>,
    hub: ChangeHub,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `data`.
    pub fn with_data(data: AppData) -> Self {
        let persistence = Self::default();
        persistence.lock().data = data;
        persistence
    }

    /// Make the next `count` write calls fail.
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Let `successes` more calls through, then fail the one after.
    pub fn fail_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap_or_else(|p| p.into_inner()) = Some(successes);
    }

    /// Make every call fail until switched off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of what has been stored.
    pub fn stored(&self) -> AppData {
        self.lock().data.clone()
    }

    pub fn stored_active_list_id(&self) -> Option<String> {
        self.lock().active_list_id.clone()
    }

    /// Store `event` as if another client wrote it, and announce it.
    pub fn publish_external(&self, event: ChangeEvent) {
        {
            let mut state = self.lock();
            match &event {
                ChangeEvent::Catalog(catalog) => state.data.master_stores = catalog.clone(),
                ChangeEvent::Lists(lists) => state.data.lists = lists.clone(),
                ChangeEvent::ArchivedLists(lists) => state.data.archived_lists = lists.clone(),
            }
        }
        self.hub.publish(event);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("storage is offline".to_string()));
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistenceError::Unavailable("injected failure".to_string()));
        }
        let mut fail_after = self.fail_after.lock().unwrap_or_else(|p| p.into_inner());
        match *fail_after {
            Some(0) => {
                *fail_after = None;
                return Err(PersistenceError::Unavailable("injected failure".to_string()));
            }
            Some(n) => *fail_after = Some(n - 1),
            None => {}
        }
        Ok(())
    }
}

fn upsert(lists: &mut Vec<ShoppingList>, list: &ShoppingList) {
    match lists.iter_mut().find(|l| l.id == list.id) {
        Some(slot) => *slot = list.clone(),
        None => lists.push(list.clone()),
    }
}

impl Persistence for InMemoryPersistence {
    fn load_all(&mut self) -> Result<LoadedData, PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("storage is offline".to_string()));
        }
        let state = self.lock();
        Ok(LoadedData {
            data: state.data.clone(),
            active_list_id: state.active_list_id.clone(),
        })
    }

    fn save_catalog(&mut self, catalog: &Catalog) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().data.master_stores = catalog.clone();
        Ok(())
    }

    fn save_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError> {
        self.check()?;
        let mut state = self.lock();
        if list.is_archived() {
            upsert(&mut state.data.archived_lists, list);
        } else {
            upsert(&mut state.data.lists, list);
        }
        Ok(())
    }

    fn delete_list(&mut self, list_id: &str) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().data.lists.retain(|l| l.id != list_id);
        Ok(())
    }

    fn archive_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError> {
        self.check()?;
        let mut state = self.lock();
        state.data.lists.retain(|l| l.id != list.id);
        state.data.archived_lists.retain(|l| l.id != list.id);
        state.data.archived_lists.insert(0, list.clone());
        Ok(())
    }

    fn restore_list(&mut self, list: &ShoppingList) -> Result<(), PersistenceError> {
        self.check()?;
        let mut state = self.lock();
        state.data.archived_lists.retain(|l| l.id != list.id);
        upsert(&mut state.data.lists, list);
        Ok(())
    }

    fn delete_archived_list(&mut self, list_id: &str) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().data.archived_lists.retain(|l| l.id != list_id);
        Ok(())
    }

    fn replace_all(&mut self, data: &AppData) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().data = data.clone();
        Ok(())
    }

    fn save_active_list_id(&mut self, list_id: &str) -> Result<(), PersistenceError> {
        self.check()?;
        self.lock().active_list_id = Some(list_id.to_string());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.hub.subscribe()
    }
}

//! Shared application state for the server.

use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::{self, JoinError};

use grocer_core::{ChangeEvent, GroceryEngine, Persistence};

/// The engine behind a mutex. Handlers lock it for the duration of one
/// operation; engine calls never await.
///
/// Engine calls that write go through [`AppState::write`], since storage
/// writes are synchronous file I/O. Other requests queue on the lock while
/// a write is in flight.
pub struct AppState<P: Persistence> {
    engine: Arc<Mutex<GroceryEngine<P>>>,
}

impl<P: Persistence> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<P: Persistence> AppState<P> {
    pub fn new(engine: GroceryEngine<P>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn engine(&self) -> MutexGuard<'_, GroceryEngine<P>> {
        self.engine.lock().await
    }

    /// Runs `op` with the engine locked, on the blocking thread pool.
    pub async fn write<T, F>(&self, op: F) -> Result<T, JoinError>
    where
        P: 'static,
        T: Send + 'static,
        F: FnOnce(&mut GroceryEngine<P>) -> T + Send + 'static,
    {
        let mut engine = Arc::clone(&self.engine).lock_owned().await;
        task::spawn_blocking(move || op(&mut engine)).await
    }

    /// Receiver for the adapter's change feed.
    pub async fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.engine.lock().await.subscribe()
    }
}

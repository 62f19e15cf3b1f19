//! API route configuration.

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::state::AppState;
use super::websocket::ws_handler;
use grocer_core::Persistence;

/// Build the application router.
pub fn create_router<P: Persistence + 'static>(state: AppState<P>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/state", get(handlers::get_state::<P>))
        .route("/api/intents", post(handlers::dispatch_intent::<P>))
        .route(
            "/api/lists/{destination_id}/copy-from/{source_id}",
            post(handlers::copy_from::<P>),
        )
        .route("/api/export", get(handlers::export::<P>))
        .route("/api/import", post(handlers::import::<P>))
        .route("/api/sync/{doc_type}", post(handlers::sync_document::<P>))
        .route("/ws", get(ws_handler::<P>))
        .with_state(state)
}

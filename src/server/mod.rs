//! HTTP server exposing the grocery engine.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod websocket;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;

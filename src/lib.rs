//! Grocer application crate: configuration and the HTTP server, shared by
//! the `grocer` CLI and the `grocer-server` binary.

pub mod config;
pub mod server;

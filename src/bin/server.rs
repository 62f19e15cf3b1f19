//! Grocer Server
//!
//! Serves one catalog and its shopping lists over HTTP, with a WebSocket
//! feed of changes.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GROCER_PORT`: Port to listen on (default: 8080)
//! - `GROCER_DATA_DIR`: Directory to store documents (default: ~/.local/share/grocer-server)
//! - `GROCER_DEFAULT_CATEGORY`: Category new stores start with (default: General)
//! - `GROCER_DEFAULT_LIST`: Name of the list created when none exists (default: My First List)
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /api/state`: Catalog, lists and the active list id
//! - `POST /api/intents`: Run one engine operation
//! - `POST /api/lists/{destinationId}/copy-from/{sourceId}`: Copy list items
//! - `GET /api/export`, `POST /api/import`: Whole-state transfer
//! - `GET /ws`: Change feed

use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grocer::server::{create_router, AppState};
use grocer_core::{AutomergePersistence, EngineOptions, GroceryEngine};

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    port: u16,
    data_dir: PathBuf,
    options: EngineOptions,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("GROCER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("GROCER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("grocer-server")
            });

        let mut options = EngineOptions {
            seed_catalog: true,
            ..EngineOptions::default()
        };
        if let Ok(name) = std::env::var("GROCER_DEFAULT_CATEGORY") {
            options.default_category = name;
        }
        if let Ok(name) = std::env::var("GROCER_DEFAULT_LIST") {
            options.default_list_name = name;
        }

        Self {
            port,
            data_dir,
            options,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "grocer_server=info,grocer=info,grocer_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(Config::from_env()).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Data directory: {}", config.data_dir.display());

    let persistence = AutomergePersistence::open(config.data_dir)?;
    let engine = GroceryEngine::load(persistence, config.options)?;
    let app = create_router(AppState::new(engine)).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

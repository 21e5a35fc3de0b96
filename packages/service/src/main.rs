//! FragmentForge Service Binary
//!
//! Wires the clone pipeline (embedded graph store, local request bus,
//! cloner, dispatcher) and exposes the HTTP intake.
//!
//! # Environment Variables
//!
//! - `FORGE_DATABASE_PATH`: graph database directory (default `./data/fragmentforge.db`)
//! - `FORGE_HTTP_PORT`: intake port (default 3100)
//! - `RUST_LOG`: logging filter (e.g. "info", "debug")

mod config;
mod http;

use config::ServiceConfig;
use fragmentforge_core::bus::{LocalBus, RequestBus};
use fragmentforge_core::db::SurrealStore;
use fragmentforge_core::id::UuidIds;
use fragmentforge_core::services::{Dispatcher, FragmentCloner};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    tracing::info!(
        database = %config.database_path.display(),
        port = config.http_port,
        "starting fragmentforge service"
    );

    if let Some(parent) = config.database_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let store = Arc::new(SurrealStore::new(config.database_path.clone()).await?);
    tracing::info!("connected to graph store");

    let (bus, inbox) = LocalBus::channel(64);
    let bus = Arc::new(bus);
    let cloner = Arc::new(FragmentCloner::new(
        store.clone(),
        Arc::new(UuidIds),
        bus.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(store, cloner));
    LocalBus::serve(inbox, dispatcher);

    let state = http::AppState {
        bus: bus as Arc<dyn RequestBus>,
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "http intake listening");
    axum::serve(listener, app).await?;

    Ok(())
}

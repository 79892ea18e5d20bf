//! FMS Arena - field control loop
//!
//! Opens the team and match store, loads the test match, and ticks the arena
//! until interrupted. Operator actions arrive through the library API.

use std::sync::Arc;

use fms_arena::{Arena, ArenaConfig, ArenaHandle, NoopConnectionFactory};
use fms_store::RocksStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fms_arena=debug,fms_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FMS Arena");

    // Load configuration from environment
    let config = ArenaConfig::from_env()?;
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    // Initialize store
    let store = Arc::new(RocksStore::open(&data_dir)?);
    tracing::info!(data_dir = %data_dir, "Initialized RocksDB store");

    // No driver station transport yet; robots are never reported linked
    let factory = Arc::new(NoopConnectionFactory::new());

    let arena = Arena::new(store, factory, config).await?;
    let handle = ArenaHandle::new(arena);

    handle
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;

    let snapshot = handle.snapshot();
    tracing::info!(
        state = ?snapshot.match_state,
        match_id = %snapshot.match_id,
        "FMS Arena stopped"
    );
    Ok(())
}

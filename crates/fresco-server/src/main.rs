//! # fresco-server
//!
//! HTTP backend for the Fresco social network.
//!
//! This binary provides:
//! - **Accounts & sessions**: registration, login, bearer-token sessions
//! - **Profiles**: partial updates, password change, avatar upload
//! - **Follow graph**: follow/unfollow/toggle with live edge counts
//! - **Posts**: image upload, feed assembly, caption editing, like toggle
//! - **Comments**: one-level threads with eager reply loading
//! - **Image serving**: read-through from the bucket-based media store
//!
//! Persistence lives in the `fresco-store` crate (SQLite).

mod api;
mod auth;
mod comments;
mod config;
mod error;
mod follow;
mod media_store;
mod pagination;
mod payload;
mod posts;
mod profile;
mod validate;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use fresco_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::media_store::MediaStore;

/// How often the expired-session purge runs.
const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fresco_server=debug")),
        )
        .init();

    info!("Starting Fresco server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Database (runs migrations on open)
    let db = Arc::new(match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    });

    // Media store (creates bucket directories if missing)
    let media = Arc::new(
        MediaStore::new(config.media_storage_path.clone(), config.max_image_size).await?,
    );

    let http_addr = config.http_addr;
    let state = AppState {
        db,
        media,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic purge of expired sessions.
    let purge_db = state.db.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            if let Err(e) = purge_db.purge_expired_sessions() {
                tracing::warn!(error = %e, "session purge failed");
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

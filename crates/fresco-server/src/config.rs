//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.  When unset, the store picks
    /// the platform data directory.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// Filesystem path under which uploaded images are stored, one
    /// subdirectory per bucket (`posts`, `profile`).
    /// Env: `MEDIA_STORAGE_PATH`
    /// Default: `./media`
    pub media_storage_path: PathBuf,

    /// Public base URL used to derive image URLs in responses.
    /// Env: `BASE_URL`
    /// Default: `http://localhost:8080`
    pub base_url: String,

    /// How long a session token stays valid.
    /// Env: `SESSION_TTL_HOURS`
    /// Default: 720 (30 days)
    pub session_ttl: Duration,

    /// Maximum accepted image size in bytes.
    /// Env: `MAX_IMAGE_SIZE`
    /// Default: 2 MiB
    pub max_image_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            database_path: None,
            media_storage_path: PathBuf::from("./media"),
            base_url: "http://localhost:8080".to_string(),
            session_ttl: Duration::hours(720),
            max_image_size: 2 * 1024 * 1024, // 2 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("MEDIA_STORAGE_PATH") {
            config.media_storage_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("BASE_URL") {
            // Stored without a trailing slash so URL derivation can join
            // with a single '/'.
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("SESSION_TTL_HOURS") {
            if let Ok(hours) = val.parse::<i64>() {
                config.session_ttl = Duration::hours(hours);
            } else {
                tracing::warn!(value = %val, "Invalid SESSION_TTL_HOURS, using default");
            }
        }

        if let Ok(val) = std::env::var("MAX_IMAGE_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_image_size = n;
            } else {
                tracing::warn!(value = %val, "Invalid MAX_IMAGE_SIZE, using default");
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

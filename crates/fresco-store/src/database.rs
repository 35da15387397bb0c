//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.  Access goes through an
//! internal mutex so the handle can be shared with the async HTTP layer;
//! every query is short and single-row-ish, so contention is not a concern
//! at this scale.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/fresco/fresco.db`
    /// - macOS:   `~/Library/Application Support/com.fresco.fresco/fresco.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\fresco\fresco\data\fresco.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "fresco", "fresco").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("fresco.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is what the server binary uses (the path comes from
    /// configuration), and what tests use with a temp directory.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.  Used by tests.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock and return the underlying connection.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for transactions or ad-hoc queries.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn().path().map(PathBuf::from)
    }
}

/// Read a TEXT column as a [`uuid::Uuid`].
pub(crate) fn uuid_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<uuid::Uuid> {
    let s: String = row.get(idx)?;
    uuid::Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read a TEXT column as an RFC-3339 [`chrono::DateTime<Utc>`].
pub(crate) fn ts_col(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let s: String = row.get(idx)?;
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Map `QueryReturnedNoRows` to [`StoreError::NotFound`], everything else to
/// [`StoreError::Sqlite`].
pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write (duplicate follow edge,
    /// username or email already in use, ...).
    #[error("Record already exists")]
    Conflict,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

impl StoreError {
    /// Map a rusqlite error to [`StoreError::Conflict`] when it is a
    /// constraint violation, so callers can distinguish duplicates from
    /// genuine storage failures.
    pub(crate) fn from_write(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Sqlite(e),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

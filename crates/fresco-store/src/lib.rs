//! # fresco-store
//!
//! SQLite persistence for the Fresco social backend.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` behind a mutex and provides typed CRUD helpers for
//! every domain model: users, sessions, the follow graph, posts, likes and
//! comments.  Migrations run on open, so a `Database` is always at the
//! current schema version.

pub mod comments;
pub mod database;
pub mod follows;
pub mod likes;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod sessions;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;

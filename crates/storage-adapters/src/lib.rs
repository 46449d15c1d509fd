//! # Storage adapters
//!
//! Persistence (SQLite via sqlx) and object storage (local filesystem)
//! implementations of the `domains` ports, each behind its own feature.

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "media-local")]
pub mod local_media;

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "media-local")]
pub use local_media::LocalMediaStorage;

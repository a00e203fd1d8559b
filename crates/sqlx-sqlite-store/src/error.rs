//! Error types for sqlx-sqlite-store

use thiserror::Error;

/// Errors that may occur while operating on a [`SqliteStore`](crate::SqliteStore)
#[derive(Error, Debug)]
pub enum Error {
   /// Filesystem error while creating or deleting database files
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// Error reported by the SQLx driver
   #[error("sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// The store has been closed and can no longer hand out connections
   #[error("store has been closed")]
   Closed,
}

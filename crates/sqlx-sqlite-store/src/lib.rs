//! # sqlx-sqlite-store
//!
//! A small wrapper around SQLx that owns a single SQLite file and enforces
//! a pragmatic connection policy: many concurrent readers, exactly one
//! writer.
//!
//! ## Core Types
//!
//! - **[`SqliteStore`]**: the store handle, with a read-only pool and a
//!   single-connection write pool
//! - **[`StoreConfig`]**: pool sizing and idle-timeout settings
//! - **[`WriteGuard`]**: RAII guard over the one write connection
//! - **[`Error`]**: error type for store operations
//!
//! ## Architecture
//!
//! - **Shared reads**: SELECTs run against a read-only pool, so multiple
//!   readers proceed in parallel
//! - **Exclusive writes**: the write pool holds one connection; acquiring
//!   it is the process-wide serialization point for writers
//! - **Lazy WAL**: journal mode switches to WAL on the first writer
//!   acquisition, letting readers continue during writes
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_store::{SqliteStore, StoreConfig};
//!
//! # async fn example() -> sqlx_sqlite_store::Result<()> {
//! let store = SqliteStore::open("app.db", StoreConfig::default()).await?;
//!
//! let rows = sqlx::query("SELECT * FROM user")
//!     .fetch_all(store.read_pool()?)
//!     .await?;
//!
//! let mut writer = store.acquire_writer().await?;
//! sqlx::query("INSERT INTO user (name) VALUES (?)")
//!     .bind("alice")
//!     .execute(&mut *writer)
//!     .await?;
//! drop(writer);
//!
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod store;
mod write_guard;

pub use config::StoreConfig;
pub use error::Error;
pub use store::SqliteStore;
pub use write_guard::WriteGuard;

/// A type alias for Results with this crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

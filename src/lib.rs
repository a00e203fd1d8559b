//! # sqlx-sqlite-versioned
//!
//! A versioned SQLite access layer built on SQLx: one named database file,
//! a requested schema version, and creation/migration hooks that are
//! guaranteed to run exactly once before any query or execute call
//! observes the store.
//!
//! ## Core Types
//!
//! - **[`VersionedDatabaseBuilder`]**: collects {directory, name, version}
//!   plus the optional `on_create` / `on_migrate` / `logger` hooks and
//!   freezes them into an immutable handle
//! - **[`VersionedDatabase`]**: the handle — `raw_query`, `fetch_all`,
//!   `exec_sql`, `exec_sql_with`, `exec_sql_batch`, `close`
//! - **[`Error`]**: error taxonomy with machine-readable codes
//!
//! ## Lifecycle
//!
//! The database opens lazily on the first call. A fresh file gets
//! `on_create` once; a file at an older version gets `on_migrate` once per
//! version step, ascending; a file already at the requested version gets
//! neither. The whole run executes inside one transaction and the stored
//! `PRAGMA user_version` moves to the requested version only when it
//! succeeds. Concurrent first calls block until the single lifecycle run
//! finishes, then proceed against the initialized schema. Downgrades are
//! refused.
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_versioned::VersionedDatabaseBuilder;
//! use serde_json::json;
//!
//! # async fn example() -> sqlx_sqlite_versioned::Result<()> {
//! let db = VersionedDatabaseBuilder::new("/data/app-private", "app.db", 1)
//!    .on_create(|conn| {
//!       Box::pin(async move {
//!          sqlx::query("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)")
//!             .execute(&mut *conn)
//!             .await?;
//!          Ok(())
//!       })
//!    })
//!    .logger(|line| eprintln!("db: {line}"))
//!    .build()?;
//!
//! db.exec_sql_with("INSERT INTO user (id, name) VALUES (?, ?)", vec![json!(1), json!("alice")])
//!    .await?;
//!
//! let names = db
//!    .raw_query("SELECT name FROM user ORDER BY id", vec![], |row| {
//!       use sqlx::Row;
//!       Ok(row.try_get::<String, _>("name")?)
//!    })
//!    .await?;
//! assert_eq!(names, vec!["alice".to_string()]);
//!
//! db.close().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod decode;
mod error;
mod lifecycle;
mod wrapper;

pub use builder::{CreateHook, LogSink, MigrateHook, VersionedDatabaseBuilder};
pub use decode::{row_to_json, value_to_json};
pub use error::{Error, Result};
pub use wrapper::{VersionedDatabase, bind_value};

// Re-export the store layer for callers that need direct pool access
pub use sqlx_sqlite_store::{SqliteStore, StoreConfig, WriteGuard};

//! The store handle: one SQLite file, shared readers, one writer

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, Pool, Sqlite};
use tracing::debug;

use crate::Result;
use crate::config::StoreConfig;
use crate::error::Error;
use crate::write_guard::WriteGuard;

/// Handle to a single SQLite database file.
///
/// Reads go through [`read_pool`](Self::read_pool), a pool of read-only
/// connections that permits concurrent readers. Writes go through
/// [`acquire_writer`](Self::acquire_writer), which hands out the one
/// read-write connection; concurrent writers queue on the pool's FIFO
/// acquire. WAL journal mode is enabled on the first writer acquisition.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_store::{SqliteStore, StoreConfig};
///
/// # async fn example() -> sqlx_sqlite_store::Result<()> {
/// let store = SqliteStore::open("app.db", StoreConfig::default()).await?;
///
/// let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
///     .fetch_one(store.read_pool()?)
///     .await?;
///
/// let mut writer = store.acquire_writer().await?;
/// sqlx::query("DELETE FROM user WHERE id = ?")
///     .bind(1_i64)
///     .execute(&mut *writer)
///     .await?;
/// drop(writer);
///
/// store.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteStore {
   /// Read-only pool for concurrent SELECTs
   read_pool: Pool<Sqlite>,

   /// Read-write pool capped at one connection; its acquire order is the
   /// write serialization point
   write_conn: Pool<Sqlite>,

   /// Whether WAL mode has been switched on yet
   wal_ready: AtomicBool,

   /// Refuses further handouts once set
   closed: AtomicBool,

   /// Location of the database file, kept for file cleanup
   path: PathBuf,
}

impl SqliteStore {
   /// Open the database file at `path`, creating it if missing.
   ///
   /// WAL mode is not touched here; it is enabled lazily by
   /// [`acquire_writer`](Self::acquire_writer).
   pub async fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
      let path = path.as_ref();

      if path.as_os_str().is_empty() {
         return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "database path must not be empty",
         )));
      }

      let path = path.to_path_buf();

      // Read-only connections cannot create a missing file, and the first
      // statement through this store may well be a read. A short-lived
      // writable connection creates the file up front.
      if !path.exists() && !is_memory(&path) {
         let conn = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .read_only(false)
            .connect()
            .await?;
         drop(conn);
      }

      let read_options = SqliteConnectOptions::new().filename(&path).read_only(true);

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.max_readers)
         .min_connections(0)
         .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
         .connect_with(read_options)
         .await?;

      let write_options = SqliteConnectOptions::new().filename(&path).read_only(false);

      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .min_connections(0)
         .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
         .connect_with(write_options)
         .await?;

      debug!("opened sqlite store at {}", path.display());

      Ok(Self {
         read_pool,
         write_conn,
         wal_ready: AtomicBool::new(false),
         closed: AtomicBool::new(false),
         path,
      })
   }

   /// Location of the database file
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// The pool of read-only connections.
   ///
   /// Fails with [`Error::Closed`] once the store has been closed.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      if self.closed.load(Ordering::SeqCst) {
         return Err(Error::Closed);
      }
      Ok(&self.read_pool)
   }

   /// Take exclusive hold of the write connection.
   ///
   /// At most one [`WriteGuard`] is live at a time; further callers wait in
   /// the pool's acquire queue. The first acquisition switches the database
   /// to WAL journal mode with `synchronous = NORMAL`.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      if self.closed.load(Ordering::SeqCst) {
         return Err(Error::Closed);
      }

      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_ready.load(Ordering::SeqCst) {
         sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&mut *conn)
            .await?;

         // https://www.sqlite.org/wal.html#performance_considerations
         sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&mut *conn)
            .await?;

         self.wal_ready.store(true, Ordering::SeqCst);
      }

      Ok(WriteGuard::new(conn))
   }

   /// Close both pools.
   ///
   /// Waits for outstanding readers to drain, checkpoints the WAL if a
   /// writer ever ran, then shuts the write connection. A second close, or
   /// any later operation, fails with [`Error::Closed`].
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::SeqCst) {
         return Err(Error::Closed);
      }

      self.read_pool.close().await;

      // Flush and truncate the WAL before the write connection goes away
      if self.wal_ready.load(Ordering::SeqCst)
         && let Ok(mut conn) = self.write_conn.acquire().await
      {
         let _ = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&mut *conn)
            .await;
      }

      self.write_conn.close().await;

      Ok(())
   }

   /// Close the store and delete the database file along with its WAL and
   /// SHM siblings. Use with caution!
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      if is_memory(&self.path) {
         return Ok(());
      }

      std::fs::remove_file(&self.path)?;

      // WAL and SHM files only exist if a writer ran; ignore "not found"
      for sibling in [
         self.path.with_extension("db-wal"),
         self.path.with_extension("db-shm"),
      ] {
         if let Err(e) = std::fs::remove_file(&sibling)
            && e.kind() != std::io::ErrorKind::NotFound
         {
            return Err(Error::Io(e));
         }
      }

      Ok(())
   }
}

fn is_memory(path: &Path) -> bool {
   path.as_os_str() == ":memory:"
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn memory_path_detection() {
      assert!(is_memory(Path::new(":memory:")));
      assert!(!is_memory(Path::new("memory.db")));
      assert!(!is_memory(Path::new("/tmp/app.db")));
   }
}

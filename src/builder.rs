//! Configuration builder producing an immutable [`VersionedDatabase`]

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx::sqlite::SqliteConnection;
use sqlx_sqlite_store::StoreConfig;

use crate::error::{Error, Result};
use crate::wrapper::VersionedDatabase;

/// Hook invoked once when the database file is seen for the first time.
///
/// Receives the write connection for the duration of the call; the schema
/// it creates is stamped with the requested version when the hook returns.
pub type CreateHook =
   Arc<dyn for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<()>> + Send + Sync>;

/// Hook invoked once per version step during an upgrade, in ascending
/// order. The second argument is the step being migrated to.
pub type MigrateHook =
   Arc<dyn for<'c> Fn(&'c mut SqliteConnection, u32) -> BoxFuture<'c, Result<()>> + Send + Sync>;

/// Sink receiving a formatted trace line before each statement executes
/// and for lifecycle events.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Builder for [`VersionedDatabase`].
///
/// Collects the store identity ({directory, name, version}) and the
/// optional hooks, then freezes everything into an immutable handle at
/// [`build`](Self::build). Hooks left unset default to no-ops; the version
/// stamp is written either way.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_versioned::VersionedDatabaseBuilder;
///
/// # fn example() -> sqlx_sqlite_versioned::Result<()> {
/// let db = VersionedDatabaseBuilder::new("/data/app-private", "app.db", 2)
///    .on_create(|conn| {
///       Box::pin(async move {
///          sqlx::query("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)")
///             .execute(&mut *conn)
///             .await?;
///          Ok(())
///       })
///    })
///    .on_migrate(|conn, step| {
///       Box::pin(async move {
///          if step == 2 {
///             sqlx::query("ALTER TABLE user ADD COLUMN gender TEXT")
///                .execute(&mut *conn)
///                .await?;
///          }
///          Ok(())
///       })
///    })
///    .logger(|line| println!("{line}"))
///    .build()?;
/// # Ok(())
/// # }
/// ```
pub struct VersionedDatabaseBuilder {
   pub(crate) directory: PathBuf,
   pub(crate) name: String,
   pub(crate) version: u32,
   pub(crate) on_create: Option<CreateHook>,
   pub(crate) on_migrate: Option<MigrateHook>,
   pub(crate) logger: Option<LogSink>,
   pub(crate) store_config: StoreConfig,
}

impl VersionedDatabaseBuilder {
   /// Start configuring a database named `name` inside `directory`,
   /// requesting schema version `version`.
   pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>, version: u32) -> Self {
      Self {
         directory: directory.into(),
         name: name.into(),
         version,
         on_create: None,
         on_migrate: None,
         logger: None,
         store_config: StoreConfig::default(),
      }
   }

   /// Set the hook that builds the initial schema on a fresh store.
   pub fn on_create<F>(mut self, hook: F) -> Self
   where
      F: for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<()>>
         + Send
         + Sync
         + 'static,
   {
      self.on_create = Some(Arc::new(hook));
      self
   }

   /// Set the hook that upgrades the schema by one version step.
   pub fn on_migrate<F>(mut self, hook: F) -> Self
   where
      F: for<'c> Fn(&'c mut SqliteConnection, u32) -> BoxFuture<'c, Result<()>>
         + Send
         + Sync
         + 'static,
   {
      self.on_migrate = Some(Arc::new(hook));
      self
   }

   /// Set the trace sink. Absent by default.
   pub fn logger<F>(mut self, sink: F) -> Self
   where
      F: Fn(&str) + Send + Sync + 'static,
   {
      self.logger = Some(Arc::new(sink));
      self
   }

   /// Override the store's pool settings.
   pub fn store_config(mut self, config: StoreConfig) -> Self {
      self.store_config = config;
      self
   }

   /// Validate the configuration and freeze it into a handle.
   ///
   /// The database file is not touched here; it opens lazily on the first
   /// query or execute call.
   pub fn build(self) -> Result<VersionedDatabase> {
      if self.version == 0 {
         return Err(Error::InvalidVersion(self.version));
      }
      Ok(VersionedDatabase::from_builder(self))
   }
}

//! Public façade over the store: versioned open, queries, executes

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow, SqliteStatement};
use sqlx::{Executor, Statement};
use sqlx_sqlite_store::{SqliteStore, StoreConfig};
use tokio::sync::Mutex;
use tracing::debug;

use crate::builder::{CreateHook, LogSink, MigrateHook, VersionedDatabaseBuilder};
use crate::decode;
use crate::error::{Error, Result};
use crate::lifecycle::{self, OpenState};

/// Handle to a named, versioned SQLite database.
///
/// Built once via [`VersionedDatabaseBuilder`] and immutable afterwards.
/// The first query or execute call opens the file and runs the creation or
/// migration hooks; every later call reuses the open store. Reads run on a
/// shared pool, writes serialize on the single write connection, and
/// nothing observes the database before the lifecycle run has finished.
///
/// Methods take `&self`; wrap the handle in an [`Arc`] to share it across
/// tasks.
pub struct VersionedDatabase {
   path: PathBuf,
   version: u32,
   on_create: Option<CreateHook>,
   on_migrate: Option<MigrateHook>,
   logger: Option<LogSink>,
   store_config: StoreConfig,
   state: Mutex<OpenState>,
}

impl std::fmt::Debug for VersionedDatabase {
   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      f.debug_struct("VersionedDatabase")
         .field("path", &self.path)
         .field("version", &self.version)
         .field("on_create", &self.on_create.is_some())
         .field("on_migrate", &self.on_migrate.is_some())
         .field("logger", &self.logger.is_some())
         .finish_non_exhaustive()
   }
}

impl VersionedDatabase {
   pub(crate) fn from_builder(builder: VersionedDatabaseBuilder) -> Self {
      Self {
         path: builder.directory.join(&builder.name),
         version: builder.version,
         on_create: builder.on_create,
         on_migrate: builder.on_migrate,
         logger: builder.logger,
         store_config: builder.store_config,
         state: Mutex::new(OpenState::Unopened),
      }
   }

   /// Location of the database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Schema version this handle was built with.
   pub fn version(&self) -> u32 {
      self.version
   }

   fn trace(&self, line: String) {
      debug!("{line}");
      if let Some(sink) = &self.logger {
         sink(&line);
      }
   }

   /// Fetch the open store, running the creation/migration sequence on
   /// first access.
   ///
   /// The state lock is held across the entire open, so exactly one caller
   /// runs the lifecycle; concurrent callers block here and then observe
   /// either the open store or the propagated failure.
   async fn store(&self) -> Result<Arc<SqliteStore>> {
      let mut state = self.state.lock().await;
      match &*state {
         OpenState::Open(store) => return Ok(Arc::clone(store)),
         OpenState::Closed => return Err(Error::Closed),
         OpenState::Failed(reason) => return Err(Error::Lifecycle(reason.clone())),
         OpenState::Unopened => {}
      }

      match self.open_store().await {
         Ok(store) => {
            let store = Arc::new(store);
            *state = OpenState::Open(Arc::clone(&store));
            Ok(store)
         }
         Err(e) => {
            *state = OpenState::Failed(e.to_string());
            Err(e)
         }
      }
   }

   async fn open_store(&self) -> Result<SqliteStore> {
      let store = SqliteStore::open(&self.path, self.store_config.clone()).await?;

      let outcome = lifecycle::run(
         &store,
         self.version,
         self.on_create.as_ref(),
         self.on_migrate.as_ref(),
         |line| self.trace(line),
      )
      .await;

      if let Err(e) = outcome {
         // A half-initialized store must not stay reachable
         let _ = store.close().await;
         return Err(e);
      }

      Ok(store)
   }

   /// Run a SELECT on the shared read pool and map every returned row.
   ///
   /// The statement and its arguments are handed to the logger sink before
   /// execution. Rows are produced eagerly in engine order, first row
   /// included, and `map_row` is applied to each. Argument-count
   /// mismatches fail with [`Error::Arguments`] before anything runs.
   pub async fn raw_query<T, F>(
      &self,
      sql: &str,
      args: Vec<JsonValue>,
      mut map_row: F,
   ) -> Result<Vec<T>>
   where
      F: FnMut(&SqliteRow) -> Result<T>,
   {
      let store = self.store().await?;

      if args.is_empty() {
         self.trace(format!("raw_query: {sql}"));
      } else {
         self.trace(format!("raw_query: {sql}; args: {args:?}"));
      }

      let pool = store.read_pool()?;
      let stmt = Executor::prepare(pool, sql).await?;
      check_argument_count(sql, &stmt, args.len())?;

      let mut query = stmt.query();
      for value in args {
         query = bind_value(query, value);
      }
      let rows = query.fetch_all(pool).await?;

      let mut mapped = Vec::with_capacity(rows.len());
      for row in &rows {
         mapped.push(map_row(row)?);
      }
      Ok(mapped)
   }

   /// Run a SELECT and decode every row into a column-ordered JSON map.
   pub async fn fetch_all(
      &self,
      sql: &str,
      args: Vec<JsonValue>,
   ) -> Result<Vec<IndexMap<String, JsonValue>>> {
      self.raw_query(sql, args, decode::row_to_json).await
   }

   /// Execute a single statement without bound values on the exclusive
   /// writer.
   pub async fn exec_sql(&self, sql: &str) -> Result<()> {
      self.exec_sql_with(sql, Vec::new()).await
   }

   /// Execute a single statement with bound values on the exclusive
   /// writer.
   ///
   /// The writer is held only for the duration of this call.
   pub async fn exec_sql_with(&self, sql: &str, args: Vec<JsonValue>) -> Result<()> {
      let store = self.store().await?;
      let mut writer = store.acquire_writer().await?;

      if args.is_empty() {
         self.trace(format!("exec_sql: {sql}"));
      } else {
         self.trace(format!("exec_sql: {sql}; args: {args:?}"));
      }

      execute_on(&mut *writer, sql, args).await
   }

   /// Execute several statements in the given order on one writer
   /// acquisition.
   ///
   /// Fail-fast: the first failing statement stops the batch, leaving the
   /// effects of earlier statements in place. No transaction is opened
   /// around the batch; each statement commits on its own.
   pub async fn exec_sql_batch<I, S>(&self, statements: I) -> Result<()>
   where
      I: IntoIterator<Item = S>,
      S: AsRef<str>,
   {
      let store = self.store().await?;
      let mut writer = store.acquire_writer().await?;

      for sql in statements {
         let sql = sql.as_ref();
         self.trace(format!("exec_sql: {sql}"));
         execute_on(&mut *writer, sql, Vec::new()).await?;
      }
      Ok(())
   }

   /// Close the store and release its connections.
   ///
   /// Not idempotent: this and every other call made after a close fails
   /// with [`Error::Closed`]. The handle is never silently reopened.
   pub async fn close(&self) -> Result<()> {
      let mut state = self.state.lock().await;
      match std::mem::replace(&mut *state, OpenState::Closed) {
         OpenState::Open(store) => {
            store.close().await?;
            Ok(())
         }
         OpenState::Closed => Err(Error::Closed),
         OpenState::Unopened | OpenState::Failed(_) => Ok(()),
      }
   }
}

/// Prepare-time check that the caller supplied exactly as many bound
/// values as the statement has placeholders.
fn check_argument_count(sql: &str, stmt: &SqliteStatement<'_>, provided: usize) -> Result<()> {
   let expected = match stmt.parameters() {
      Some(sqlx::Either::Left(params)) => params.len(),
      Some(sqlx::Either::Right(count)) => count,
      None => 0,
   };
   if expected != provided {
      return Err(Error::Arguments {
         sql: sql.to_string(),
         expected,
         provided,
      });
   }
   Ok(())
}

async fn execute_on(conn: &mut SqliteConnection, sql: &str, args: Vec<JsonValue>) -> Result<()> {
   let stmt = Executor::prepare(&mut *conn, sql).await?;
   check_argument_count(sql, &stmt, args.len())?;

   let mut query = stmt.query();
   for value in args {
      query = bind_value(query, value);
   }
   query.execute(&mut *conn).await?;
   Ok(())
}

/// Bind a JSON value as a SQLite query argument.
///
/// Integers are preserved as i64 where they fit; u64 values beyond the
/// i64 range degrade to f64. Arrays and objects are bound as JSON text.
pub fn bind_value<'q>(
   query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
   value: JsonValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
   match value {
      JsonValue::Null => query.bind(None::<String>),
      JsonValue::Bool(flag) => query.bind(flag),
      JsonValue::String(text) => query.bind(text),
      JsonValue::Number(number) => {
         if let Some(int) = number.as_i64() {
            query.bind(int)
         } else if let Some(unsigned) = number.as_u64() {
            // Only reached above i64::MAX; precision loss is the best
            // SQLite can do there
            query.bind(unsigned as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}

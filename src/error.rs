/// Result type alias for façade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`VersionedDatabase`](crate::VersionedDatabase).
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error reported by the SQLx driver, surfaced verbatim. Malformed SQL
   /// rejected by the engine arrives here.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the store handle.
   #[error(transparent)]
   Store(#[from] sqlx_sqlite_store::Error),

   /// Bound-argument count does not match the statement's placeholders.
   /// Raised before anything executes.
   #[error("statement expects {expected} bound arguments, got {provided}: {sql}")]
   Arguments {
      sql: String,
      expected: usize,
      provided: usize,
   },

   /// The creation hook failed; the store was left uninitialized.
   #[error("database creation failed: {source}")]
   Create {
      #[source]
      source: Box<Error>,
   },

   /// A migration step failed; the whole run was rolled back.
   #[error("migration to version {step} failed: {source}")]
   Migrate {
      step: u32,
      #[source]
      source: Box<Error>,
   },

   /// The on-disk schema is newer than the requested version. Downgrades
   /// are not supported.
   #[error("cannot open database at version {requested}: on-disk version is {on_disk}")]
   Downgrade { on_disk: u32, requested: u32 },

   /// A previous open attempt failed; replayed to callers arriving after
   /// the failed run.
   #[error("database failed to open: {0}")]
   Lifecycle(String),

   /// The database was closed; every call after `close()` is a caller
   /// error.
   #[error("database has been closed")]
   Closed,

   /// Requested schema version below the minimum of 1.
   #[error("schema version must be at least 1, got {0}")]
   InvalidVersion(u32),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),
}

impl Error {
   /// Extract a structured, machine-readable code from the error.
   ///
   /// Driver-reported database errors expose their native SQLite result
   /// code as `SQLITE_<code>`.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::Store(sqlx_sqlite_store::Error::Closed) | Error::Closed => {
            "DATABASE_CLOSED".to_string()
         }
         Error::Store(_) => "STORE_ERROR".to_string(),
         Error::Arguments { .. } => "ARGUMENT_COUNT_MISMATCH".to_string(),
         Error::Create { .. } => "CREATE_FAILED".to_string(),
         Error::Migrate { .. } => "MIGRATION_FAILED".to_string(),
         Error::Downgrade { .. } => "DOWNGRADE_NOT_SUPPORTED".to_string(),
         Error::Lifecycle(_) => "LIFECYCLE_FAILED".to_string(),
         Error::InvalidVersion(_) => "INVALID_VERSION".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
      }
   }
}

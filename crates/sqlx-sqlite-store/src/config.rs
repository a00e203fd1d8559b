//! Connection pool settings for the store handle

use serde::{Deserialize, Serialize};

/// Pool settings for a [`SqliteStore`](crate::SqliteStore)
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_store::StoreConfig;
///
/// let config = StoreConfig::default();
///
/// let config = StoreConfig {
///     max_readers: 8,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
   /// Size of the read-only pool, bounding how many SELECTs run in parallel.
   ///
   /// Default: 4
   pub max_readers: u32,

   /// Seconds an idle connection may linger before being reclaimed.
   ///
   /// Applies to both the read pool and the write connection.
   ///
   /// Default: 30
   pub idle_timeout_secs: u64,
}

impl Default for StoreConfig {
   fn default() -> Self {
      Self {
         max_readers: 4,
         idle_timeout_secs: 30,
      }
   }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx_sqlite_store::{Error, SqliteStore, StoreConfig};
use tempfile::TempDir;
use tokio::sync::Barrier;

async fn open_store(dir: &TempDir) -> Arc<SqliteStore> {
   let path = dir.path().join("store_test.db");
   let store = SqliteStore::open(&path, StoreConfig::default())
      .await
      .expect("failed to open store");
   Arc::new(store)
}

#[tokio::test]
async fn concurrent_reads_run_in_parallel() {
   let dir = TempDir::new().unwrap();
   let store = open_store(&dir).await;

   let mut writer = store.acquire_writer().await.unwrap();
   sqlx::query("CREATE TABLE numbers (n INTEGER)")
      .execute(&mut *writer)
      .await
      .unwrap();
   for n in 0..12 {
      sqlx::query("INSERT INTO numbers (n) VALUES (?)")
         .bind(n)
         .execute(&mut *writer)
         .await
         .unwrap();
   }
   drop(writer);

   let barrier = Arc::new(Barrier::new(3));
   let (active, max_seen) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

   let handles: Vec<_> = (0..3)
      .map(|_| {
         let (store, barrier, active, max_seen) = (
            Arc::clone(&store),
            Arc::clone(&barrier),
            Arc::clone(&active),
            Arc::clone(&max_seen),
         );

         tokio::spawn(async move {
            barrier.wait().await;
            max_seen.fetch_max(active.fetch_add(1, Ordering::SeqCst) + 1, Ordering::SeqCst);

            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM numbers")
               .fetch_one(store.read_pool().unwrap())
               .await
               .unwrap();

            assert_eq!(count, 12);

            active.fetch_sub(1, Ordering::SeqCst);
         })
      })
      .collect();

   for handle in handles {
      handle.await.unwrap();
   }

   assert_eq!(
      max_seen.load(Ordering::SeqCst),
      3,
      "expected 3 concurrent readers, saw {}",
      max_seen.load(Ordering::SeqCst)
   );

   store.remove().await.unwrap();
}

#[tokio::test]
async fn concurrent_writes_serialize() {
   use std::time::{Duration, Instant};

   let dir = TempDir::new().unwrap();
   let store = open_store(&dir).await;

   let mut writer = store.acquire_writer().await.unwrap();
   sqlx::query("CREATE TABLE counter (id INTEGER PRIMARY KEY, value INTEGER)")
      .execute(&mut *writer)
      .await
      .unwrap();
   sqlx::query("INSERT INTO counter (id, value) VALUES (1, 0)")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   let start = Instant::now();
   let mut handles = vec![];

   for _ in 0..3 {
      let store = Arc::clone(&store);
      handles.push(tokio::spawn(async move {
         let mut writer = store.acquire_writer().await.unwrap();
         tokio::time::sleep(Duration::from_millis(10)).await;
         sqlx::query("UPDATE counter SET value = value + 1 WHERE id = 1")
            .execute(&mut *writer)
            .await
            .unwrap();
      }));
   }

   for handle in handles {
      handle.await.unwrap();
   }

   let (value,): (i64,) = sqlx::query_as("SELECT value FROM counter WHERE id = 1")
      .fetch_one(store.read_pool().unwrap())
      .await
      .unwrap();

   assert_eq!(value, 3, "all 3 writes should have landed");

   // 3 writers each holding the guard for 10ms cannot overlap
   assert!(
      start.elapsed().as_millis() >= 25,
      "serialized writes took {}ms, expected >=25ms",
      start.elapsed().as_millis()
   );

   store.remove().await.unwrap();
}

#[tokio::test]
async fn operations_after_close_fail() {
   let dir = TempDir::new().unwrap();
   let store = open_store(&dir).await;

   store.close().await.unwrap();

   assert!(matches!(store.read_pool().unwrap_err(), Error::Closed));
   assert!(matches!(
      store.acquire_writer().await.unwrap_err(),
      Error::Closed
   ));
   assert!(matches!(store.close().await.unwrap_err(), Error::Closed));
}

#[tokio::test]
async fn wal_mode_set_on_first_write() {
   let dir = TempDir::new().unwrap();
   let store = open_store(&dir).await;

   let mut writer = store.acquire_writer().await.unwrap();

   let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
      .fetch_one(&mut *writer)
      .await
      .unwrap();
   assert_eq!(mode.to_lowercase(), "wal");

   let (sync,): (i32,) = sqlx::query_as("PRAGMA synchronous")
      .fetch_one(&mut *writer)
      .await
      .unwrap();
   assert_eq!(sync, 1, "synchronous should be NORMAL");

   drop(writer);
   store.remove().await.unwrap();
}

#[tokio::test]
async fn remove_deletes_all_files() {
   let dir = TempDir::new().unwrap();
   let path = dir.path().join("removable.db");
   let store = SqliteStore::open(&path, StoreConfig::default())
      .await
      .unwrap();

   // A write creates the WAL and SHM siblings
   let mut writer = store.acquire_writer().await.unwrap();
   sqlx::query("CREATE TABLE t (id INTEGER)")
      .execute(&mut *writer)
      .await
      .unwrap();
   drop(writer);

   assert!(path.exists());

   store.remove().await.unwrap();

   assert!(!path.exists(), "database file should be gone");
   assert!(!path.with_extension("db-wal").exists(), "WAL should be gone");
   assert!(!path.with_extension("db-shm").exists(), "SHM should be gone");
}

#[tokio::test]
async fn empty_path_rejected() {
   let result = SqliteStore::open("", StoreConfig::default()).await;
   assert!(matches!(result.unwrap_err(), Error::Io(_)));
}

#[tokio::test]
async fn custom_config_accepted() {
   let dir = TempDir::new().unwrap();
   let path = dir.path().join("configured.db");

   let config = StoreConfig {
      max_readers: 8,
      idle_timeout_secs: 60,
   };

   let store = SqliteStore::open(&path, config).await.unwrap();
   store.remove().await.unwrap();
}

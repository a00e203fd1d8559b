//! RAII guard over the single write connection

use std::ops::{Deref, DerefMut};

use sqlx::Sqlite;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnection;

/// Exclusive hold on the store's one write connection.
///
/// Because the write pool is capped at a single connection, at most one
/// guard exists at any moment; dropping it returns the connection to the
/// pool and unblocks the next writer in line.
///
/// Derefs to [`SqliteConnection`], so `&mut *guard` works anywhere SQLx
/// expects an executor.
#[derive(Debug)]
pub struct WriteGuard {
   conn: PoolConnection<Sqlite>,
}

impl WriteGuard {
   pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
      Self { conn }
   }
}

impl Deref for WriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &*self.conn
   }
}

impl DerefMut for WriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut *self.conn
   }
}

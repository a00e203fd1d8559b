//! Open-time state machine and the create/migrate run

use std::sync::Arc;

use sqlx_sqlite_store::SqliteStore;
use tracing::{debug, error};

use crate::builder::{CreateHook, MigrateHook};
use crate::error::{Error, Result};

/// States of the lazily opened store.
///
/// The façade holds this behind a mutex. Whoever observes `Unopened` runs
/// the create/migrate sequence while the lock is held, so every other
/// caller blocks until the store is `Open` (proceed) or `Failed` (receive
/// the propagated lifecycle error). `Closed` is terminal.
pub(crate) enum OpenState {
   Unopened,
   Open(Arc<SqliteStore>),
   Failed(String),
   Closed,
}

/// Bring a freshly opened store up to `requested`, invoking the hooks as
/// the on-disk version dictates.
///
/// The whole run, version stamp included, executes inside one IMMEDIATE
/// transaction on the write connection. `user_version` lives in the
/// database header and participates in the transaction, so a failed hook
/// rolls everything back and the store looks untouched afterwards.
pub(crate) async fn run(
   store: &SqliteStore,
   requested: u32,
   on_create: Option<&CreateHook>,
   on_migrate: Option<&MigrateHook>,
   mut trace: impl FnMut(String),
) -> Result<()> {
   let mut writer = store.acquire_writer().await?;

   let (on_disk,): (i64,) = sqlx::query_as("PRAGMA user_version")
      .fetch_one(&mut *writer)
      .await?;
   let on_disk = on_disk as u32;

   if on_disk == requested {
      debug!("schema already at version {requested}");
      return Ok(());
   }
   if on_disk > requested {
      return Err(Error::Downgrade {
         on_disk,
         requested,
      });
   }

   sqlx::query("BEGIN IMMEDIATE").execute(&mut *writer).await?;

   let outcome = async {
      if on_disk == 0 {
         trace(format!("creating schema at version {requested}"));
         if let Some(hook) = on_create {
            hook(&mut *writer).await.map_err(|e| Error::Create {
               source: Box::new(e),
            })?;
         }
      } else {
         for step in on_disk + 1..=requested {
            trace(format!("migrating schema to version {step}"));
            if let Some(hook) = on_migrate {
               hook(&mut *writer, step).await.map_err(|e| Error::Migrate {
                  step,
                  source: Box::new(e),
               })?;
            }
         }
      }

      // PRAGMA takes no bind parameters
      sqlx::query(&format!("PRAGMA user_version = {requested}"))
         .execute(&mut *writer)
         .await?;

      Ok::<(), Error>(())
   }
   .await;

   match outcome {
      Ok(()) => {
         sqlx::query("COMMIT").execute(&mut *writer).await?;
         debug!("schema now at version {requested} (was {on_disk})");
         Ok(())
      }
      Err(e) => {
         if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *writer).await {
            error!("rollback after failed lifecycle run also failed: {rollback_err}");
         }
         Err(e)
      }
   }
}

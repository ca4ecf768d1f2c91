// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, migrations, and change
//! notification.
//!
//! All access is serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};
use tsundoku_config::model::StorageConfig;
use tsundoku_core::{SystemError, TsundokuError};

use crate::migrations;

/// Convert a tokio-rusqlite error into a `TsundokuError`.
///
/// Column type mismatches are decoding defects and surface as system errors;
/// everything else is a storage failure.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TsundokuError {
    match e {
        tokio_rusqlite::Error::Error(
            err @ (rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)),
        ) => SystemError::RecordCast {
            message: err.to_string(),
        }
        .into(),
        other => TsundokuError::storage(other),
    }
}

/// Handle to the registry database.
///
/// Cloning is cheap: clones share the same background connection and the same
/// change counter.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    changes: Arc<watch::Sender<u64>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open the database described by the storage configuration.
    pub async fn open(config: &StorageConfig) -> Result<Self, TsundokuError> {
        Self::open_path(&config.database_path, config.wal_mode).await
    }

    /// Open (creating if needed) a database file and run migrations.
    pub async fn open_path(path: &str, wal_mode: bool) -> Result<Self, TsundokuError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(TsundokuError::storage)?;
        let db = Self::initialize(conn, wal_mode).await?;
        info!(path, "registry database opened");
        Ok(db)
    }

    /// Open a private in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, TsundokuError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(TsundokuError::storage)?;
        Self::initialize(conn, false).await
    }

    async fn initialize(
        conn: tokio_rusqlite::Connection,
        wal_mode: bool,
    ) -> Result<Self, TsundokuError> {
        let migrated = conn
            .call(move |conn| -> Result<Result<(), refinery::Error>, rusqlite::Error> {
                conn.pragma_update(None, "foreign_keys", true)?;
                conn.busy_timeout(Duration::from_secs(5))?;
                if wal_mode {
                    let mode: String = conn.pragma_update_and_check(
                        None,
                        "journal_mode",
                        "WAL",
                        |row| row.get(0),
                    )?;
                    debug!(%mode, "journal mode set");
                }
                Ok(migrations::run_migrations(conn))
            })
            .await
            .map_err(map_tr_err)?;
        migrated.map_err(TsundokuError::storage)?;

        let (changes, _) = watch::channel(0);
        Ok(Self {
            conn,
            changes: Arc::new(changes),
        })
    }

    /// The underlying connection. All queries go through `call()`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Monotonic counter bumped after every committed write.
    pub fn version(&self) -> u64 {
        *self.changes.borrow()
    }

    /// Subscribe to committed-write notifications.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Record that a write has committed. Called by the query modules only.
    pub(crate) fn notify_changed(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), TsundokuError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

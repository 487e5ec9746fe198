//! SQLite implementations of storage interfaces.
//!
//! SQLite cannot use one connection concurrently, so the store owns exactly
//! one connection behind a mutex. Every operation, read or write, holds the
//! guard until it finishes; transactions run on that same connection.

mod catalog;
mod event_log;
mod policy;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row, SqliteConnection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::payload::Payload;
use crate::storage::schema::{Payloads, ALL_TABLES};
use crate::storage::{Result, StorageError};
use crate::version::Version;

/// SQLite-backed catalog, channel policy store and event log.
pub struct SqliteStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Open a private in-memory database. It lives as long as the store.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let store = Self::connect_with(options).await?;
        store.init().await?;
        Ok(store)
    }

    /// Open a connection with explicit options.
    pub async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let conn = options.connect().await?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Initialize the database schema.
    pub async fn init(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        for ddl in ALL_TABLES {
            sqlx::raw_sql(ddl).execute(&mut *conn).await?;
        }
        debug!("SQLite schema ready");
        Ok(())
    }

    /// Close the underlying connection.
    pub async fn close(self) -> Result<()> {
        self.conn.into_inner().close().await?;
        Ok(())
    }
}

/// Payload columns in the order [`payload_from_row`] reads them.
pub(crate) fn payload_columns() -> [(Payloads, Payloads); 8] {
    [
        (Payloads::Table, Payloads::Id),
        (Payloads::Table, Payloads::Size),
        (Payloads::Table, Payloads::Sha1),
        (Payloads::Table, Payloads::Sha256),
        (Payloads::Table, Payloads::VerBuild),
        (Payloads::Table, Payloads::VerBranch),
        (Payloads::Table, Payloads::VerPatch),
        (Payloads::Table, Payloads::VerTimestamp),
    ]
}

pub(crate) fn payload_from_row(row: &SqliteRow) -> Result<Payload> {
    let size: i64 = row.try_get("size")?;
    let size = u64::try_from(size)
        .map_err(|_| StorageError::CorruptRow(format!("negative payload size {}", size)))?;

    let seconds: i64 = row.try_get("ver_timestamp")?;
    let timestamp =
        DateTime::<Utc>::from_timestamp(seconds, 0).ok_or(StorageError::InvalidTimestamp(seconds))?;

    Ok(Payload {
        id: row.try_get("id")?,
        version: Version::with_timestamp(
            row.try_get("ver_build")?,
            row.try_get("ver_branch")?,
            row.try_get("ver_patch")?,
            timestamp,
        ),
        size,
        sha1: row.try_get("sha1")?,
        sha256: row.try_get("sha256")?,
    })
}

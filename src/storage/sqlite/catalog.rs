//! SQLite PayloadCatalog implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::{Connection, Row, SqliteConnection};
use tracing::debug;

use super::{payload_columns, payload_from_row, SqliteStore};
use crate::payload::Payload;
use crate::storage::schema::{ChannelPayloads, Payloads};
use crate::storage::{PayloadCatalog, Result, StorageError};

impl SqliteStore {
    async fn insert_payload(conn: &mut SqliteConnection, payload: &Payload) -> Result<()> {
        let size = i64::try_from(payload.size).map_err(|_| StorageError::SizeOutOfRange(payload.size))?;
        let version = &payload.version;

        let (sql, values) = Query::insert()
            .into_table(Payloads::Table)
            .columns([
                Payloads::Id,
                Payloads::Size,
                Payloads::Sha1,
                Payloads::Sha256,
                Payloads::VerBuild,
                Payloads::VerBranch,
                Payloads::VerPatch,
                Payloads::VerTimestamp,
            ])
            .values_panic([
                payload.id.as_str().into(),
                size.into(),
                payload.sha1.as_str().into(),
                payload.sha256.as_str().into(),
                version.build().into(),
                version.branch().into(),
                version.patch().into(),
                version.timestamp().timestamp().into(),
            ])
            .build_sqlx(SqliteQueryBuilder);

        sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        Ok(())
    }

    async fn insert_association(conn: &mut SqliteConnection, id: &str, channel: &str) -> Result<()> {
        let (sql, values) = Query::insert()
            .into_table(ChannelPayloads::Table)
            .columns([ChannelPayloads::Payload, ChannelPayloads::Channel])
            .values_panic([id.into(), channel.into()])
            .on_conflict(
                OnConflict::columns([ChannelPayloads::Payload, ChannelPayloads::Channel])
                    .do_nothing()
                    .to_owned(),
            )
            .build_sqlx(SqliteQueryBuilder);

        sqlx::query_with(&sql, values).execute(&mut *conn).await?;
        Ok(())
    }

    async fn delete_rows(conn: &mut SqliteConnection, id: &str) -> Result<()> {
        let (sql, values) = Query::delete()
            .from_table(ChannelPayloads::Table)
            .and_where(Expr::col(ChannelPayloads::Payload).eq(id))
            .build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(&mut *conn).await?;

        let (sql, values) = Query::delete()
            .from_table(Payloads::Table)
            .and_where(Expr::col(Payloads::Id).eq(id))
            .build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(&mut *conn).await?;

        Ok(())
    }

    async fn channels_of(conn: &mut SqliteConnection, id: &str) -> Result<Vec<String>> {
        let (sql, values) = Query::select()
            .column(ChannelPayloads::Channel)
            .from(ChannelPayloads::Table)
            .and_where(Expr::col(ChannelPayloads::Payload).eq(id))
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;
        rows.iter()
            .map(|row| row.try_get("channel").map_err(StorageError::from))
            .collect()
    }
}

#[async_trait]
impl PayloadCatalog for SqliteStore {
    async fn add_payload(&self, payload: &Payload) -> Result<()> {
        let mut conn = self.conn.lock().await;
        Self::insert_payload(&mut conn, payload).await?;

        debug!(
            payload_id = %payload.id,
            size = payload.size,
            version = %payload.version,
            sha1 = %payload.sha1,
            sha256 = %payload.sha256,
            "Added payload"
        );
        Ok(())
    }

    async fn payload_exists(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .expr(Expr::col(Payloads::Id).count())
            .from(Payloads::Table)
            .and_where(Expr::col(Payloads::Id).eq(id))
            .build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values).fetch_one(&mut *conn).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count > 0)
    }

    async fn attach_to_channel(&self, id: &str, channel: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        Self::insert_association(&mut conn, id, channel).await?;

        debug!(payload_id = %id, channel = %channel, "Attached payload to channel");
        Ok(())
    }

    async fn publish_payload(&self, payload: &Payload, channel: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let mut tx = conn.begin().await?;

        Self::insert_payload(&mut tx, payload).await?;
        Self::insert_association(&mut tx, &payload.id, channel).await?;
        tx.commit().await?;

        debug!(
            payload_id = %payload.id,
            version = %payload.version,
            channel = %channel,
            "Published payload"
        );
        Ok(())
    }

    async fn delete_payload(&self, id: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let mut tx = conn.begin().await?;

        Self::delete_rows(&mut tx, id).await?;
        tx.commit().await?;

        debug!(payload_id = %id, "Deleted payload");
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .distinct()
            .column(ChannelPayloads::Channel)
            .from(ChannelPayloads::Table)
            .order_by(ChannelPayloads::Channel, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;
        rows.iter()
            .map(|row| row.try_get("channel").map_err(StorageError::from))
            .collect()
    }

    async fn list_images(&self, channel: &str) -> Result<Vec<Payload>> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .columns(payload_columns())
            .from(Payloads::Table)
            .inner_join(
                ChannelPayloads::Table,
                Expr::col((Payloads::Table, Payloads::Id))
                    .equals((ChannelPayloads::Table, ChannelPayloads::Payload)),
            )
            .and_where(Expr::col((ChannelPayloads::Table, ChannelPayloads::Channel)).eq(channel))
            .order_by((Payloads::Table, Payloads::VerBuild), Order::Asc)
            .order_by((Payloads::Table, Payloads::VerBranch), Order::Asc)
            .order_by((Payloads::Table, Payloads::VerPatch), Order::Asc)
            .order_by((Payloads::Table, Payloads::VerTimestamp), Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;
        rows.iter().map(payload_from_row).collect()
    }

    async fn latest_payload(&self, channel: &str) -> Result<Option<Payload>> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .columns(payload_columns())
            .from(Payloads::Table)
            .inner_join(
                ChannelPayloads::Table,
                Expr::col((Payloads::Table, Payloads::Id))
                    .equals((ChannelPayloads::Table, ChannelPayloads::Payload)),
            )
            .and_where(Expr::col((ChannelPayloads::Table, ChannelPayloads::Channel)).eq(channel))
            .order_by((Payloads::Table, Payloads::VerBuild), Order::Desc)
            .order_by((Payloads::Table, Payloads::VerBranch), Order::Desc)
            .order_by((Payloads::Table, Payloads::VerPatch), Order::Desc)
            .order_by((Payloads::Table, Payloads::VerTimestamp), Order::Desc)
            .limit(1)
            .build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values).fetch_optional(&mut *conn).await?;
        row.as_ref().map(payload_from_row).transpose()
    }

    async fn list_payloads(&self) -> Result<Vec<Payload>> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .columns(payload_columns())
            .from(Payloads::Table)
            .order_by_expr(Expr::cust("rowid"), Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;
        rows.iter().map(payload_from_row).collect()
    }

    async fn merge_payloads(&self, old_id: &str, new_id: &str) -> Result<()> {
        if old_id == new_id {
            return Ok(());
        }

        let mut conn = self.conn.lock().await;
        let mut tx = conn.begin().await?;

        let channels = Self::channels_of(&mut tx, old_id).await?;
        for channel in &channels {
            Self::insert_association(&mut tx, new_id, channel).await?;
        }
        Self::delete_rows(&mut tx, old_id).await?;
        tx.commit().await?;

        debug!(
            old_id = %old_id,
            new_id = %new_id,
            channels = channels.len(),
            "Merged payload"
        );
        Ok(())
    }
}

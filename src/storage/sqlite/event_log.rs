//! SQLite EventLog implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_query::{Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::Row;
use tracing::debug;

use super::SqliteStore;
use crate::event::Event;
use crate::storage::schema::Events;
use crate::storage::{EventLog, Result, StorageError};

#[async_trait]
impl EventLog for SqliteStore {
    async fn log_event(&self, client_id: &str, event_type: i32, result: i32) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let now = Utc::now().timestamp();

        let (sql, values) = Query::insert()
            .into_table(Events::Table)
            .columns([Events::Client, Events::Type, Events::Result, Events::Timestamp])
            .values_panic([client_id.into(), event_type.into(), result.into(), now.into()])
            .build_sqlx(SqliteQueryBuilder);

        sqlx::query_with(&sql, values).execute(&mut *conn).await?;

        debug!(client_id = %client_id, event_type, result, "Logged event");
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .columns([Events::Client, Events::Type, Events::Result, Events::Timestamp])
            .from(Events::Table)
            .order_by(Events::Timestamp, Order::Asc)
            .order_by(Events::Id, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&mut *conn).await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let seconds: i64 = row.try_get("timestamp")?;
            let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0)
                .ok_or(StorageError::InvalidTimestamp(seconds))?;
            events.push(Event {
                client_id: row.try_get("client")?,
                event_type: row.try_get("type")?,
                result: row.try_get("result")?,
                timestamp,
            });
        }
        Ok(events)
    }
}

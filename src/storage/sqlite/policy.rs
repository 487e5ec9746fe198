//! SQLite ChannelPolicyStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::Row;
use tracing::debug;

use super::SqliteStore;
use crate::storage::schema::ChannelSettings;
use crate::storage::{ChannelPolicyStore, Result};

#[async_trait]
impl ChannelPolicyStore for SqliteStore {
    async fn force_downgrade(&self, channel: &str) -> Result<bool> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::select()
            .column(ChannelSettings::ForceDowngrade)
            .from(ChannelSettings::Table)
            .and_where(Expr::col(ChannelSettings::Channel).eq(channel))
            .build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values).fetch_optional(&mut *conn).await?;
        match row {
            Some(row) => {
                let flag: i64 = row.try_get("force_downgrade")?;
                Ok(flag != 0)
            }
            None => Ok(false),
        }
    }

    async fn set_force_downgrade(&self, channel: &str, value: bool) -> Result<()> {
        let mut conn = self.conn.lock().await;

        let (sql, values) = Query::insert()
            .into_table(ChannelSettings::Table)
            .columns([ChannelSettings::Channel, ChannelSettings::ForceDowngrade])
            .values_panic([channel.into(), i64::from(value).into()])
            .on_conflict(
                OnConflict::column(ChannelSettings::Channel)
                    .update_column(ChannelSettings::ForceDowngrade)
                    .to_owned(),
            )
            .build_sqlx(SqliteQueryBuilder);

        sqlx::query_with(&sql, values).execute(&mut *conn).await?;

        debug!(channel = %channel, force_downgrade = value, "Set channel policy");
        Ok(())
    }
}

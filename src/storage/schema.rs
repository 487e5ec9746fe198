//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Payloads table schema. `id` is not unique.
#[derive(Iden, Clone, Copy)]
pub enum Payloads {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "size"]
    Size,
    #[iden = "sha1"]
    Sha1,
    #[iden = "sha256"]
    Sha256,
    #[iden = "ver_build"]
    VerBuild,
    #[iden = "ver_branch"]
    VerBranch,
    #[iden = "ver_patch"]
    VerPatch,
    #[iden = "ver_timestamp"]
    VerTimestamp,
}

/// Payload to channel association table schema.
#[derive(Iden, Clone, Copy)]
pub enum ChannelPayloads {
    #[iden = "channel_payload_rel"]
    Table,
    #[iden = "payload"]
    Payload,
    #[iden = "channel"]
    Channel,
}

/// Channel settings table schema.
#[derive(Iden, Clone, Copy)]
pub enum ChannelSettings {
    Table,
    #[iden = "channel"]
    Channel,
    #[iden = "force_downgrade"]
    ForceDowngrade,
}

/// Events table schema.
#[derive(Iden, Clone, Copy)]
pub enum Events {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "client"]
    Client,
    #[iden = "type"]
    Type,
    #[iden = "result"]
    Result,
    #[iden = "timestamp"]
    Timestamp,
}

/// SQL for creating the payloads table.
pub const CREATE_PAYLOADS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payloads (
    id TEXT NOT NULL,
    size INTEGER NOT NULL,
    sha1 TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    ver_build INTEGER NOT NULL,
    ver_branch INTEGER NOT NULL,
    ver_patch INTEGER NOT NULL,
    ver_timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_payloads_id ON payloads(id);
"#;

/// SQL for creating the payload to channel association table.
pub const CREATE_CHANNEL_PAYLOADS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS channel_payload_rel (
    payload TEXT NOT NULL,
    channel TEXT NOT NULL,
    PRIMARY KEY (payload, channel)
);

CREATE INDEX IF NOT EXISTS idx_channel_payload_rel_channel ON channel_payload_rel(channel);
"#;

/// SQL for creating the channel settings table.
pub const CREATE_CHANNEL_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS channel_settings (
    channel TEXT NOT NULL PRIMARY KEY,
    force_downgrade INTEGER NOT NULL DEFAULT 0
);
"#;

/// SQL for creating the events table.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client TEXT NOT NULL,
    type INTEGER NOT NULL,
    result INTEGER NOT NULL,
    timestamp INTEGER NOT NULL
);
"#;

/// All table definitions, in creation order.
pub const ALL_TABLES: [&str; 4] = [
    CREATE_PAYLOADS_TABLE,
    CREATE_CHANNEL_PAYLOADS_TABLE,
    CREATE_CHANNEL_SETTINGS_TABLE,
    CREATE_EVENTS_TABLE,
];

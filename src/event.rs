//! Client-reported lifecycle events.
//!
//! Event codes follow the Omaha protocol values sent by update_engine.
//! Interpretation is presentation only: the event log stores whatever
//! codes a client reports and never rejects unknown ones.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Omaha event type: update finished (result tells how).
pub const EVENT_TYPE_UPDATE_COMPLETE: i32 = 3;
/// Omaha event type: payload download started.
pub const EVENT_TYPE_DOWNLOAD_STARTED: i32 = 13;
/// Omaha event type: payload download finished.
pub const EVENT_TYPE_DOWNLOAD_FINISHED: i32 = 14;
/// update_engine extension: new version booted successfully.
pub const EVENT_TYPE_INSTALL_SUCCESS: i32 = 800;

pub const EVENT_RESULT_ERROR: i32 = 0;
pub const EVENT_RESULT_SUCCESS: i32 = 1;
pub const EVENT_RESULT_SUCCESS_REBOOT: i32 = 2;

/// One stored event row. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub client_id: String,
    pub event_type: i32,
    pub result: i32,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        EventKind::classify(self.event_type, self.result)
    }

    pub fn description(&self) -> &'static str {
        self.kind().description()
    }
}

/// Known `(type, result)` combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DownloadStarted,
    DownloadFinished,
    ApplyOk,
    ApplyError,
    ApplyDone,
    InstallSuccess,
    Unknown,
}

impl EventKind {
    pub fn classify(event_type: i32, result: i32) -> Self {
        match (event_type, result) {
            (EVENT_TYPE_DOWNLOAD_STARTED, EVENT_RESULT_SUCCESS) => Self::DownloadStarted,
            (EVENT_TYPE_DOWNLOAD_FINISHED, EVENT_RESULT_SUCCESS) => Self::DownloadFinished,
            (EVENT_TYPE_UPDATE_COMPLETE, EVENT_RESULT_SUCCESS) => Self::ApplyOk,
            (EVENT_TYPE_UPDATE_COMPLETE, EVENT_RESULT_ERROR) => Self::ApplyError,
            (EVENT_TYPE_UPDATE_COMPLETE, EVENT_RESULT_SUCCESS_REBOOT) => Self::ApplyDone,
            (EVENT_TYPE_INSTALL_SUCCESS, EVENT_RESULT_SUCCESS) => Self::InstallSuccess,
            _ => Self::Unknown,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::DownloadStarted => "download started",
            Self::DownloadFinished => "download finished",
            Self::ApplyOk => "apply ok",
            Self::ApplyError => "apply error",
            Self::ApplyDone => "apply done, reboot pending",
            Self::InstallSuccess => "install success",
            Self::Unknown => "unknown",
        }
    }
}

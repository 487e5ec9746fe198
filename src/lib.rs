//! comaha - CoreOS update server core
//!
//! Decides which update payload a client on a release channel should
//! install, and keeps the payload catalog, per-channel policy and client
//! event log that decision depends on.

pub mod config;
pub mod event;
pub mod ingest;
pub mod maintenance;
pub mod payload;
pub mod payload_store;
pub mod resolver;
pub mod service;
pub mod storage;
pub mod utils;
pub mod version;

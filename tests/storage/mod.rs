//! Shared storage integration tests.
//!
//! Tests the PayloadCatalog, ChannelPolicyStore and EventLog interfaces
//! against all implementations. Each implementation module imports these
//! test functions and runs them, one fresh store per test.

pub mod catalog_tests;
pub mod event_log_tests;
pub mod policy_tests;

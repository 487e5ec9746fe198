//! EventLog interface tests.
//!
//! These tests verify the contract of the EventLog trait.
//! Each storage implementation should run these tests.

use chrono::{Duration, Utc};

use comaha::event::EventKind;
use comaha::storage::EventLog;

pub async fn test_empty_log<S: EventLog>(store: &S) {
    let events = store.list_events().await.expect("list should succeed");
    assert!(events.is_empty());
}

pub async fn test_insertion_order<S: EventLog>(store: &S) {
    let reported = [
        ("machine-1", 13, 1),
        ("machine-1", 14, 1),
        ("machine-2", 13, 1),
        ("machine-1", 3, 2),
        ("machine-1", 800, 1),
    ];
    for (client, event_type, result) in reported {
        store.log_event(client, event_type, result).await.unwrap();
    }

    let events = store.list_events().await.unwrap();
    let listed: Vec<(&str, i32, i32)> = events
        .iter()
        .map(|e| (e.client_id.as_str(), e.event_type, e.result))
        .collect();
    assert_eq!(listed, reported.to_vec());
}

pub async fn test_unknown_codes_are_kept<S: EventLog>(store: &S) {
    store.log_event("machine-1", 42, -7).await.unwrap();
    store.log_event("machine-1", 3, 0).await.unwrap();

    let events = store.list_events().await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!((events[0].event_type, events[0].result), (42, -7));
    assert_eq!(events[0].kind(), EventKind::Unknown);
    assert_eq!(events[1].kind(), EventKind::ApplyError);
}

pub async fn test_events_are_timestamped<S: EventLog>(store: &S) {
    let before = Utc::now() - Duration::seconds(1);
    store.log_event("machine-1", 13, 1).await.unwrap();
    let after = Utc::now() + Duration::seconds(1);

    let events = store.list_events().await.unwrap();
    assert!(events[0].timestamp >= before && events[0].timestamp <= after);
}

pub async fn test_timestamps_have_whole_seconds<S: EventLog>(store: &S) {
    for _ in 0..5 {
        store.log_event("machine-1", 13, 1).await.unwrap();
    }

    for event in store.list_events().await.unwrap() {
        assert_eq!(event.timestamp.timestamp_subsec_nanos(), 0);
    }
}

#[macro_export]
macro_rules! run_event_log_tests {
    ($new_store:expr) => {
        use $crate::storage::event_log_tests::*;

        test_empty_log(&$new_store).await;
        println!("  test_empty_log: PASSED");

        test_insertion_order(&$new_store).await;
        println!("  test_insertion_order: PASSED");

        test_unknown_codes_are_kept(&$new_store).await;
        println!("  test_unknown_codes_are_kept: PASSED");

        test_events_are_timestamped(&$new_store).await;
        println!("  test_events_are_timestamped: PASSED");

        test_timestamps_have_whole_seconds(&$new_store).await;
        println!("  test_timestamps_have_whole_seconds: PASSED");
    };
}

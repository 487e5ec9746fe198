//! PayloadCatalog interface tests.
//!
//! These tests verify the contract of the PayloadCatalog trait.
//! Each storage implementation should run these tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use comaha::payload::Payload;
use comaha::storage::PayloadCatalog;
use comaha::version::Version;

fn payload(id: &str, version: &str) -> Payload {
    Payload::new(
        id,
        Version::parse(version).expect("valid version"),
        4096,
        format!("sha1-{}", id),
        format!("sha256-{}", id),
    )
}

fn ids(payloads: &[Payload]) -> Vec<&str> {
    payloads.iter().map(|p| p.id.as_str()).collect()
}

// =============================================================================
// add / exists
// =============================================================================

pub async fn test_add_and_exists<S: PayloadCatalog>(store: &S) {
    assert!(!store.payload_exists("p1").await.unwrap());

    store.add_payload(&payload("p1", "1.0.0")).await.unwrap();

    assert!(store.payload_exists("p1").await.unwrap());
    assert!(!store.payload_exists("p2").await.unwrap());
    // Not attached anywhere yet.
    assert!(store.list_channels().await.unwrap().is_empty());
}

pub async fn test_payload_fields_round_trip<S: PayloadCatalog>(store: &S) {
    let timestamp = Utc.with_ymd_and_hms(2015, 1, 1, 1, 1, 0).unwrap();
    let stored = Payload::new(
        "p1",
        Version::with_timestamp(802, 3, 1, timestamp),
        u64::from(u32::MAX) + 7,
        "Kq5sNclPz7QV2+lfQIuc6R7oRu0=",
        "uU0nuZNNPgilLlLX2n2r+sSE7+N6U4DukIj3rOLvzek=",
    );
    store.publish_payload(&stored, "stable").await.unwrap();

    let loaded = store.latest_payload("stable").await.unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.version_string(), "802.3.1+2015-01-01-0101");
}

// =============================================================================
// attach
// =============================================================================

pub async fn test_attach_is_idempotent<S: PayloadCatalog>(store: &S) {
    store.add_payload(&payload("p1", "1.0.0")).await.unwrap();

    store.attach_to_channel("p1", "stable").await.unwrap();
    store.attach_to_channel("p1", "stable").await.unwrap();

    let images = store.list_images("stable").await.unwrap();
    assert_eq!(ids(&images), vec!["p1"]);
}

pub async fn test_one_payload_many_channels<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("p1", "1.0.0"), "stable").await.unwrap();
    store.attach_to_channel("p1", "beta").await.unwrap();

    assert_eq!(store.list_images("stable").await.unwrap().len(), 1);
    assert_eq!(store.list_images("beta").await.unwrap().len(), 1);
    assert_eq!(store.list_channels().await.unwrap(), vec!["beta", "stable"]);
}

// =============================================================================
// queries
// =============================================================================

pub async fn test_list_images_ascending<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("c", "800.1.2"), "stable").await.unwrap();
    store.publish_payload(&payload("a", "766.4.1"), "stable").await.unwrap();
    store
        .publish_payload(&payload("d", "800.1.2+2015-01-01-0101"), "stable")
        .await
        .unwrap();
    store.publish_payload(&payload("b", "800.0.9"), "stable").await.unwrap();
    store.publish_payload(&payload("x", "999.0.0"), "beta").await.unwrap();

    let images = store.list_images("stable").await.unwrap();
    assert_eq!(ids(&images), vec!["a", "b", "c", "d"]);
}

pub async fn test_latest_payload<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("old", "766.4.1"), "stable").await.unwrap();
    store.publish_payload(&payload("new", "800.1.2"), "stable").await.unwrap();
    store.publish_payload(&payload("mid", "800.0.0"), "stable").await.unwrap();
    store.publish_payload(&payload("beta", "900.0.0"), "beta").await.unwrap();

    let latest = store.latest_payload("stable").await.unwrap().unwrap();
    assert_eq!(latest.id, "new");
}

pub async fn test_latest_payload_empty_channel<S: PayloadCatalog>(store: &S) {
    store.add_payload(&payload("p1", "1.0.0")).await.unwrap();

    assert!(store.latest_payload("stable").await.unwrap().is_none());
    assert!(store.list_images("stable").await.unwrap().is_empty());
}

pub async fn test_list_channels_distinct_sorted<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("p1", "1.0.0"), "stable").await.unwrap();
    store.publish_payload(&payload("p2", "2.0.0"), "alpha").await.unwrap();
    store.publish_payload(&payload("p3", "3.0.0"), "stable").await.unwrap();

    assert_eq!(store.list_channels().await.unwrap(), vec!["alpha", "stable"]);
}

pub async fn test_list_payloads_insertion_order<S: PayloadCatalog>(store: &S) {
    store.add_payload(&payload("z", "3.0.0")).await.unwrap();
    store.publish_payload(&payload("a", "1.0.0"), "stable").await.unwrap();
    store.add_payload(&payload("m", "2.0.0")).await.unwrap();

    let all = store.list_payloads().await.unwrap();
    assert_eq!(ids(&all), vec!["z", "a", "m"]);
}

// =============================================================================
// delete
// =============================================================================

pub async fn test_delete_removes_everywhere<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("doomed", "1.0.0"), "stable").await.unwrap();
    store.attach_to_channel("doomed", "beta").await.unwrap();
    store.publish_payload(&payload("kept", "2.0.0"), "beta").await.unwrap();

    store.delete_payload("doomed").await.unwrap();

    assert!(!store.payload_exists("doomed").await.unwrap());
    assert!(store.payload_exists("kept").await.unwrap());
    assert!(store.list_images("stable").await.unwrap().is_empty());
    assert_eq!(ids(&store.list_images("beta").await.unwrap()), vec!["kept"]);
}

pub async fn test_channel_disappears_with_last_payload<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("p1", "1.0.0"), "stable").await.unwrap();
    store.publish_payload(&payload("p2", "2.0.0"), "stable").await.unwrap();
    store.publish_payload(&payload("p3", "1.0.0"), "beta").await.unwrap();

    store.delete_payload("p1").await.unwrap();
    assert_eq!(store.list_channels().await.unwrap(), vec!["beta", "stable"]);

    store.delete_payload("p2").await.unwrap();
    assert_eq!(store.list_channels().await.unwrap(), vec!["beta"]);
}

pub async fn test_delete_unknown_is_noop<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("p1", "1.0.0"), "stable").await.unwrap();

    store.delete_payload("missing").await.unwrap();

    assert_eq!(store.list_payloads().await.unwrap().len(), 1);
}

// =============================================================================
// merge
// =============================================================================

pub async fn test_merge_repoints_channels<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("keep", "1.0.0"), "stable").await.unwrap();
    store.publish_payload(&payload("clone", "1.0.0"), "stable").await.unwrap();
    store.attach_to_channel("clone", "beta").await.unwrap();

    store.merge_payloads("clone", "keep").await.unwrap();

    assert!(!store.payload_exists("clone").await.unwrap());
    assert_eq!(ids(&store.list_images("stable").await.unwrap()), vec!["keep"]);
    assert_eq!(ids(&store.list_images("beta").await.unwrap()), vec!["keep"]);
    assert_eq!(store.list_payloads().await.unwrap().len(), 1);
}

pub async fn test_merge_into_self_is_noop<S: PayloadCatalog>(store: &S) {
    store.publish_payload(&payload("p1", "1.0.0"), "stable").await.unwrap();

    store.merge_payloads("p1", "p1").await.unwrap();

    assert!(store.payload_exists("p1").await.unwrap());
    assert_eq!(ids(&store.list_images("stable").await.unwrap()), vec!["p1"]);
}

// =============================================================================
// Concurrency
// =============================================================================

pub async fn test_concurrent_attach_one_pair<S>(store: Arc<S>)
where
    S: PayloadCatalog + 'static,
{
    store.add_payload(&payload("p1", "1.0.0")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.attach_to_channel("p1", "stable").await
        }));
    }
    for handle in handles {
        handle.await.expect("task should not panic").unwrap();
    }

    assert_eq!(ids(&store.list_images("stable").await.unwrap()), vec!["p1"]);
    assert_eq!(store.list_channels().await.unwrap(), vec!["stable"]);
}

pub async fn test_concurrent_publish_keeps_every_payload<S>(store: Arc<S>)
where
    S: PayloadCatalog + 'static,
{
    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let p = payload(&format!("p{}", i), &format!("{}.0.0", i));
            store.publish_payload(&p, "stable").await
        }));
    }
    for handle in handles {
        handle.await.expect("task should not panic").unwrap();
    }

    assert_eq!(store.list_images("stable").await.unwrap().len(), 16);
    assert_eq!(store.latest_payload("stable").await.unwrap().unwrap().id, "p15");
}

#[macro_export]
macro_rules! run_catalog_tests {
    ($new_store:expr) => {
        use $crate::storage::catalog_tests::*;

        // add / exists
        test_add_and_exists(&$new_store).await;
        println!("  test_add_and_exists: PASSED");

        test_payload_fields_round_trip(&$new_store).await;
        println!("  test_payload_fields_round_trip: PASSED");

        // attach
        test_attach_is_idempotent(&$new_store).await;
        println!("  test_attach_is_idempotent: PASSED");

        test_one_payload_many_channels(&$new_store).await;
        println!("  test_one_payload_many_channels: PASSED");

        // queries
        test_list_images_ascending(&$new_store).await;
        println!("  test_list_images_ascending: PASSED");

        test_latest_payload(&$new_store).await;
        println!("  test_latest_payload: PASSED");

        test_latest_payload_empty_channel(&$new_store).await;
        println!("  test_latest_payload_empty_channel: PASSED");

        test_list_channels_distinct_sorted(&$new_store).await;
        println!("  test_list_channels_distinct_sorted: PASSED");

        test_list_payloads_insertion_order(&$new_store).await;
        println!("  test_list_payloads_insertion_order: PASSED");

        // delete
        test_delete_removes_everywhere(&$new_store).await;
        println!("  test_delete_removes_everywhere: PASSED");

        test_channel_disappears_with_last_payload(&$new_store).await;
        println!("  test_channel_disappears_with_last_payload: PASSED");

        test_delete_unknown_is_noop(&$new_store).await;
        println!("  test_delete_unknown_is_noop: PASSED");

        // merge
        test_merge_repoints_channels(&$new_store).await;
        println!("  test_merge_repoints_channels: PASSED");

        test_merge_into_self_is_noop(&$new_store).await;
        println!("  test_merge_into_self_is_noop: PASSED");

        // concurrency
        test_concurrent_attach_one_pair(std::sync::Arc::new($new_store)).await;
        println!("  test_concurrent_attach_one_pair: PASSED");

        test_concurrent_publish_keeps_every_payload(std::sync::Arc::new($new_store)).await;
        println!("  test_concurrent_publish_keeps_every_payload: PASSED");
    };
}

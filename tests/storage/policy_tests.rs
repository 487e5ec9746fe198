//! ChannelPolicyStore interface tests.
//!
//! These tests verify the contract of the ChannelPolicyStore trait.
//! Each storage implementation should run these tests.

use std::sync::Arc;

use comaha::payload::Payload;
use comaha::storage::{ChannelPolicyStore, PayloadCatalog};
use comaha::version::Version;

pub async fn test_default_is_false<S: ChannelPolicyStore>(store: &S) {
    let value = store
        .force_downgrade("never-set")
        .await
        .expect("get should succeed");
    assert!(!value, "unset channel should not force downgrade");
}

pub async fn test_set_and_update<S: ChannelPolicyStore>(store: &S) {
    store.set_force_downgrade("stable", true).await.unwrap();
    assert!(store.force_downgrade("stable").await.unwrap());

    store.set_force_downgrade("stable", false).await.unwrap();
    assert!(!store.force_downgrade("stable").await.unwrap());

    store.set_force_downgrade("stable", true).await.unwrap();
    assert!(store.force_downgrade("stable").await.unwrap());
}

pub async fn test_channel_isolation<S: ChannelPolicyStore>(store: &S) {
    store.set_force_downgrade("stable", true).await.unwrap();

    assert!(store.force_downgrade("stable").await.unwrap());
    assert!(!store.force_downgrade("beta").await.unwrap());
}

pub async fn test_policy_survives_payload_deletion<S>(store: &S)
where
    S: PayloadCatalog + ChannelPolicyStore,
{
    let payload = Payload::new("stable", Version::new(1, 0, 0), 1, "a", "b");
    store.publish_payload(&payload, "stable").await.unwrap();
    store.set_force_downgrade("stable", true).await.unwrap();

    // Payload id deliberately equals the channel name.
    store.delete_payload("stable").await.unwrap();

    assert!(store.list_channels().await.unwrap().is_empty());
    assert!(store.force_downgrade("stable").await.unwrap());
}

// =============================================================================
// Concurrency
// =============================================================================

pub async fn test_concurrent_upserts_one_channel<S>(store: Arc<S>)
where
    S: ChannelPolicyStore + 'static,
{
    let mut handles = Vec::new();
    for i in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.set_force_downgrade("stable", i % 2 == 0).await
        }));
    }
    for handle in handles {
        handle.await.expect("task should not panic").unwrap();
    }

    let first = store.force_downgrade("stable").await.unwrap();
    let second = store.force_downgrade("stable").await.unwrap();
    assert_eq!(first, second, "value should be stable once writers finish");

    store.set_force_downgrade("stable", true).await.unwrap();
    assert!(store.force_downgrade("stable").await.unwrap());
    assert!(!store.force_downgrade("beta").await.unwrap());
}

#[macro_export]
macro_rules! run_policy_tests {
    ($new_store:expr) => {
        use $crate::storage::policy_tests::*;

        test_default_is_false(&$new_store).await;
        println!("  test_default_is_false: PASSED");

        test_set_and_update(&$new_store).await;
        println!("  test_set_and_update: PASSED");

        test_channel_isolation(&$new_store).await;
        println!("  test_channel_isolation: PASSED");

        test_policy_survives_payload_deletion(&$new_store).await;
        println!("  test_policy_survives_payload_deletion: PASSED");

        test_concurrent_upserts_one_channel(std::sync::Arc::new($new_store)).await;
        println!("  test_concurrent_upserts_one_channel: PASSED");
    };
}

//! Cart session scenarios across guest and authenticated modes.

use std::sync::Arc;
use std::time::Duration;

use orchard_core::{LineItemId, UserId};
use orchard_integration_tests::{accessory_draft, init_tracing, phone_draft, session_with_stores};
use orchard_storefront::error::CartError;
use orchard_storefront::session::{AuthState, CartSession, CartState};
use orchard_storefront::storage::{CartMode, DocumentStore};

/// Poll until `session` holds `expected` items, or panic after ~1s. Remote
/// snapshots are applied asynchronously by the watch task.
async fn wait_for_item_count(session: &CartSession, expected: usize) {
    for _ in 0..200 {
        if session.items().await.len() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "cart never reached {expected} items, has {}",
        session.items().await.len()
    );
}

#[tokio::test]
async fn repeated_adds_collapse_to_one_line() {
    init_tracing();
    let (session, _, _) = session_with_stores();
    session.set_auth(AuthState::Guest).await.expect("set_auth");

    for quantity in [1, 2, 4] {
        session.add_item(phone_draft(quantity)).await.expect("add");
    }
    session.add_item(accessory_draft(1)).await.expect("add");

    let items = session.items().await;
    assert_eq!(items.len(), 2);
    let phone = items
        .iter()
        .find(|i| i.product_id == "iphone-17-pro")
        .expect("phone line");
    assert_eq!(phone.quantity, 7);
}

#[tokio::test]
async fn negative_quantities_remove_and_missing_ids_are_noops() {
    init_tracing();
    let (session, _, _) = session_with_stores();
    session.set_auth(AuthState::Guest).await.expect("set_auth");
    session.add_item(phone_draft(3)).await.expect("add");
    let id = session.items().await[0].id.clone();

    session.update_quantity(&id, -2).await.expect("update");
    assert!(session.is_empty().await);

    session.remove_item(&id).await.expect("remove missing");
    session
        .update_quantity(&LineItemId::new("nope"), 4)
        .await
        .expect("update missing");
    assert!(session.is_empty().await);
}

#[tokio::test]
async fn authenticated_mode_persists_per_record() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");
    session
        .set_auth(AuthState::Authenticated(uid.clone()))
        .await
        .expect("set_auth");
    assert_eq!(session.state().await, CartState::Ready(CartMode::Authenticated));

    session.add_item(phone_draft(1)).await.expect("add");
    session.add_item(phone_draft(1)).await.expect("add");

    let stored = remote.fetch_cart(&uid).await.expect("fetch");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].quantity, 2);
}

#[tokio::test]
async fn mode_switches_never_merge_carts() {
    init_tracing();
    let (session, _, _) = session_with_stores();
    let uid = UserId::new("uid-1");

    session.set_auth(AuthState::Guest).await.expect("guest");
    session.add_item(phone_draft(2)).await.expect("add");

    session
        .set_auth(AuthState::Authenticated(uid.clone()))
        .await
        .expect("sign in");
    assert!(session.is_empty().await);
    session.add_item(accessory_draft(5)).await.expect("add");

    session.set_auth(AuthState::Guest).await.expect("sign out");
    let items = session.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, "iphone-17-pro");
    assert_eq!(items[0].quantity, 2);
}

#[tokio::test]
async fn remote_changes_converge_through_the_watch() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");
    session
        .set_auth(AuthState::Authenticated(uid.clone()))
        .await
        .expect("set_auth");

    // Another device writes directly to the store.
    let other_device = phone_draft(4).into_line_item(chrono::Utc::now());
    remote
        .put_cart_item(&uid, &other_device)
        .await
        .expect("remote put");

    wait_for_item_count(&session, 1).await;
    assert_eq!(session.items().await[0].quantity, 4);
}

#[tokio::test]
async fn signing_out_cancels_the_subscription() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");

    session
        .set_auth(AuthState::Authenticated(uid.clone()))
        .await
        .expect("sign in");
    assert_eq!(remote.watcher_count(&uid), 1);

    session.set_auth(AuthState::Guest).await.expect("sign out");
    assert_eq!(remote.watcher_count(&uid), 0);
}

#[tokio::test]
async fn teardown_cancels_the_subscription() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");

    session
        .set_auth(AuthState::Authenticated(uid.clone()))
        .await
        .expect("sign in");
    session.teardown().await;
    assert_eq!(remote.watcher_count(&uid), 0);
    assert_eq!(session.state().await, CartState::Uninitialized);
}

#[tokio::test]
async fn failed_writes_leave_the_cart_untouched() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");
    session
        .set_auth(AuthState::Authenticated(uid))
        .await
        .expect("set_auth");
    session.add_item(phone_draft(2)).await.expect("add");

    remote.set_fail_cart_writes(true);
    let err = session
        .add_item(accessory_draft(1))
        .await
        .expect_err("should fail");
    assert!(matches!(err, CartError::Persistence(_)));

    let items = session.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
}

#[tokio::test]
async fn concurrent_adds_lose_no_increments() {
    init_tracing();
    let (session, _, _) = session_with_stores();
    session.set_auth(AuthState::Guest).await.expect("set_auth");
    let session = Arc::new(session);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            session.add_item(phone_draft(1)).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("add");
    }

    assert_eq!(session.item_count().await, 20);
    assert_eq!(session.items().await.len(), 1);
}

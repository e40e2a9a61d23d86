//! Order placement scenarios, including the partial-failure windows.

use std::sync::Arc;

use rust_decimal::Decimal;

use orchard_core::{OrderStatus, UserId};
use orchard_integration_tests::{
    accessory_draft, init_tracing, phone_draft, session_with_stores, test_address,
};
use orchard_storefront::checkout::{CheckoutService, ORDER_NUMBER_PREFIX};
use orchard_storefront::error::CheckoutError;
use orchard_storefront::pricing::PricingConfig;
use orchard_storefront::session::AuthState;
use orchard_storefront::storage::{DocumentStore, MemoryDocumentStore};

fn checkout(remote: &Arc<MemoryDocumentStore>) -> CheckoutService {
    CheckoutService::new(
        Arc::clone(remote) as Arc<dyn DocumentStore>,
        PricingConfig::default(),
    )
}

#[tokio::test]
async fn placing_an_order_freezes_totals_and_clears_the_cart() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");
    let auth = AuthState::Authenticated(uid.clone());
    session.set_auth(auth.clone()).await.expect("set_auth");

    // Reference cart: 999 x 1 + 100 x 2.
    session.add_item(phone_draft(1)).await.expect("add");
    session.add_item(accessory_draft(2)).await.expect("add");

    let order = checkout(&remote)
        .place_order(&auth, &session, test_address())
        .await
        .expect("place order");

    assert_eq!(order.subtotal, Decimal::from(1199));
    assert_eq!(order.tax, Decimal::new(9892, 2));
    assert_eq!(order.shipping, Decimal::ZERO);
    assert_eq!(order.total, Decimal::new(129_792, 2));
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(order.order_number.starts_with(ORDER_NUMBER_PREFIX));
    assert!(!order.estimated_delivery.is_empty());
    assert_eq!(order.item_count(), 3);

    assert!(session.is_empty().await);
    assert!(remote.fetch_cart(&uid).await.expect("fetch").is_empty());
}

#[tokio::test]
async fn empty_cart_fails_without_a_store_write() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let auth = AuthState::Authenticated(UserId::new("uid-1"));
    session.set_auth(auth.clone()).await.expect("set_auth");

    let err = checkout(&remote)
        .place_order(&auth, &session, test_address())
        .await
        .expect_err("should fail");
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(remote.order_count(), 0);
}

#[tokio::test]
async fn guests_cannot_check_out() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    session.set_auth(AuthState::Guest).await.expect("set_auth");
    session.add_item(phone_draft(1)).await.expect("add");

    let err = checkout(&remote)
        .place_order(&AuthState::Guest, &session, test_address())
        .await
        .expect_err("should fail");
    assert!(matches!(err, CheckoutError::NotAuthenticated));
    assert_eq!(remote.order_count(), 0);
    assert_eq!(session.item_count().await, 1);
}

#[tokio::test]
async fn failed_order_write_preserves_the_cart() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let auth = AuthState::Authenticated(UserId::new("uid-1"));
    session.set_auth(auth.clone()).await.expect("set_auth");
    session.add_item(phone_draft(1)).await.expect("add");

    remote.set_fail_order_writes(true);
    let err = checkout(&remote)
        .place_order(&auth, &session, test_address())
        .await
        .expect_err("should fail");
    assert!(matches!(err, CheckoutError::OrderPlacementFailed(_)));

    assert_eq!(remote.order_count(), 0);
    assert_eq!(session.item_count().await, 1);
}

#[tokio::test]
async fn failed_clear_after_order_surfaces_the_order() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let auth = AuthState::Authenticated(UserId::new("uid-1"));
    session.set_auth(auth.clone()).await.expect("set_auth");
    session.add_item(phone_draft(1)).await.expect("add");

    // Order inserts still succeed; only cart record writes fail, so the
    // clear after the order write is what breaks.
    remote.set_fail_cart_writes(true);
    let err = checkout(&remote)
        .place_order(&auth, &session, test_address())
        .await
        .expect_err("should fail");

    match err {
        CheckoutError::CartClearAfterOrderFailed { order, .. } => {
            assert_eq!(order.status, OrderStatus::Confirmed);
            assert_eq!(remote.order_count(), 1);
        }
        other => panic!("expected CartClearAfterOrderFailed, got {other}"),
    }
    // The inconsistency window: order exists, cart still has its items.
    assert_eq!(session.item_count().await, 1);
}

#[tokio::test]
async fn order_history_is_newest_first_and_auth_gated() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let uid = UserId::new("uid-1");
    let auth = AuthState::Authenticated(uid.clone());
    session.set_auth(auth.clone()).await.expect("set_auth");
    let service = checkout(&remote);

    session.add_item(phone_draft(1)).await.expect("add");
    let first = service
        .place_order(&auth, &session, test_address())
        .await
        .expect("first order");

    session.add_item(accessory_draft(1)).await.expect("add");
    let second = service
        .place_order(&auth, &session, test_address())
        .await
        .expect("second order");

    let history = service.order_history(&auth).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);

    let err = service
        .order_history(&AuthState::Guest)
        .await
        .expect_err("should fail");
    assert!(matches!(err, CheckoutError::NotAuthenticated));
}

#[tokio::test]
async fn status_updates_touch_only_the_status() {
    init_tracing();
    let (session, _, remote) = session_with_stores();
    let auth = AuthState::Authenticated(UserId::new("uid-1"));
    session.set_auth(auth.clone()).await.expect("set_auth");
    let service = checkout(&remote);

    session.add_item(phone_draft(1)).await.expect("add");
    let order = service
        .place_order(&auth, &session, test_address())
        .await
        .expect("place order");

    service
        .update_order_status(&order.id, OrderStatus::Shipped)
        .await
        .expect("update status");

    let fetched = service
        .get_order(&order.id)
        .await
        .expect("get")
        .expect("order exists");
    assert_eq!(fetched.status, OrderStatus::Shipped);
    assert_eq!(fetched.total, order.total);
    assert_eq!(fetched.order_number, order.order_number);
}

//! Error taxonomy for cart and checkout operations.
//!
//! Persistence failures propagate unchanged to the calling operation; the
//! session layer never retries on its own. The one deliberate asymmetry is
//! [`CheckoutError::CartClearAfterOrderFailed`]: the order write succeeded
//! but clearing the cart did not, so the variant carries the created order
//! for the caller to report alongside the warning.

use thiserror::Error;

use orchard_core::Order;

/// A store or network failure on read or write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing store reported a failure.
    #[error("store error: {0}")]
    Store(String),

    /// A cart blob could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from cart session operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The backing store failed; the in-memory cart is left untouched.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A mutation was attempted before the session finished loading.
    #[error("cart session is not ready")]
    NotReady,
}

/// Errors from the order placement workflow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requires a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The cart had no items at call time; nothing was written.
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    /// The order write failed; the cart is preserved for retry.
    #[error("order placement failed: {0}")]
    OrderPlacementFailed(#[source] PersistenceError),

    /// The order was persisted but the cart could not be cleared
    /// afterwards. There is no compensating rollback: the order stands,
    /// and the caller should tell the user so.
    #[error(
        "order {} was placed but the cart could not be cleared: {source}",
        .order.order_number
    )]
    CartClearAfterOrderFailed {
        order: Box<Order>,
        source: CartError,
    },
}

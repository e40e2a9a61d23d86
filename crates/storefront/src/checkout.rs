//! Order placement workflow and order queries.
//!
//! Placing an order is a one-shot logical sequence over two stores with no
//! cross-store transaction, so the ordering is chosen to avoid rollback:
//! nothing is written until the order record itself, and the cart is only
//! cleared after that write succeeds. The one inconsistency window left -
//! order written, cart clear failed - is surfaced distinctly instead of
//! hidden (see [`CheckoutError::CartClearAfterOrderFailed`]).

use std::sync::Arc;

use chrono::{DateTime, Days, Utc};
use rand::Rng;
use tracing::{info, instrument, warn};

use orchard_core::{NewOrder, Order, OrderId, OrderItem, OrderStatus, ShippingAddress};

use crate::error::{CheckoutError, PersistenceError};
use crate::pricing::PricingConfig;
use crate::session::{AuthState, CartSession};
use crate::storage::DocumentStore;

/// Stable human-readable prefix on every order number.
pub const ORDER_NUMBER_PREFIX: char = 'W';

/// Calendar days between order creation and estimated delivery.
const DELIVERY_OFFSET_DAYS: u64 = 3;

/// The order placement workflow and order-history queries.
pub struct CheckoutService {
    store: Arc<dyn DocumentStore>,
    pricing: PricingConfig,
}

impl CheckoutService {
    /// Create a checkout service over the order store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, pricing: PricingConfig) -> Self {
        Self { store, pricing }
    }

    /// Place an order for the session's current cart.
    ///
    /// Snapshots the cart into frozen order items, computes and freezes the
    /// totals, persists the order with status `Confirmed`, and clears the
    /// cart only after the order write succeeds.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotAuthenticated`] without an identity; nothing
    ///   is read or written.
    /// - [`CheckoutError::EmptyCart`] if the cart has no items; nothing is
    ///   written.
    /// - [`CheckoutError::OrderPlacementFailed`] if the order write fails;
    ///   the cart is left untouched for retry.
    /// - [`CheckoutError::CartClearAfterOrderFailed`] if the order was
    ///   written but the cart could not be cleared; carries the created
    ///   order.
    #[instrument(skip_all, fields(uid))]
    pub async fn place_order(
        &self,
        auth: &AuthState,
        session: &CartSession,
        shipping_address: ShippingAddress,
    ) -> Result<Order, CheckoutError> {
        let Some(uid) = auth.uid() else {
            return Err(CheckoutError::NotAuthenticated);
        };
        tracing::Span::current().record("uid", uid.as_str());

        let items = session.items().await;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let totals = self.pricing.totals(&items);
        let now = Utc::now();
        let new_order = NewOrder {
            user_id: uid.clone(),
            order_number: generate_order_number(now),
            items: items.iter().map(OrderItem::from).collect(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            // The reference flow confirms immediately on successful
            // payment capture; Pending is never observed.
            status: OrderStatus::Confirmed,
            shipping_address,
            estimated_delivery: estimate_delivery(now),
        };

        let order = self
            .store
            .insert_order(&new_order)
            .await
            .map_err(CheckoutError::OrderPlacementFailed)?;
        info!(
            order_number = %order.order_number,
            total = %order.total,
            "order placed"
        );

        if let Err(source) = session.clear().await {
            warn!(
                order_number = %order.order_number,
                error = %source,
                "order placed but cart could not be cleared"
            );
            return Err(CheckoutError::CartClearAfterOrderFailed {
                order: Box::new(order),
                source,
            });
        }

        Ok(order)
    }

    /// All orders for the signed-in user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotAuthenticated`] without an identity, or
    /// [`CheckoutError::OrderPlacementFailed`] wrapping the store failure.
    pub async fn order_history(&self, auth: &AuthState) -> Result<Vec<Order>, CheckoutError> {
        let Some(uid) = auth.uid() else {
            return Err(CheckoutError::NotAuthenticated);
        };
        self.store
            .orders_for_user(uid)
            .await
            .map_err(CheckoutError::OrderPlacementFailed)
    }

    /// Fetch a single order by its store identifier.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the store query fails.
    pub async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, PersistenceError> {
        self.store.get_order(id).await
    }

    /// Update an order's status. The status set is fixed but no transition
    /// order is enforced; fulfillment systems own that policy.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the order does not exist or the write
    /// fails.
    pub async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), PersistenceError> {
        self.store.update_order_status(id, status).await
    }
}

/// Generate a human-displayable order number: the stable `W` prefix, the
/// creation time in uppercase base-36 milliseconds, and a 4-character
/// random suffix. Collisions are practically, not cryptographically,
/// avoided.
#[must_use]
pub fn generate_order_number(created_at: DateTime<Utc>) -> String {
    let millis = created_at.timestamp_millis().unsigned_abs();
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| base36_digit(rng.random_range(0..36)))
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{}{suffix}", to_base36(millis))
}

/// Estimated delivery date: creation date plus a fixed 3-day offset,
/// formatted long-form (e.g. `Friday, September 1`).
#[must_use]
pub fn estimate_delivery(created_at: DateTime<Utc>) -> String {
    let delivery = created_at
        .checked_add_days(Days::new(DELIVERY_OFFSET_DAYS))
        .unwrap_or(created_at);
    delivery.format("%A, %B %-d").to_string()
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(base36_digit(u32::try_from(n % 36).unwrap_or(0)));
        n /= 36;
    }
    digits.iter().rev().collect()
}

fn base36_digit(d: u32) -> char {
    char::from_digit(d, 36)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number(Utc::now());
        assert!(number.starts_with(ORDER_NUMBER_PREFIX));
        assert!(number.len() > 5);
        assert!(
            number
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_order_numbers_differ() {
        let now = Utc::now();
        let a = generate_order_number(now);
        let b = generate_order_number(now);
        // Same timestamp component, random suffixes; a collision here is a
        // 1-in-1.6M event.
        assert_ne!(a, b);
    }

    #[test]
    fn test_base36_round_trip() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(46_655), "ZZZ");
    }

    #[test]
    fn test_estimate_delivery_is_three_days_out() {
        let created = Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).single().expect("date");
        assert_eq!(estimate_delivery(created), "Tuesday, September 1");
    }
}

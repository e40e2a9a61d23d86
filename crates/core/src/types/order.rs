//! Orders and their frozen snapshots.
//!
//! An order is immutable once created (status transitions aside). Its items
//! and totals are copies frozen at placement time, decoupled from the cart
//! identity they came from: an [`OrderItem`] has no line-item ID.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{OrderId, UserId};
use crate::types::line_item::LineItem;
use crate::types::status::OrderStatus;

/// Shipping destination captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
}

/// A frozen copy of a cart line at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub color: String,
    pub color_hex: String,
    pub storage: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&LineItem> for OrderItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            product_image: item.product_image.clone(),
            color: item.color.clone(),
            color_hex: item.color_hex.clone(),
            storage: item.storage.clone(),
            price: item.price,
            quantity: item.quantity,
        }
    }
}

/// An order record as persisted, before the store assigns its identifier
/// and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    /// Human-displayable, generated at creation; see the checkout workflow.
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    /// Long-form date string, computed once at creation.
    pub estimated_delivery: String,
}

/// A persisted order with its server-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_delivery: String,
}

impl Order {
    /// Construct a persisted order from its draft and store-assigned fields.
    #[must_use]
    pub fn from_new(new: NewOrder, id: OrderId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            order_number: new.order_number,
            items: new.items,
            subtotal: new.subtotal,
            tax: new.tax,
            shipping: new.shipping,
            total: new.total,
            status: new.status,
            shipping_address: new.shipping_address,
            created_at,
            updated_at: created_at,
            estimated_delivery: new.estimated_delivery,
        }
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_address() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            street: "1 Infinite Loop".to_string(),
            apartment: None,
            city: "Cupertino".to_string(),
            state: "CA".to_string(),
            zip_code: "95014".to_string(),
            country: "United States".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[test]
    fn test_order_item_drops_cart_identity() {
        let json = serde_json::to_value(OrderItem {
            product_id: "iphone-17-pro".to_string(),
            product_name: "iPhone 17 Pro".to_string(),
            product_image: "/images/iphone.webp".to_string(),
            color: "Silver".to_string(),
            color_hex: "#e2e2e2".to_string(),
            storage: "256GB".to_string(),
            price: Decimal::from(999),
            quantity: 1,
        })
        .expect("serialize");
        assert!(json.get("id").is_none());
        assert!(json.get("addedAt").is_none());
    }

    #[test]
    fn test_from_new_freezes_timestamps() {
        let now = Utc::now();
        let order = Order::from_new(
            NewOrder {
                user_id: UserId::new("uid-1"),
                order_number: "WTEST1234".to_string(),
                items: vec![],
                subtotal: Decimal::ZERO,
                tax: Decimal::ZERO,
                shipping: Decimal::ZERO,
                total: Decimal::ZERO,
                status: OrderStatus::Confirmed,
                shipping_address: sample_address(),
                estimated_delivery: "Friday, September 1".to_string(),
            },
            OrderId::new("doc-1"),
            now,
        );
        assert_eq!(order.created_at, now);
        assert_eq!(order.updated_at, now);
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn test_apartment_omitted_when_none() {
        let json = serde_json::to_value(sample_address()).expect("serialize");
        assert!(json.get("apartment").is_none());
        assert!(json.get("zipCode").is_some());
    }
}

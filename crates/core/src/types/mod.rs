//! Domain types for carts and orders.

pub mod id;
pub mod line_item;
pub mod order;
pub mod status;

pub use id::{LineItemId, OrderId, UserId};
pub use line_item::{LineItem, NewLineItem};
pub use order::{NewOrder, Order, OrderItem, ShippingAddress};
pub use status::OrderStatus;

//! Cart line items.
//!
//! A line item is one configured product (product + color + storage) with a
//! quantity. Descriptive fields and the unit price are snapshots taken at
//! add-time; the catalog is reference data and is never joined back in, so
//! a later catalog price change never alters an item already in a cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductColor, StorageOption};
use crate::types::id::LineItemId;

/// One configured product in a cart.
///
/// Field names serialize in camelCase to match the document-store schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Derived composite key; see [`LineItemId::derive`].
    pub id: LineItemId,
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub color: String,
    pub color_hex: String,
    pub storage: String,
    /// Unit price frozen at add-time.
    pub price: Decimal,
    /// Always >= 1 while the item exists; driving it to 0 deletes the item.
    pub quantity: u32,
    /// Informational only, not part of identity.
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Line total for this item (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Descriptor for an add-to-cart request: a [`LineItem`] before the session
/// assigns its derived ID and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_id: String,
    pub product_name: String,
    pub product_image: String,
    pub color: String,
    pub color_hex: String,
    pub storage: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl NewLineItem {
    /// Build a descriptor from a catalog selection.
    ///
    /// Snapshots the descriptive fields and computes the unit price as the
    /// product base price plus the storage tier modifier. Uses the
    /// color-specific image when the catalog provides one.
    #[must_use]
    pub fn from_selection(
        product: &Product,
        color: &ProductColor,
        storage: &StorageOption,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_image: color
                .image
                .clone()
                .unwrap_or_else(|| product.image.clone()),
            color: color.name.clone(),
            color_hex: color.hex.clone(),
            storage: storage.size.clone(),
            price: product.price + storage.price_modifier,
            quantity,
        }
    }

    /// The derived line-item ID this descriptor will occupy in a cart.
    #[must_use]
    pub fn derived_id(&self) -> LineItemId {
        LineItemId::derive(&self.product_id, &self.color, &self.storage)
    }

    /// Materialize a full [`LineItem`] with the given add timestamp.
    #[must_use]
    pub fn into_line_item(self, added_at: DateTime<Utc>) -> LineItem {
        let id = self.derived_id();
        LineItem {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            product_image: self.product_image,
            color: self.color,
            color_hex: self.color_hex,
            storage: self.storage,
            price: self.price,
            quantity: self.quantity,
            added_at,
        }
    }
}

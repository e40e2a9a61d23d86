//! Immutable product reference data.
//!
//! The catalog is never joined live into carts or orders: line items copy
//! the fields they need at add-time. These types exist so callers can build
//! [`crate::NewLineItem`] descriptors from a product selection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Mac,
    Iphone,
    Ipad,
    Watch,
    Audio,
}

/// A color option for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColor {
    pub name: String,
    pub hex: String,
    /// Optional color-specific image, falling back to the product image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A storage tier and its price delta over the base configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOption {
    pub size: String,
    pub price_modifier: Decimal,
}

/// A purchasable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub tagline: String,
    /// Base price; the storage tier modifier is added on top.
    pub price: Decimal,
    pub image: String,
    pub category: ProductCategory,
    #[serde(default)]
    pub is_new: bool,
    pub colors: Vec<ProductColor>,
    pub storage_options: Vec<StorageOption>,
}

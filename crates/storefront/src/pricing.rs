//! Pure totals computation.
//!
//! All monetary arithmetic is exact decimal via `rust_decimal`; nothing
//! here accumulates floating-point drift no matter how many items a cart
//! holds. Tax is rounded to cents at the tax step so the stored value
//! matches what is displayed, and the total is the sum of the rounded
//! parts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use orchard_core::LineItem;

/// Default sales tax rate (8.25%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(825, 0, 0, false, 4);

/// Pricing policy for a storefront.
///
/// The tax rate and shipping charge are configuration points (see
/// [`crate::config::StorefrontConfig`]), not constants baked into the
/// calculator. Shipping defaults to zero: the free-shipping policy is a
/// setting, not a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub shipping: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            shipping: Decimal::ZERO,
        }
    }
}

/// Derived cart totals; always recomputed from the line-item list, never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl PricingConfig {
    /// Tax on a subtotal, rounded to cents (half away from zero).
    #[must_use]
    pub fn tax(&self, subtotal: Decimal) -> Decimal {
        (subtotal * self.tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Compute all derived totals for a line-item list.
    #[must_use]
    pub fn totals(&self, items: &[LineItem]) -> CartTotals {
        let subtotal = subtotal(items);
        let tax = self.tax(subtotal);
        CartTotals {
            item_count: item_count(items),
            subtotal,
            tax,
            shipping: self.shipping,
            total: subtotal + tax + self.shipping,
        }
    }
}

/// Sum of `price * quantity` across all items, exact.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Total number of units across all items.
#[must_use]
pub fn item_count(items: &[LineItem]) -> u32 {
    items.iter().map(|i| i.quantity).sum()
}

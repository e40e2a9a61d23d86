//! Shared fixtures for the integration test suites.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use rust_decimal::Decimal;

use orchard_core::{NewLineItem, ShippingAddress};
use orchard_storefront::session::CartSession;
use orchard_storefront::storage::{
    BlobStorage, DocumentStore, MemoryBlobStorage, MemoryDocumentStore,
};

/// Install a `fmt` subscriber honoring `RUST_LOG`; safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A phone at the reference unit price of 999.
#[must_use]
pub fn phone_draft(quantity: u32) -> NewLineItem {
    NewLineItem {
        product_id: "iphone-17-pro".to_string(),
        product_name: "iPhone 17 Pro".to_string(),
        product_image: "/images/iphone-17-pro.webp".to_string(),
        color: "Deep Blue".to_string(),
        color_hex: "#2e3b56".to_string(),
        storage: "256GB".to_string(),
        price: Decimal::from(999),
        quantity,
    }
}

/// An accessory at the reference unit price of 100.
#[must_use]
pub fn accessory_draft(quantity: u32) -> NewLineItem {
    NewLineItem {
        product_id: "airpods-pro".to_string(),
        product_name: "AirPods Pro".to_string(),
        product_image: "/images/airpods-pro.webp".to_string(),
        color: "White".to_string(),
        color_hex: "#ffffff".to_string(),
        storage: "N/A".to_string(),
        price: Decimal::from(100),
        quantity,
    }
}

/// A plausible shipping destination.
#[must_use]
pub fn test_address() -> ShippingAddress {
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

/// A fresh session plus handles to its backing stores.
#[must_use]
pub fn session_with_stores() -> (CartSession, Arc<MemoryBlobStorage>, Arc<MemoryDocumentStore>) {
    let local = Arc::new(MemoryBlobStorage::new());
    let remote = Arc::new(MemoryDocumentStore::new());
    let session = CartSession::new(
        Arc::clone(&local) as Arc<dyn BlobStorage>,
        Arc::clone(&remote) as Arc<dyn DocumentStore>,
    );
    (session, local, remote)
}

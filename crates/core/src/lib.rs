//! Orchard Core - Shared domain types.
//!
//! This crate provides the domain model used across all Orchard components:
//! - `storefront` - cart session, pricing, and checkout logic
//! - `integration-tests` - end-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store clients, no async
//! code. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Line items, orders, statuses, and identifier newtypes
//! - [`catalog`] - Immutable product reference data

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use catalog::*;
pub use types::*;

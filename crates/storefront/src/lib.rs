//! Orchard Storefront session library.
//!
//! This crate implements the storefront's cart and checkout domain:
//!
//! - [`storage`] - persistence seams: local blob storage for guest carts,
//!   a per-user document store for authenticated carts and orders, and the
//!   per-mode backend strategy built on top of them
//! - [`pricing`] - pure totals computation over exact decimals
//! - [`session`] - the cart reconciliation state machine
//! - [`checkout`] - the one-shot order placement workflow and order queries
//! - [`config`] - environment-driven configuration
//!
//! The rendering layer, the concrete document-store client, and the auth
//! provider are external collaborators; this crate only defines the traits
//! they plug into and ships in-memory implementations for tests and
//! embedding.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod pricing;
pub mod session;
pub mod storage;

//! Persistence seams for carts and orders.
//!
//! # Architecture
//!
//! Two external collaborators are abstracted here:
//!
//! - [`BlobStorage`] - local durable storage (guest mode). The whole cart
//!   is one JSON blob under a fixed well-known key, overwritten wholesale
//!   on every mutation.
//! - [`DocumentStore`] - a remote per-user document store (authenticated
//!   mode). Each line item is an individually addressable record keyed by
//!   its derived ID, with a live subscription pushing the full cart on
//!   every remote change. Orders live in their own collection.
//!
//! [`backend::CartBackend`] wraps the two behind one strategy interface so
//! each cart operation contains exactly one dispatch. [`memory`] provides
//! in-memory implementations for tests and embedding.

pub mod backend;
pub mod memory;

use async_trait::async_trait;
use tokio::sync::mpsc;

use orchard_core::{LineItem, LineItemId, NewOrder, Order, OrderId, OrderStatus, UserId};

use crate::error::PersistenceError;

pub use backend::{CartBackend, CartMode, GuestBackend, UserBackend};
pub use memory::{MemoryBlobStorage, MemoryDocumentStore};

/// Well-known local-storage key for the guest cart blob.
pub const DEFAULT_GUEST_CART_KEY: &str = "guest_cart";

/// String-keyed local durable storage, used only for the guest cart.
pub trait BlobStorage: Send + Sync {
    /// Read the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Store` if the underlying storage fails.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Write `value` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Store` if the underlying storage fails.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete the blob under `key`; deleting a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Store` if the underlying storage fails.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Per-user remote document store holding cart records and orders.
///
/// Writes must complete (or fail) before the call resolves; only the cart
/// watch delivers updates asynchronously. Concurrent writers from other
/// devices are not coordinated here - the store's last-write-wins semantics
/// is the only cross-device guarantee.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-shot fetch of all cart records for a user.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the store is unreachable or the read
    /// fails.
    async fn fetch_cart(&self, uid: &UserId) -> Result<Vec<LineItem>, PersistenceError>;

    /// Upsert one cart record, keyed by its derived line-item ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails.
    async fn put_cart_item(&self, uid: &UserId, item: &LineItem) -> Result<(), PersistenceError>;

    /// Delete one cart record. Deleting a missing record is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the delete fails.
    async fn delete_cart_item(
        &self,
        uid: &UserId,
        id: &LineItemId,
    ) -> Result<(), PersistenceError>;

    /// Open a live subscription on a user's cart.
    ///
    /// The watch immediately delivers the current snapshot, then the full
    /// list again on every remote change, until its guard is dropped or
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the subscription cannot be opened.
    async fn watch_cart(&self, uid: &UserId) -> Result<CartWatch, PersistenceError>;

    /// Persist a new order, assigning its document ID and timestamps.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails.
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, PersistenceError>;

    /// All orders for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the query fails.
    async fn orders_for_user(&self, uid: &UserId) -> Result<Vec<Order>, PersistenceError>;

    /// Fetch a single order by its document ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the query fails.
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, PersistenceError>;

    /// Update an order's status, bumping its `updated_at` timestamp.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the order does not exist or the write
    /// fails.
    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), PersistenceError>;
}

/// A live cart subscription: a channel of full-cart snapshots plus the
/// guard that keeps it registered.
#[derive(Debug)]
pub struct CartWatch {
    receiver: mpsc::UnboundedReceiver<Vec<LineItem>>,
    guard: WatchGuard,
}

impl CartWatch {
    /// Bundle a snapshot receiver with its cancellation guard.
    #[must_use]
    pub fn new(receiver: mpsc::UnboundedReceiver<Vec<LineItem>>, guard: WatchGuard) -> Self {
        Self { receiver, guard }
    }

    /// Receive the next full-cart snapshot, or `None` once the store side
    /// has gone away.
    pub async fn recv(&mut self) -> Option<Vec<LineItem>> {
        self.receiver.recv().await
    }

    /// Split into the raw receiver and the guard, so the receiver can move
    /// into a task while the guard stays with the session for teardown.
    #[must_use]
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<Vec<LineItem>>, WatchGuard) {
        (self.receiver, self.guard)
    }
}

/// Cancellation handle for a cart watch.
///
/// Dropping the guard unregisters the watcher; leaking it past the session
/// that opened it is a resource leak on the store side.
pub struct WatchGuard {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchGuard {
    /// Wrap a cancellation action that unregisters the watcher.
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the watch explicitly (equivalent to dropping the guard).
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGuard")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

//! In-memory storage implementations.
//!
//! `MemoryBlobStorage` stands in for device-local durable storage;
//! `MemoryDocumentStore` stands in for the remote per-user document store,
//! including live cart subscriptions. Both are used by the test suites and
//! are suitable for embedding in tools that don't need real persistence.
//!
//! The document store carries write fail-injection switches so tests can
//! exercise the partial-failure paths of the checkout workflow.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use orchard_core::{LineItem, LineItemId, NewOrder, Order, OrderId, OrderStatus, UserId};

use super::{BlobStorage, CartWatch, DocumentStore, WatchGuard};
use crate::error::PersistenceError;

/// In-memory string-keyed blob storage.
#[derive(Debug, Default)]
pub struct MemoryBlobStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStorage for MemoryBlobStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.remove(key);
        Ok(())
    }
}

type Watcher = (u64, mpsc::UnboundedSender<Vec<LineItem>>);

#[derive(Default)]
struct StoreInner {
    carts: HashMap<UserId, BTreeMap<LineItemId, LineItem>>,
    orders: Vec<Order>,
    watchers: HashMap<UserId, Vec<Watcher>>,
    next_watch_id: u64,
}

impl StoreInner {
    fn cart_snapshot(&self, uid: &UserId) -> Vec<LineItem> {
        self.carts
            .get(uid)
            .map(|cart| cart.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Push the current snapshot to every live watcher for `uid`, pruning
    /// watchers whose receiver has gone away.
    fn fan_out(&mut self, uid: &UserId) {
        let snapshot = self.cart_snapshot(uid);
        if let Some(watchers) = self.watchers.get_mut(uid) {
            watchers.retain(|(_, tx)| tx.send(snapshot.clone()).is_ok());
        }
    }
}

/// In-memory per-user document store with live cart subscriptions.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<StoreInner>>,
    fail_cart_writes: AtomicBool,
    fail_order_writes: AtomicBool,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent cart writes (upserts and deletes) fail.
    pub fn set_fail_cart_writes(&self, fail: bool) {
        self.fail_cart_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent order inserts fail.
    pub fn set_fail_order_writes(&self, fail: bool) {
        self.fail_order_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of live cart watchers registered for a user.
    #[must_use]
    pub fn watcher_count(&self, uid: &UserId) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.watchers.get(uid).map_or(0, Vec::len)
    }

    /// Number of orders persisted across all users.
    #[must_use]
    pub fn order_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.orders.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_cart_writes(&self) -> Result<(), PersistenceError> {
        if self.fail_cart_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Store(
                "injected cart write failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_cart(&self, uid: &UserId) -> Result<Vec<LineItem>, PersistenceError> {
        Ok(self.lock().cart_snapshot(uid))
    }

    async fn put_cart_item(&self, uid: &UserId, item: &LineItem) -> Result<(), PersistenceError> {
        self.check_cart_writes()?;
        let mut inner = self.lock();
        inner
            .carts
            .entry(uid.clone())
            .or_default()
            .insert(item.id.clone(), item.clone());
        inner.fan_out(uid);
        Ok(())
    }

    async fn delete_cart_item(
        &self,
        uid: &UserId,
        id: &LineItemId,
    ) -> Result<(), PersistenceError> {
        self.check_cart_writes()?;
        let mut inner = self.lock();
        if let Some(cart) = inner.carts.get_mut(uid) {
            cart.remove(id);
        }
        inner.fan_out(uid);
        Ok(())
    }

    async fn watch_cart(&self, uid: &UserId) -> Result<CartWatch, PersistenceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        // Deliver the current snapshot up front; it doubles as the initial
        // load for the session.
        let _ = tx.send(inner.cart_snapshot(uid));

        let watch_id = inner.next_watch_id;
        inner.next_watch_id += 1;
        inner
            .watchers
            .entry(uid.clone())
            .or_default()
            .push((watch_id, tx));
        drop(inner);

        let registry = Arc::clone(&self.inner);
        let owner = uid.clone();
        let guard = WatchGuard::new(move || {
            let mut inner = registry.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(watchers) = inner.watchers.get_mut(&owner) {
                watchers.retain(|(id, _)| *id != watch_id);
            }
        });

        Ok(CartWatch::new(rx, guard))
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, PersistenceError> {
        if self.fail_order_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Store(
                "injected order write failure".to_string(),
            ));
        }
        let persisted = Order::from_new(
            order.clone(),
            OrderId::new(Uuid::new_v4().to_string()),
            Utc::now(),
        );
        self.lock().orders.push(persisted.clone());
        Ok(persisted)
    }

    async fn orders_for_user(&self, uid: &UserId) -> Result<Vec<Order>, PersistenceError> {
        let inner = self.lock();
        // Insertion order is creation order; reverse for newest-first.
        Ok(inner
            .orders
            .iter()
            .rev()
            .filter(|o| &o.user_id == uid)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, PersistenceError> {
        let inner = self.lock();
        Ok(inner.orders.iter().find(|o| &o.id == id).cloned())
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), PersistenceError> {
        let mut inner = self.lock();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| PersistenceError::Store(format!("order {id} not found")))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }
}

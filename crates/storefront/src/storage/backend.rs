//! Per-mode cart persistence strategy.
//!
//! The session selects one [`CartBackend`] when it enters a mode, so each
//! cart operation contains exactly one dispatch instead of a guest/user
//! branch per operation. Guest mode rewrites the whole blob; authenticated
//! mode touches only the affected record and relies on the subscription
//! echo for convergence.

use std::sync::Arc;

use async_trait::async_trait;

use orchard_core::{LineItem, LineItemId, UserId};

use super::{BlobStorage, CartWatch, DocumentStore};
use crate::error::PersistenceError;

/// Which backing store a cart session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMode {
    /// Local blob storage, no identity required.
    Guest,
    /// Per-user remote document store with live updates.
    Authenticated,
}

/// Persistence strategy for one cart session mode.
///
/// Mutating methods receive both the prospective full list and the delta;
/// each implementation uses whichever its write granularity needs. Writes
/// complete (or fail) before the call resolves.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// The mode this backend serves.
    fn mode(&self) -> CartMode;

    /// Initial load of the persisted line-item list.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the read or decode fails.
    async fn load(&self) -> Result<Vec<LineItem>, PersistenceError>;

    /// Persist an inserted or updated item. `items` is the full
    /// post-mutation list.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails; the caller must not
    /// apply the mutation in memory.
    async fn save_item(
        &self,
        items: &[LineItem],
        item: &LineItem,
    ) -> Result<(), PersistenceError>;

    /// Persist an item removal. `items` is the full post-mutation list.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the write fails.
    async fn remove_item(
        &self,
        items: &[LineItem],
        id: &LineItemId,
    ) -> Result<(), PersistenceError>;

    /// Persist a full clear. `removed` is the list being deleted.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if any write fails.
    async fn clear(&self, removed: &[LineItem]) -> Result<(), PersistenceError>;

    /// Open the live subscription for this backend, if it has one.
    /// Guest storage is not push-capable and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the subscription cannot be opened.
    async fn watch(&self) -> Result<Option<CartWatch>, PersistenceError>;
}

/// Guest backend: the whole cart is one JSON blob under a fixed key.
pub struct GuestBackend {
    storage: Arc<dyn BlobStorage>,
    key: String,
}

impl GuestBackend {
    /// Bind to a blob storage under the given cart key.
    #[must_use]
    pub fn new(storage: Arc<dyn BlobStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    fn write_all(&self, items: &[LineItem]) -> Result<(), PersistenceError> {
        let blob = serde_json::to_string(items)?;
        self.storage.set(&self.key, &blob)
    }
}

#[async_trait]
impl CartBackend for GuestBackend {
    fn mode(&self) -> CartMode {
        CartMode::Guest
    }

    async fn load(&self) -> Result<Vec<LineItem>, PersistenceError> {
        match self.storage.get(&self.key)? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_item(
        &self,
        items: &[LineItem],
        _item: &LineItem,
    ) -> Result<(), PersistenceError> {
        self.write_all(items)
    }

    async fn remove_item(
        &self,
        items: &[LineItem],
        _id: &LineItemId,
    ) -> Result<(), PersistenceError> {
        self.write_all(items)
    }

    async fn clear(&self, _removed: &[LineItem]) -> Result<(), PersistenceError> {
        self.write_all(&[])
    }

    async fn watch(&self) -> Result<Option<CartWatch>, PersistenceError> {
        Ok(None)
    }
}

/// Authenticated backend: each item is an individually addressable record
/// in the user's remote cart collection.
pub struct UserBackend {
    store: Arc<dyn DocumentStore>,
    uid: UserId,
}

impl UserBackend {
    /// Bind to a document store for one user.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, uid: UserId) -> Self {
        Self { store, uid }
    }
}

#[async_trait]
impl CartBackend for UserBackend {
    fn mode(&self) -> CartMode {
        CartMode::Authenticated
    }

    async fn load(&self) -> Result<Vec<LineItem>, PersistenceError> {
        self.store.fetch_cart(&self.uid).await
    }

    async fn save_item(
        &self,
        _items: &[LineItem],
        item: &LineItem,
    ) -> Result<(), PersistenceError> {
        self.store.put_cart_item(&self.uid, item).await
    }

    async fn remove_item(
        &self,
        _items: &[LineItem],
        id: &LineItemId,
    ) -> Result<(), PersistenceError> {
        self.store.delete_cart_item(&self.uid, id).await
    }

    async fn clear(&self, removed: &[LineItem]) -> Result<(), PersistenceError> {
        // No bulk delete in the store contract; every known record goes
        // individually.
        for item in removed {
            self.store.delete_cart_item(&self.uid, &item.id).await?;
        }
        Ok(())
    }

    async fn watch(&self) -> Result<Option<CartWatch>, PersistenceError> {
        Ok(Some(self.store.watch_cart(&self.uid).await?))
    }
}

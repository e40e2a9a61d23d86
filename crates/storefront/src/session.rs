//! Cart reconciliation state machine.
//!
//! A [`CartSession`] owns the authoritative in-memory line-item list for
//! one user/device context. It decides which backing store is live (guest
//! blob vs. per-user document store), re-runs the load path on every auth
//! transition, and exposes the only mutation surface over the list.
//!
//! # States
//!
//! `Uninitialized -> Loading -> Ready(mode)`. Every call to
//! [`CartSession::set_auth`] re-enters `Loading` and completes at
//! `Ready(mode)` once the initial load finishes: a synchronous blob read
//! for guests, the first subscription snapshot for authenticated users.
//!
//! Guest and authenticated carts are independent; switching modes never
//! merges them. Whether sign-in should merge a non-empty guest cart is an
//! open product question, deliberately not answered here.
//!
//! # Concurrency
//!
//! All operations serialize through one async mutex per session, so rapid
//! concurrent calls (e.g. repeated quantity clicks) cannot lose updates.
//! Carts of the same user on other devices are not coordinated; the remote
//! store's last-write-wins semantics is the only cross-device guarantee.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use orchard_core::{LineItem, LineItemId, NewLineItem, UserId};

use crate::error::CartError;
use crate::pricing::{CartTotals, PricingConfig};
use crate::storage::{
    BlobStorage, CartBackend, CartMode, DocumentStore, GuestBackend, UserBackend, WatchGuard,
};

/// Identity signal from the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Guest,
    Authenticated(UserId),
}

impl AuthState {
    /// The user ID, when authenticated.
    #[must_use]
    pub const fn uid(&self) -> Option<&UserId> {
        match self {
            Self::Guest => None,
            Self::Authenticated(uid) => Some(uid),
        }
    }
}

/// Lifecycle state of a cart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    /// No load has been requested yet.
    Uninitialized,
    /// A load against the current backing store is in flight.
    Loading,
    /// The initial load completed; mutations are accepted.
    Ready(CartMode),
}

/// Live subscription bookkeeping: the registration guard plus the task
/// applying remote snapshots.
struct WatchTask {
    guard: WatchGuard,
    task: JoinHandle<()>,
}

impl WatchTask {
    fn stop(self) {
        self.task.abort();
        self.guard.cancel();
    }
}

struct SessionInner {
    state: CartState,
    items: Vec<LineItem>,
    backend: Option<Arc<dyn CartBackend>>,
    watch: Option<WatchTask>,
    /// Bumped on every auth transition so a stale watch task can never
    /// apply a snapshot from a previous mode.
    epoch: u64,
}

/// The cart session: exclusive owner of the in-memory line-item list.
pub struct CartSession {
    local: Arc<dyn BlobStorage>,
    remote: Arc<dyn DocumentStore>,
    guest_cart_key: String,
    inner: Arc<Mutex<SessionInner>>,
}

impl CartSession {
    /// Create an uninitialized session over the two backing stores.
    ///
    /// Call [`Self::set_auth`] to run the initial load.
    #[must_use]
    pub fn new(local: Arc<dyn BlobStorage>, remote: Arc<dyn DocumentStore>) -> Self {
        Self::with_guest_cart_key(local, remote, crate::storage::DEFAULT_GUEST_CART_KEY)
    }

    /// Like [`Self::new`], with a custom guest cart blob key.
    #[must_use]
    pub fn with_guest_cart_key(
        local: Arc<dyn BlobStorage>,
        remote: Arc<dyn DocumentStore>,
        guest_cart_key: impl Into<String>,
    ) -> Self {
        Self {
            local,
            remote,
            guest_cart_key: guest_cart_key.into(),
            inner: Arc::new(Mutex::new(SessionInner {
                state: CartState::Uninitialized,
                items: Vec::new(),
                backend: None,
                watch: None,
                epoch: 0,
            })),
        }
    }

    /// React to an auth transition: tear down the previous backing store,
    /// select the one for `auth`, and re-run the load path.
    ///
    /// On return the session is `Ready` for the new mode. Guest and
    /// authenticated carts are never merged.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence` if the initial load fails; the
    /// session then stays in `Loading` and mutations return
    /// `CartError::NotReady` until a later `set_auth` succeeds.
    #[instrument(skip(self))]
    pub async fn set_auth(&self, auth: AuthState) -> Result<(), CartError> {
        let mut inner = self.inner.lock().await;

        if let Some(watch) = inner.watch.take() {
            watch.stop();
        }
        inner.state = CartState::Loading;
        inner.backend = None;
        inner.epoch += 1;
        let epoch = inner.epoch;

        match auth {
            AuthState::Guest => {
                let backend = Arc::new(GuestBackend::new(
                    Arc::clone(&self.local),
                    self.guest_cart_key.clone(),
                ));
                inner.items = backend.load().await?;
                inner.backend = Some(backend);
                inner.state = CartState::Ready(CartMode::Guest);
                info!(items = inner.items.len(), "cart ready in guest mode");
            }
            AuthState::Authenticated(uid) => {
                let backend = Arc::new(UserBackend::new(Arc::clone(&self.remote), uid.clone()));
                let watch = backend
                    .watch()
                    .await?
                    .ok_or_else(|| {
                        crate::error::PersistenceError::Store(
                            "authenticated backend did not provide a subscription".to_string(),
                        )
                    })?;
                let (mut receiver, guard) = watch.into_parts();

                // The first snapshot doubles as the initial load.
                inner.items = receiver.recv().await.unwrap_or_default();
                inner.backend = Some(backend);
                inner.watch = Some(WatchTask {
                    guard,
                    task: self.spawn_watch_task(receiver, epoch),
                });
                inner.state = CartState::Ready(CartMode::Authenticated);
                info!(
                    %uid,
                    items = inner.items.len(),
                    "cart ready in authenticated mode"
                );
            }
        }

        Ok(())
    }

    /// Tear down the session: cancel the live subscription and return to
    /// `Uninitialized` with an empty in-memory list.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(watch) = inner.watch.take() {
            watch.stop();
        }
        inner.state = CartState::Uninitialized;
        inner.backend = None;
        inner.items.clear();
        inner.epoch += 1;
        debug!("cart session torn down");
    }

    fn spawn_watch_task(
        &self,
        mut receiver: mpsc::UnboundedReceiver<Vec<LineItem>>,
        epoch: u64,
    ) -> JoinHandle<()> {
        // The task holds only a weak reference so a dropped session is not
        // kept alive by its own subscription.
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while let Some(snapshot) = receiver.recv().await {
                let Some(session) = weak.upgrade() else { break };
                let mut inner = session.lock().await;
                if inner.epoch != epoch {
                    break;
                }
                debug!(items = snapshot.len(), "applying remote cart snapshot");
                inner.items = snapshot;
            }
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add an item to the cart.
    ///
    /// If an item with the same derived `(product, color, storage)` ID is
    /// already present, its quantity is incremented by the descriptor's
    /// quantity; otherwise a new line is inserted. The write is persisted
    /// before the in-memory list changes, so a failure leaves the previous
    /// state intact.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the initial load completes,
    /// or `CartError::Persistence` if the backing store write fails.
    #[instrument(skip(self, draft), fields(product_id = %draft.product_id))]
    pub async fn add_item(&self, draft: NewLineItem) -> Result<(), CartError> {
        let mut inner = self.inner.lock().await;
        let backend = inner.backend.clone().ok_or(CartError::NotReady)?;

        // A zero-quantity descriptor would either be a no-op merge or an
        // invalid line; reject it up front.
        if draft.quantity == 0 {
            return Ok(());
        }

        let id = draft.derived_id();
        let mut next = inner.items.clone();
        let item = match next.iter_mut().find(|i| i.id == id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(draft.quantity);
                existing.clone()
            }
            None => {
                let item = draft.into_line_item(Utc::now());
                next.push(item.clone());
                item
            }
        };

        backend.save_item(&next, &item).await?;
        inner.items = next;
        debug!(item_id = %item.id, quantity = item.quantity, "added item to cart");
        Ok(())
    }

    /// Set an item's quantity exactly.
    ///
    /// A quantity of zero or less removes the item entirely; a quantity
    /// for an unknown ID is a valid, silent no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the initial load completes,
    /// or `CartError::Persistence` if the backing store write fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, id: &LineItemId, quantity: i64) -> Result<(), CartError> {
        let mut inner = self.inner.lock().await;
        let backend = inner.backend.clone().ok_or(CartError::NotReady)?;

        if !inner.items.iter().any(|i| i.id == *id) {
            return Ok(());
        }

        if quantity <= 0 {
            let next: Vec<LineItem> =
                inner.items.iter().filter(|i| i.id != *id).cloned().collect();
            backend.remove_item(&next, id).await?;
            inner.items = next;
            debug!(item_id = %id, "removed item via zero quantity");
            return Ok(());
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut next = inner.items.clone();
        let Some(item) = next.iter_mut().find(|i| i.id == *id) else {
            return Ok(());
        };
        item.quantity = quantity;
        let item = item.clone();

        backend.save_item(&next, &item).await?;
        inner.items = next;
        debug!(item_id = %id, quantity, "updated item quantity");
        Ok(())
    }

    /// Remove an item. Removing an unknown ID is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the initial load completes,
    /// or `CartError::Persistence` if the backing store write fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, id: &LineItemId) -> Result<(), CartError> {
        let mut inner = self.inner.lock().await;
        let backend = inner.backend.clone().ok_or(CartError::NotReady)?;

        if !inner.items.iter().any(|i| i.id == *id) {
            return Ok(());
        }

        let next: Vec<LineItem> = inner.items.iter().filter(|i| i.id != *id).cloned().collect();
        backend.remove_item(&next, id).await?;
        inner.items = next;
        debug!(item_id = %id, "removed item from cart");
        Ok(())
    }

    /// Remove all items.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotReady` before the initial load completes,
    /// or `CartError::Persistence` if the backing store write fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        let mut inner = self.inner.lock().await;
        let backend = inner.backend.clone().ok_or(CartError::NotReady)?;

        let removed = inner.items.clone();
        backend.clear(&removed).await?;
        inner.items.clear();
        debug!(removed = removed.len(), "cleared cart");
        Ok(())
    }

    // =========================================================================
    // Read surface
    // =========================================================================

    /// Current lifecycle state.
    pub async fn state(&self) -> CartState {
        self.inner.lock().await.state
    }

    /// Current mode, once ready.
    pub async fn mode(&self) -> Option<CartMode> {
        match self.inner.lock().await.state {
            CartState::Ready(mode) => Some(mode),
            _ => None,
        }
    }

    /// Snapshot of the current line-item list.
    pub async fn items(&self) -> Vec<LineItem> {
        self.inner.lock().await.items.clone()
    }

    /// Whether the cart has no items.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    /// Total number of units in the cart.
    pub async fn item_count(&self) -> u32 {
        crate::pricing::item_count(&self.inner.lock().await.items)
    }

    /// Derived totals under a pricing policy; recomputed on every call.
    pub async fn totals(&self, pricing: &PricingConfig) -> CartTotals {
        pricing.totals(&self.inner.lock().await.items)
    }
}

impl Drop for CartSession {
    fn drop(&mut self) {
        // Best-effort teardown; the watch task itself only holds a weak
        // reference, so worst case it exits on its next snapshot.
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(watch) = inner.watch.take() {
                watch.stop();
            }
        }
    }
}

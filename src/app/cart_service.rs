//! The Cart Store service.
//!
//! This module ties the cart model to its persistence and its consumers:
//! 1.  Loads the serialized snapshot from the key-value store once, at open.
//! 2.  Applies the three cart mutations (add, increment, decrement) against
//!     the in-memory cart.
//! 3.  After every mutation, publishes the new snapshot to all subscribers
//!     and enqueues a persistence job for the background worker.
//!
//! Persistence jobs are consumed by a single worker task in submission order,
//! one write in flight at a time, so a later mutation's snapshot can never be
//! overwritten by an earlier one's write landing late. Each write targets only
//! the cart's own namespaced key.

use crate::domain::cart::{Cart, CartLine, Product};
use crate::storage::kv::{KvStore, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;

/// Cart service failure taxonomy.
///
/// Storage read/write failures during normal operation are absorbed by the
/// service (empty cart on load, logged-and-dropped on write) and only become
/// visible through [`CartService::flush`].
#[derive(Debug, Error)]
pub enum CartError {
    /// The session was shut down; mutations are no longer accepted.
    #[error("cart session is closed")]
    SessionClosed,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

enum PersistJob {
    Snapshot(Vec<CartLine>),
    /// Barrier: acknowledged once every previously enqueued write has been
    /// attempted, carrying the first failure since the last barrier.
    Flush(oneshot::Sender<Result<(), StorageError>>),
}

/// The main service that manages cart state, persistence, and publication.
///
/// Constructed once per session and handed to consumers explicitly (typically
/// as an `Arc<CartService>`); there is no ambient registry to look it up in.
pub struct CartService {
    snapshot_key: String,
    cart: Mutex<Cart>,
    /// Publication channel; every mutation replaces the whole snapshot, so
    /// subscribers see a republish even when the mutation was a no-op.
    watch_tx: watch::Sender<Vec<CartLine>>,
    /// `None` once the session has been shut down.
    persist_tx: Mutex<Option<mpsc::UnboundedSender<PersistJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CartService {
    /// Opens a cart session against `store`, loading the snapshot stored
    /// under `snapshot_key`.
    ///
    /// Loading is best-effort: an absent key starts an empty cart, and a read
    /// failure or undecodable snapshot is logged and also starts an empty
    /// cart. A storage problem never prevents the session from opening.
    pub async fn open(store: Arc<dyn KvStore>, snapshot_key: impl Into<String>) -> Self {
        let snapshot_key = snapshot_key.into();

        let cart = match store.get(&snapshot_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => Cart::from_lines(lines),
                Err(e) => {
                    tracing::warn!(key = %snapshot_key, error = %e, "stored cart snapshot is not decodable; starting empty");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(key = %snapshot_key, error = %e, "failed to read cart snapshot; starting empty");
                Cart::new()
            }
        };

        let (watch_tx, _) = watch::channel(cart.snapshot());
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_persist_worker(
            store,
            snapshot_key.clone(),
            persist_rx,
        ));

        Self {
            snapshot_key,
            cart: Mutex::new(cart),
            watch_tx,
            persist_tx: Mutex::new(Some(persist_tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// The key this session persists its snapshot under.
    pub fn snapshot_key(&self) -> &str {
        &self.snapshot_key
    }

    /// Adds a product to the cart: quantity 1 for a new id, +1 for an
    /// existing id (the rest of the descriptor is ignored in that case).
    pub async fn add_to_cart(&self, product: Product) -> Result<Vec<CartLine>, CartError> {
        self.mutate(|cart| cart.add(product)).await
    }

    /// Increments the quantity of the line with `id`. An absent id leaves the
    /// cart unchanged but the snapshot is still republished and re-persisted.
    pub async fn increment(&self, id: &str) -> Result<Vec<CartLine>, CartError> {
        self.mutate(|cart| {
            cart.increment(id);
        })
        .await
    }

    /// Decrements the quantity of the line with `id`, removing the line when
    /// it would reach zero. An absent id is a no-op, still republished.
    pub async fn decrement(&self, id: &str) -> Result<Vec<CartLine>, CartError> {
        self.mutate(|cart| {
            cart.decrement(id);
        })
        .await
    }

    /// The current cart snapshot.
    pub async fn snapshot(&self) -> Vec<CartLine> {
        self.cart.lock().await.snapshot()
    }

    /// Total number of units in the cart.
    pub async fn total_items(&self) -> u64 {
        self.cart.lock().await.total_items()
    }

    /// Total price of the cart.
    pub async fn total_price(&self) -> f64 {
        self.cart.lock().await.total_price()
    }

    /// Subscribes to snapshot publications. The receiver is primed with the
    /// snapshot current at subscription time; every mutation after that marks
    /// it changed, including no-op mutations.
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartLine>> {
        self.watch_tx.subscribe()
    }

    /// Waits until every persistence job enqueued so far has been attempted.
    ///
    /// Returns the first write failure since the last flush, if any. This is
    /// the only place write failures surface; mutations themselves never
    /// block on storage.
    pub async fn flush(&self) -> Result<(), CartError> {
        let ack_rx = {
            let tx_guard = self.persist_tx.lock().await;
            let tx = tx_guard.as_ref().ok_or(CartError::SessionClosed)?;
            let (ack_tx, ack_rx) = oneshot::channel();
            tx.send(PersistJob::Flush(ack_tx))
                .map_err(|_| CartError::SessionClosed)?;
            ack_rx
        };
        match ack_rx.await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CartError::SessionClosed),
        }
    }

    /// Closes the session: drains the persistence queue, stops the worker,
    /// and rejects every mutation from then on with
    /// [`CartError::SessionClosed`].
    pub async fn shutdown(&self) {
        // Dropping the sender closes the queue; the worker drains what is
        // already enqueued and exits.
        drop(self.persist_tx.lock().await.take());
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "cart persistence worker ended abnormally");
            }
        }
    }

    /// Applies `op` to the cart, then republishes and enqueues persistence.
    ///
    /// The sender lock is held across the whole step so a mutation cannot
    /// interleave with `shutdown` taking the sender.
    async fn mutate<F>(&self, op: F) -> Result<Vec<CartLine>, CartError>
    where
        F: FnOnce(&mut Cart),
    {
        let tx_guard = self.persist_tx.lock().await;
        let tx = tx_guard.as_ref().ok_or(CartError::SessionClosed)?;

        let mut cart = self.cart.lock().await;
        op(&mut cart);
        let snapshot = cart.snapshot();
        drop(cart);

        tx.send(PersistJob::Snapshot(snapshot.clone()))
            .map_err(|_| CartError::SessionClosed)?;
        self.watch_tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }
}

/// Background persistence worker: one write at a time, strictly in submission
/// order. Write failures are logged and remembered until the next flush
/// barrier; the in-memory cart is already updated, so the user is not blocked.
async fn run_persist_worker(
    store: Arc<dyn KvStore>,
    snapshot_key: String,
    mut jobs: mpsc::UnboundedReceiver<PersistJob>,
) {
    let mut last_failure: Option<StorageError> = None;

    while let Some(job) = jobs.recv().await {
        match job {
            PersistJob::Snapshot(lines) => {
                let payload = match serde_json::to_string(&lines) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(key = %snapshot_key, error = %e, "failed to encode cart snapshot");
                        last_failure = Some(StorageError::Write(e.into()));
                        continue;
                    }
                };
                match store.set(&snapshot_key, &payload).await {
                    Ok(()) => {
                        tracing::debug!(key = %snapshot_key, lines = lines.len(), "cart snapshot persisted");
                    }
                    Err(e) => {
                        tracing::warn!(key = %snapshot_key, error = %e, "failed to persist cart snapshot");
                        if last_failure.is_none() {
                            last_failure = Some(e);
                        }
                    }
                }
            }
            PersistJob::Flush(ack) => {
                let result = match last_failure.take() {
                    Some(e) => Err(e),
                    None => Ok(()),
                };
                // The flusher may have given up waiting; nothing to do then.
                let _ = ack.send(result);
            }
        }
    }
}

//! Asynchronous key-value persistence for cart snapshots.
//!
//! The cart service only ever touches its own namespaced key, so the contract
//! is deliberately small: get, scoped upsert, scoped remove. There is no
//! clear-all operation; unrelated keys in the same store must survive cart
//! activity.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use async_trait::async_trait;
use thiserror::Error;

/// Storage failure taxonomy. Sources are carried as `anyhow::Error` so
/// backends are free to wrap whatever driver error they hit.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed")]
    Read(#[source] anyhow::Error),
    #[error("storage write failed")]
    Write(#[source] anyhow::Error),
}

/// A local asynchronous key-value store addressed by string keys.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value for that key
    /// and leaving every other key untouched.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes the value stored under `key`, if any.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

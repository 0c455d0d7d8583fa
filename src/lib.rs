pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;

// Convenience re-exports (keeps call-sites clean)
pub use app::cart_service::{CartError, CartService};
pub use domain::cart::{Cart, CartLine, Product};
pub use storage::kv::{KvStore, MemoryKvStore, SqliteKvStore, StorageError};

//! Centralized configuration (environment variables + defaults).

/// SQLite URL for the on-device snapshot store.
///
/// `mode=rwc` creates the database file on first run.
pub fn cart_database_url() -> String {
    std::env::var("CART_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://marketplace_cart.db?mode=rwc".to_string())
}

/// Namespaced key the serialized cart snapshot is stored under.
pub fn cart_snapshot_key() -> String {
    std::env::var("CART_SNAPSHOT_KEY").unwrap_or_else(|_| "@marketplace:cart".to_string())
}

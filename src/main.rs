//! Demo binary: runs a short cart session against the on-device SQLite store.
//!
//! Run it twice to see the snapshot survive a "restart":
//!   cargo run --bin cart-demo

use marketplace_cart::infra::config;
use marketplace_cart::{CartService, Product, SqliteKvStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store = SqliteKvStore::connect(&config::cart_database_url()).await?;
    let service = Arc::new(CartService::open(Arc::new(store), config::cart_snapshot_key()).await);

    println!("cart at startup: {} line(s)", service.snapshot().await.len());

    service
        .add_to_cart(Product {
            id: "sku-headphones".to_string(),
            title: "Wireless Headphones".to_string(),
            image_url: "https://img.example/headphones.png".to_string(),
            price: 249.9,
        })
        .await?;
    service
        .add_to_cart(Product {
            id: "sku-speaker".to_string(),
            title: "Bluetooth Speaker".to_string(),
            image_url: "https://img.example/speaker.png".to_string(),
            price: 119.0,
        })
        .await?;
    service.increment("sku-headphones").await?;

    for line in service.snapshot().await {
        println!("  {} x{} @ {:.2}", line.title, line.quantity, line.price);
    }
    println!(
        "total: {} item(s), {:.2}",
        service.total_items().await,
        service.total_price().await
    );

    service.flush().await?;
    service.shutdown().await;
    Ok(())
}

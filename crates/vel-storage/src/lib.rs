//! Fact store accessor (in-memory and PostgreSQL) plus the HTTP page fetcher.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use vel_core::{
    ActivityLogEntry, FactSnapshot, NewActivity, NewProduct, PriceObservation, Product,
    ProductFacts, ProductId, SentimentObservation, VerifiedPrice, VerifiedSentiment,
};

pub mod fetch;
pub mod memory;
pub mod postgres;

pub use fetch::{
    classify_reqwest_error, classify_status, BackoffPolicy, FetchError, FetchedPage,
    PageFetcher, PageFetcherConfig, RetryDisposition, DEFAULT_USER_AGENTS,
};
pub use memory::MemoryFactStore;
pub use postgres::PgFactStore;

pub const CRATE_NAME: &str = "vel-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),
    #[error("stored row is invalid: {0}")]
    InvalidRow(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Read/write access to products, grounded observations and the activity log.
///
/// Writes only take verified facts, so every stored observation carries a source.
#[async_trait]
pub trait FactStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// All products in insertion order.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError>;
    async fn update_insight(&self, id: ProductId, insight: &str) -> Result<Product, StoreError>;

    /// Price history of one product, newest first.
    async fn list_prices(&self, product_id: ProductId) -> Result<Vec<PriceObservation>, StoreError>;
    /// Every price observation in insertion order.
    async fn list_all_prices(&self) -> Result<Vec<PriceObservation>, StoreError>;
    async fn add_price(&self, price: VerifiedPrice) -> Result<PriceObservation, StoreError>;

    /// Sentiment observations, newest first, optionally for one product.
    async fn list_sentiment(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<Vec<SentimentObservation>, StoreError>;
    async fn add_sentiment(
        &self,
        sentiment: VerifiedSentiment,
    ) -> Result<SentimentObservation, StoreError>;

    async fn append_activity(&self, entry: NewActivity) -> Result<ActivityLogEntry, StoreError>;
    /// Most recent entries first.
    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityLogEntry>, StoreError>;
}

/// Read every fact once and group it per product, in product insertion order.
pub async fn load_snapshot(store: &dyn FactStore) -> Result<FactSnapshot, StoreError> {
    let products = store.list_products().await?;
    let mut prices: HashMap<ProductId, Vec<PriceObservation>> = HashMap::new();
    for price in store.list_all_prices().await? {
        prices.entry(price.product_id).or_default().push(price);
    }
    let mut sentiments: HashMap<ProductId, Vec<SentimentObservation>> = HashMap::new();
    // Listed newest first; reversed to keep insertion order in the snapshot.
    for sentiment in store.list_sentiment(None).await?.into_iter().rev() {
        sentiments.entry(sentiment.product_id).or_default().push(sentiment);
    }

    let products = products
        .into_iter()
        .map(|product| {
            let id = product.id;
            let mut facts = ProductFacts::new(product);
            facts.prices = prices.remove(&id).unwrap_or_default();
            facts.sentiments = sentiments.remove(&id).unwrap_or_default();
            facts
        })
        .collect();
    Ok(FactSnapshot::new(products))
}

/// PostgreSQL when a database URL is given (migrations applied), in-memory otherwise.
pub async fn open_store(database_url: Option<&str>) -> anyhow::Result<Arc<dyn FactStore>> {
    match database_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let store = PgFactStore::connect(url)
                .await
                .context("connecting to the fact database")?;
            store.migrate().await.context("applying fact store migrations")?;
            tracing::info!(backend = store.backend(), "fact store ready");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!(backend = "memory", "DATABASE_URL not set, facts are kept in memory");
            Ok(Arc::new(MemoryFactStore::default()))
        }
    }
}

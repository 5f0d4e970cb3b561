use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use vel_core::{
    ActivityLogEntry, NewActivity, NewProduct, PriceObservation, Product, ProductId,
    SentimentObservation, VerifiedPrice, VerifiedSentiment,
};

use crate::{FactStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    prices: Vec<PriceObservation>,
    sentiments: Vec<SentimentObservation>,
    activity: Vec<ActivityLogEntry>,
}

impl Tables {
    fn require_product(&self, id: ProductId) -> Result<(), StoreError> {
        if self.products.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(StoreError::ProductNotFound(id))
        }
    }
}

/// Process-local fact store. Ids are 1-based and follow insertion order, rows are never removed.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    tables: RwLock<Tables>,
}

impl MemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

#[async_trait]
impl FactStore for MemoryFactStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.tables.read().await.products.clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let product = product.normalized();
        let mut tables = self.tables.write().await;
        let row = Product {
            id: next_id(tables.products.len()),
            name: product.name,
            category: product.category,
            competitor: product.competitor,
            insight: product.insight,
            created_at: Utc::now(),
        };
        tables.products.push(row.clone());
        Ok(row)
    }

    async fn update_insight(&self, id: ProductId, insight: &str) -> Result<Product, StoreError> {
        let mut tables = self.tables.write().await;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.insight = insight.trim().to_string();
        Ok(product.clone())
    }

    async fn list_prices(&self, product_id: ProductId) -> Result<Vec<PriceObservation>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PriceObservation> = tables
            .prices
            .iter()
            .filter(|p| p.product_id == product_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.observed_at.cmp(&a.observed_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn list_all_prices(&self) -> Result<Vec<PriceObservation>, StoreError> {
        Ok(self.tables.read().await.prices.clone())
    }

    async fn add_price(&self, price: VerifiedPrice) -> Result<PriceObservation, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_product(price.product_id())?;
        let row = PriceObservation {
            id: next_id(tables.prices.len()),
            product_id: price.product_id(),
            price: price.price(),
            currency: price.currency().to_string(),
            source: price.source().clone(),
            observed_at: price.observed_at(),
        };
        tables.prices.push(row.clone());
        Ok(row)
    }

    async fn list_sentiment(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<Vec<SentimentObservation>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<SentimentObservation> = tables
            .sentiments
            .iter()
            .filter(|s| product_id.map_or(true, |id| s.product_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.observed_at.cmp(&a.observed_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn add_sentiment(
        &self,
        sentiment: VerifiedSentiment,
    ) -> Result<SentimentObservation, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_product(sentiment.product_id())?;
        let row = SentimentObservation {
            id: next_id(tables.sentiments.len()),
            product_id: sentiment.product_id(),
            score: sentiment.score(),
            text: sentiment.text().map(ToString::to_string),
            raw_reviews: sentiment.raw_reviews().to_vec(),
            source: sentiment.source().clone(),
            observed_at: sentiment.observed_at(),
        };
        tables.sentiments.push(row.clone());
        Ok(row)
    }

    async fn append_activity(&self, entry: NewActivity) -> Result<ActivityLogEntry, StoreError> {
        let mut tables = self.tables.write().await;
        let row = ActivityLogEntry {
            id: next_id(tables.activity.len()),
            action: entry.action,
            status: entry.status,
            details: entry.details,
            created_at: Utc::now(),
        };
        tables.activity.push(row.clone());
        Ok(row)
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityLogEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.activity.iter().rev().take(limit).cloned().collect())
    }
}

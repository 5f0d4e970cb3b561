use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vel_adapters::{
    AdapterError, DemoCatalogAdapter, ScrapeAdapter, ScrapeTarget, ScrapedItem, ScrapedPrice,
    ScrapedSentiment,
};
use vel_core::{
    ActivityLogEntry, ActivityStatus, NewActivity, NewProduct, PriceObservation, Product,
    ProductId, SentimentObservation, VerifiedPrice, VerifiedSentiment,
};
use vel_storage::{FactStore, MemoryFactStore, StoreError};
use vel_sync::{IngestionJobs, IngestionPipeline, TargetRegistry};

struct FixedAdapter {
    items: Vec<ScrapedItem>,
}

#[async_trait]
impl ScrapeAdapter for FixedAdapter {
    fn adapter_id(&self) -> &'static str {
        "fixed"
    }

    async fn scrape(&self, _target: &ScrapeTarget) -> Result<Vec<ScrapedItem>, AdapterError> {
        Ok(self.items.clone())
    }
}

/// Sleeps before answering so concurrent runs overlap.
struct SlowAdapter {
    items: Vec<ScrapedItem>,
}

#[async_trait]
impl ScrapeAdapter for SlowAdapter {
    fn adapter_id(&self) -> &'static str {
        "slow"
    }

    async fn scrape(&self, _target: &ScrapeTarget) -> Result<Vec<ScrapedItem>, AdapterError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(self.items.clone())
    }
}

/// Memory store whose product listing is unavailable.
struct UnlistableStore {
    inner: MemoryFactStore,
}

#[async_trait]
impl FactStore for UnlistableStore {
    fn backend(&self) -> &'static str {
        "unlistable"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Err(StoreError::InvalidRow("products table unavailable".into()))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.inner.get_product(id).await
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        self.inner.create_product(product).await
    }

    async fn update_insight(&self, id: ProductId, insight: &str) -> Result<Product, StoreError> {
        self.inner.update_insight(id, insight).await
    }

    async fn list_prices(&self, product_id: ProductId) -> Result<Vec<PriceObservation>, StoreError> {
        self.inner.list_prices(product_id).await
    }

    async fn list_all_prices(&self) -> Result<Vec<PriceObservation>, StoreError> {
        self.inner.list_all_prices().await
    }

    async fn add_price(&self, price: VerifiedPrice) -> Result<PriceObservation, StoreError> {
        self.inner.add_price(price).await
    }

    async fn list_sentiment(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<Vec<SentimentObservation>, StoreError> {
        self.inner.list_sentiment(product_id).await
    }

    async fn add_sentiment(
        &self,
        sentiment: VerifiedSentiment,
    ) -> Result<SentimentObservation, StoreError> {
        self.inner.add_sentiment(sentiment).await
    }

    async fn append_activity(&self, entry: NewActivity) -> Result<ActivityLogEntry, StoreError> {
        self.inner.append_activity(entry).await
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityLogEntry>, StoreError> {
        self.inner.list_activity(limit).await
    }
}

struct BrokenLive;

#[async_trait]
impl ScrapeAdapter for BrokenLive {
    fn adapter_id(&self) -> &'static str {
        "broken"
    }

    async fn scrape(&self, target: &ScrapeTarget) -> Result<Vec<ScrapedItem>, AdapterError> {
        Err(AdapterError::PriceNotFound {
            url: target.to_string(),
        })
    }
}

fn item(name: &str, price: Option<(f64, Option<&str>)>, score: Option<f64>) -> ScrapedItem {
    ScrapedItem {
        product: NewProduct::new(name)
            .with_category("Home")
            .with_competitor("HomeTech"),
        price: price.map(|(price, source)| ScrapedPrice {
            price,
            currency: None,
            source_url: source.map(ToString::to_string),
        }),
        sentiment: score.map(|score| ScrapedSentiment {
            score,
            text: Some("Customers like it".into()),
            raw_reviews: vec![],
            source_url: Some(format!("https://example.com/reviews/{}", name.to_lowercase())),
        }),
    }
}

fn catalog() -> ScrapeTarget {
    ScrapeTarget::Catalog("default".into())
}

#[tokio::test]
async fn grounded_facts_are_stored_and_ungrounded_ones_logged() {
    let store = Arc::new(MemoryFactStore::new());
    let demo = Arc::new(FixedAdapter {
        items: vec![
            item("Robot Vacuum Pro", Some((299.99, Some("https://example.com/products/rv"))), Some(0.85)),
            item("Smart Thermostat", Some((179.99, None)), Some(0.2)),
        ],
    });
    let pipeline = IngestionPipeline::new(store.clone(), demo, None);

    let summary = pipeline.run(&[catalog()]).await.unwrap();
    assert_eq!(summary.items_scraped, 2);
    assert_eq!(summary.products_created, 2);
    assert_eq!(summary.prices_added, 1);
    assert_eq!(summary.sentiments_added, 2);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.status(), ActivityStatus::Error);

    let thermostat = store.list_products().await.unwrap()[1].clone();
    assert!(store.list_prices(thermostat.id).await.unwrap().is_empty());

    let log = store.list_activity(100).await.unwrap();
    let last = &log[0];
    assert_eq!(last.action, "Scraping Complete");
    assert_eq!(last.status, ActivityStatus::Error);
    assert_eq!(last.details.as_deref(), Some("Created 2 products, 1 prices, 2 sentiments"));
    assert!(log.iter().any(|e| e.action == "Price Validation" && e.status == ActivityStatus::Error));
    assert!(log.iter().any(|e| e.action == "Price Verification"
        && e.details.as_deref()
            == Some("[OK] Verified price: $299.99 from https://example.com/products/rv")));
    assert_eq!(log.last().unwrap().action, "Initialization");
}

#[tokio::test]
async fn repeated_runs_match_existing_products() {
    let store = Arc::new(MemoryFactStore::new());
    let demo = Arc::new(FixedAdapter {
        items: vec![item("Robot Vacuum Pro", Some((299.99, Some("https://example.com/products/rv"))), None)],
    });
    let pipeline = IngestionPipeline::new(store.clone(), demo, None);

    pipeline.run(&[catalog()]).await.unwrap();
    let second = pipeline.run(&[catalog()]).await.unwrap();
    assert_eq!(second.products_created, 0);
    assert_eq!(second.products_matched, 1);
    assert_eq!(second.status(), ActivityStatus::Success);

    let products = store.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(store.list_prices(products[0].id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn touched_products_get_insights_from_their_findings() {
    let store = Arc::new(MemoryFactStore::new());
    let demo = Arc::new(FixedAdapter {
        items: vec![item("Robot Vacuum Pro", Some((299.99, Some("https://example.com/products/rv"))), Some(0.85))],
    });
    let pipeline = IngestionPipeline::new(store.clone(), demo, None);

    let summary = pipeline.run(&[catalog()]).await.unwrap();
    assert_eq!(summary.insights_refreshed, 1);
    let product = &store.list_products().await.unwrap()[0];
    assert!(product.insight.contains("Robot Vacuum Pro"), "{}", product.insight);
}

#[tokio::test]
async fn failed_live_targets_fall_back_to_demo_catalog() {
    let store = Arc::new(MemoryFactStore::new());
    let pipeline = IngestionPipeline::new(
        store.clone(),
        Arc::new(DemoCatalogAdapter::seeded(3)),
        Some(Arc::new(BrokenLive)),
    );

    let summary = pipeline
        .run(&[ScrapeTarget::Live("https://shop.example.com/p/1".into())])
        .await
        .unwrap();
    assert_eq!(summary.fallbacks, 1);
    assert!((3..=5).contains(&summary.items_scraped));
    assert_eq!(summary.prices_added, summary.items_scraped);

    let log = store.list_activity(200).await.unwrap();
    assert!(log.iter().any(|e| e.action == "Live Scrape Fallback"));
}

#[tokio::test]
async fn submitted_jobs_run_in_the_background() {
    let store: Arc<dyn FactStore> = Arc::new(MemoryFactStore::new());
    let pipeline = Arc::new(IngestionPipeline::new(
        store.clone(),
        Arc::new(DemoCatalogAdapter::seeded(11)),
        None,
    ));
    let jobs = IngestionJobs::new(pipeline, Arc::new(TargetRegistry::default()));

    let job = jobs.submit(&[]).unwrap();
    assert_eq!(job.ticket.targets, vec!["default"]);
    let summary = job.handle.await.unwrap().unwrap();
    assert!(summary.products_created >= 3);

    let log = store.list_activity(1).await.unwrap();
    assert_eq!(log[0].action, "Scraping Complete");
    assert!(jobs.submit(&["   ".to_string()]).is_err());
}

#[tokio::test]
async fn aborted_run_closes_the_activity_log_with_an_error() {
    let store = Arc::new(UnlistableStore {
        inner: MemoryFactStore::new(),
    });
    let demo = Arc::new(FixedAdapter {
        items: vec![item("Robot Vacuum Pro", Some((299.99, Some("https://example.com/products/rv"))), None)],
    });
    let pipeline = Arc::new(IngestionPipeline::new(store.clone(), demo, None));
    let jobs = IngestionJobs::new(pipeline, Arc::new(TargetRegistry::default()));

    let job = jobs.submit(&[]).unwrap();
    assert!(job.handle.await.unwrap().is_none());

    let log = store.list_activity(10).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].action, "Scraping Complete");
    assert_eq!(log[0].status, ActivityStatus::Error);
    assert!(
        log[0].details.as_deref().unwrap_or_default().contains("products table unavailable"),
        "{:?}",
        log[0].details
    );
    assert_eq!(log[1].action, "Initialization");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_jobs_do_not_duplicate_products() {
    let store: Arc<dyn FactStore> = Arc::new(MemoryFactStore::new());
    let demo = Arc::new(SlowAdapter {
        items: vec![item("Robot Vacuum Pro", Some((299.99, Some("https://example.com/products/rv"))), Some(0.8))],
    });
    let pipeline = Arc::new(IngestionPipeline::new(store.clone(), demo, None));
    let jobs = IngestionJobs::new(pipeline, Arc::new(TargetRegistry::default()));

    let first = jobs.submit(&[]).unwrap();
    let second = jobs.submit(&[]).unwrap();
    let a = first.handle.await.unwrap().unwrap();
    let b = second.handle.await.unwrap().unwrap();

    assert_eq!(a.products_created + b.products_created, 1);
    assert_eq!(a.products_matched + b.products_matched, 1);
    let products = store.list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(store.list_prices(products[0].id).await.unwrap().len(), 2);
}

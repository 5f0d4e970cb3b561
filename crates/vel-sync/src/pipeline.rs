//! Scrape -> match -> ground -> store, with every step written to the activity log.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info_span, Instrument};
use uuid::Uuid;
use vel_adapters::{
    DemoCatalogAdapter, LivePageAdapter, ScrapeAdapter, ScrapeTarget, ScrapedItem,
};
use vel_core::{ActivityStatus, GroundingValidator, NewActivity, Product, ProductId};
use vel_insights::{aggregate, classify, finding_text};
use vel_storage::{load_snapshot, FactStore, PageFetcher, PageFetcherConfig};

use crate::config::SyncConfig;
use crate::matcher::ProductMatcher;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub targets: Vec<String>,
    pub items_scraped: usize,
    pub products_created: usize,
    pub products_matched: usize,
    pub prices_added: usize,
    pub sentiments_added: usize,
    pub insights_refreshed: usize,
    pub fallbacks: usize,
    pub errors: Vec<String>,
}

impl IngestionSummary {
    fn start(run_id: Uuid, targets: &[ScrapeTarget]) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            targets: targets.iter().map(ToString::to_string).collect(),
            items_scraped: 0,
            products_created: 0,
            products_matched: 0,
            prices_added: 0,
            sentiments_added: 0,
            insights_refreshed: 0,
            fallbacks: 0,
            errors: Vec::new(),
        }
    }

    pub fn status(&self) -> ActivityStatus {
        if self.errors.is_empty() {
            ActivityStatus::Success
        } else {
            ActivityStatus::Error
        }
    }

    pub fn details(&self) -> String {
        format!(
            "Created {} products, {} prices, {} sentiments",
            self.products_created, self.prices_added, self.sentiments_added
        )
    }
}

pub struct IngestionPipeline {
    store: Arc<dyn FactStore>,
    demo: Arc<dyn ScrapeAdapter>,
    live: Option<Arc<dyn ScrapeAdapter>>,
    validator: GroundingValidator,
    matcher: ProductMatcher,
    /// Held for a whole run so overlapping runs never match against a stale product list.
    run_lock: Mutex<()>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn FactStore>,
        demo: Arc<dyn ScrapeAdapter>,
        live: Option<Arc<dyn ScrapeAdapter>>,
    ) -> Self {
        Self {
            store,
            demo,
            live,
            validator: GroundingValidator::default(),
            matcher: ProductMatcher::default(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_matcher(mut self, matcher: ProductMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Demo catalog plus a live page adapter built from the fetch settings.
    pub fn from_config(config: &SyncConfig, store: Arc<dyn FactStore>) -> Result<Self> {
        let fetcher = PageFetcher::new(PageFetcherConfig {
            timeout: Duration::from_secs(config.http_timeout_secs),
            user_agents: config.user_agents.clone(),
            ..Default::default()
        })
        .context("building page fetcher")?;
        let live: Arc<dyn ScrapeAdapter> = Arc::new(LivePageAdapter::new(Arc::new(fetcher)));
        Ok(Self::new(store, Arc::new(DemoCatalogAdapter::new()), Some(live))
            .with_matcher(ProductMatcher::new(config.match_threshold)))
    }

    pub fn store(&self) -> &Arc<dyn FactStore> {
        &self.store
    }

    /// Runs one at a time; a run that aborts still closes the activity log with an error entry.
    pub async fn run(&self, targets: &[ScrapeTarget]) -> Result<IngestionSummary> {
        let _guard = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        let span = info_span!("ingestion_run", %run_id, targets = targets.len());
        let result = self.run_inner(run_id, targets).instrument(span).await;
        if let Err(err) = &result {
            tracing::error!(%run_id, error = ?err, "ingestion run aborted");
            self.record(NewActivity::error(
                "Scraping Complete",
                format!("Ingestion aborted: {err:#}"),
            ))
            .await;
        }
        result
    }

    async fn run_inner(&self, run_id: Uuid, targets: &[ScrapeTarget]) -> Result<IngestionSummary> {
        let mut summary = IngestionSummary::start(run_id, targets);
        self.record(NewActivity::running(
            "Initialization",
            format!("Starting scraping job for targets: {}", summary.targets.join(", ")),
        ))
        .await;

        let mut known = self
            .store
            .list_products()
            .await
            .context("listing products before ingestion")?;
        let mut touched = BTreeSet::new();

        for target in targets {
            self.record(NewActivity::running("Scraping", format!("Scraping {target}")))
                .await;
            let items = self.scrape_target(target, &mut summary).await;
            summary.items_scraped += items.len();
            for item in items {
                self.ingest_item(item, &mut known, &mut touched, &mut summary)
                    .await;
            }
        }

        self.refresh_insights(&touched, &mut summary).await;

        summary.finished_at = Utc::now();
        self.record(NewActivity::new(
            "Scraping Complete",
            summary.status(),
            summary.details(),
        ))
        .await;
        tracing::info!(
            items = summary.items_scraped,
            created = summary.products_created,
            matched = summary.products_matched,
            prices = summary.prices_added,
            sentiments = summary.sentiments_added,
            errors = summary.errors.len(),
            "ingestion run finished"
        );
        Ok(summary)
    }

    /// Live targets fall back to the demo catalog when the page cannot be scraped.
    async fn scrape_target(&self, target: &ScrapeTarget, summary: &mut IngestionSummary) -> Vec<ScrapedItem> {
        if target.is_live() {
            let failure = match &self.live {
                Some(live) => match live.scrape(target).await {
                    Ok(items) => return items,
                    Err(err) => format!("Live scrape of {target} failed: {err}"),
                },
                None => format!("No live adapter configured for {target}"),
            };
            tracing::warn!(scrape_target = %target, reason = %failure, "falling back to demo catalog");
            summary.fallbacks += 1;
            summary.errors.push(failure.clone());
            self.record(NewActivity::error(
                "Live Scrape Fallback",
                format!("{failure}; using demo catalog"),
            ))
            .await;
        }

        match self.demo.scrape(target).await {
            Ok(items) => items,
            Err(err) => {
                let message = format!("Scraping {target} failed: {err}");
                tracing::warn!(scrape_target = %target, error = %err, "scrape failed");
                summary.errors.push(message.clone());
                self.record(NewActivity::error("Scraping", message)).await;
                Vec::new()
            }
        }
    }

    async fn ingest_item(
        &self,
        item: ScrapedItem,
        known: &mut Vec<Product>,
        touched: &mut BTreeSet<ProductId>,
        summary: &mut IngestionSummary,
    ) {
        let candidate = item.product.normalized();
        let name = candidate.name.clone();
        self.record(NewActivity::running(
            "Data Validation",
            format!("Processing product: {name}"),
        ))
        .await;

        let product_id = match self.matcher.find(&candidate, known) {
            Some(existing) => {
                summary.products_matched += 1;
                tracing::debug!(product = %name, id = existing.id, "matched existing product");
                existing.id
            }
            None => match self.store.create_product(candidate).await {
                Ok(created) => {
                    summary.products_created += 1;
                    let id = created.id;
                    known.push(created);
                    id
                }
                Err(err) => {
                    self.item_failed(&name, &err.to_string(), summary).await;
                    return;
                }
            },
        };
        touched.insert(product_id);

        if let Some(price) = item.price {
            match self.validator.verify_price(price.into_submission(product_id)) {
                Ok(verified) => match self.store.add_price(verified).await {
                    Ok(stored) => {
                        summary.prices_added += 1;
                        self.record(NewActivity::success(
                            "Price Verification",
                            format!("[OK] Verified price: ${:.2} from {}", stored.price, stored.source),
                        ))
                        .await;
                    }
                    Err(err) => self.item_failed(&name, &err.to_string(), summary).await,
                },
                Err(err) => {
                    summary.errors.push(format!("{name}: {err}"));
                    self.record(NewActivity::error("Price Validation", format!("{name}: {err}")))
                        .await;
                }
            }
        }

        if let Some(sentiment) = item.sentiment {
            match self
                .validator
                .verify_sentiment(sentiment.into_submission(product_id))
            {
                Ok(verified) => match self.store.add_sentiment(verified).await {
                    Ok(stored) => {
                        summary.sentiments_added += 1;
                        self.record(NewActivity::success(
                            "Sentiment Verification",
                            format!("[OK] Verified sentiment: {:.2} from {}", stored.score, stored.source),
                        ))
                        .await;
                    }
                    Err(err) => self.item_failed(&name, &err.to_string(), summary).await,
                },
                Err(err) => {
                    summary.errors.push(format!("{name}: {err}"));
                    self.record(NewActivity::error(
                        "Sentiment Validation",
                        format!("{name}: {err}"),
                    ))
                    .await;
                }
            }
        }
    }

    async fn item_failed(&self, name: &str, reason: &str, summary: &mut IngestionSummary) {
        let message = format!("Failed to process {name}: {reason}");
        tracing::warn!(product = %name, %reason, "item processing failed");
        summary.errors.push(message.clone());
        self.record(NewActivity::error("Item Processing", message)).await;
    }

    /// Rewrite the insight of every touched product from its own SWOT findings.
    async fn refresh_insights(&self, touched: &BTreeSet<ProductId>, summary: &mut IngestionSummary) {
        if touched.is_empty() {
            return;
        }
        let snapshot = match load_snapshot(self.store.as_ref()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "skipping insight refresh");
                summary.errors.push(format!("Insight refresh failed: {err}"));
                return;
            }
        };
        let report = classify(&aggregate(&snapshot));
        for id in touched {
            let lines: Vec<String> = report.for_product(*id).map(finding_text).collect();
            if lines.is_empty() {
                continue;
            }
            match self.store.update_insight(*id, &lines.join("; ")).await {
                Ok(_) => summary.insights_refreshed += 1,
                Err(err) => {
                    tracing::warn!(product_id = id, error = %err, "insight refresh failed");
                    summary.errors.push(format!("Insight refresh for product {id} failed: {err}"));
                }
            }
        }
    }

    /// Activity log writes never abort a run.
    async fn record(&self, entry: NewActivity) {
        if let Err(err) = self.store.append_activity(entry).await {
            tracing::warn!(error = %err, "failed to append activity entry");
        }
    }
}

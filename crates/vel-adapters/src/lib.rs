//! Scrape adapter contracts plus the demo catalog and live product-page adapters.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vel_core::{NewProduct, PriceSubmission, ProductId, SentimentSubmission};
use vel_storage::FetchError;

pub mod catalog;
pub mod live;

pub use catalog::{CatalogEntry, DemoCatalogAdapter, DEMO_CATALOG};
pub use live::{estimate_sentiment, extract_product_page, review_sentiment, LivePageAdapter};

pub const CRATE_NAME: &str = "vel-adapters";

/// What one scrape is aimed at: a named demo catalog or a live product page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScrapeTarget {
    Catalog(String),
    Live(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scrape target is blank")]
pub struct BlankTarget;

impl ScrapeTarget {
    pub fn parse(raw: &str) -> Result<Self, BlankTarget> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(BlankTarget);
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Ok(Self::Live(raw.to_string()))
        } else {
            Ok(Self::Catalog(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Catalog(name) => name,
            Self::Live(url) => url,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl TryFrom<String> for ScrapeTarget {
    type Error = BlankTarget;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScrapeTarget> for String {
    fn from(value: ScrapeTarget) -> Self {
        match value {
            ScrapeTarget::Catalog(s) | ScrapeTarget::Live(s) => s,
        }
    }
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price as read from a page, before grounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPrice {
    pub price: f64,
    pub currency: Option<String>,
    pub source_url: Option<String>,
}

impl ScrapedPrice {
    pub fn into_submission(self, product_id: ProductId) -> PriceSubmission {
        PriceSubmission {
            product_id,
            price: self.price,
            currency: self.currency,
            source_url: self.source_url,
            observed_at: None,
        }
    }
}

/// Sentiment as estimated from a page, before grounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedSentiment {
    pub score: f64,
    pub text: Option<String>,
    pub raw_reviews: Vec<String>,
    pub source_url: Option<String>,
}

impl ScrapedSentiment {
    pub fn into_submission(self, product_id: ProductId) -> SentimentSubmission {
        SentimentSubmission {
            product_id,
            sentiment_score: self.score,
            sentiment_text: self.text,
            raw_reviews: Some(self.raw_reviews),
            source_url: self.source_url,
            observed_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub product: NewProduct,
    pub price: Option<ScrapedPrice>,
    pub sentiment: Option<ScrapedSentiment>,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid page url `{0}`")]
    InvalidUrl(String),
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
    #[error("could not extract a price from {url}")]
    PriceNotFound { url: String },
}

#[async_trait]
pub trait ScrapeAdapter: Send + Sync {
    fn adapter_id(&self) -> &'static str;

    async fn scrape(&self, target: &ScrapeTarget) -> Result<Vec<ScrapedItem>, AdapterError>;
}

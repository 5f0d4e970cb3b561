//! Verified grounding: the only way to turn a submitted price or sentiment into
//! something a fact store will accept.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ProductId, SourceRef};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactKind {
    Price,
    Sentiment,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Price => f.write_str("price"),
            Self::Sentiment => f.write_str("sentiment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroundingError {
    #[error("{fact} rejected: a source reference is required for verified grounding")]
    MissingSource { fact: FactKind },
    #[error("price rejected: {0} is not a positive amount")]
    InvalidPrice(f64),
    #[error("sentiment rejected: score {0} is outside [-1.0, 1.0]")]
    SentimentOutOfRange(f64),
}

/// Unchecked price as it arrives from a scraper or the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSubmission {
    pub product_id: ProductId,
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Unchecked sentiment as it arrives from a scraper or the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSubmission {
    pub product_id: ProductId,
    #[serde(alias = "score")]
    pub sentiment_score: f64,
    #[serde(default)]
    pub sentiment_text: Option<String>,
    #[serde(default)]
    pub raw_reviews: Option<Vec<String>>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedPrice {
    product_id: ProductId,
    price: f64,
    currency: String,
    source: SourceRef,
    observed_at: DateTime<Utc>,
}

impl VerifiedPrice {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSentiment {
    product_id: ProductId,
    score: f64,
    text: Option<String>,
    raw_reviews: Vec<String>,
    source: SourceRef,
    observed_at: DateTime<Utc>,
}

impl VerifiedSentiment {
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn raw_reviews(&self) -> &[String] {
        &self.raw_reviews
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

#[derive(Debug, Clone)]
pub struct GroundingValidator {
    default_currency: String,
}

impl Default for GroundingValidator {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl GroundingValidator {
    pub fn new(default_currency: impl Into<String>) -> Self {
        Self {
            default_currency: default_currency.into().trim().to_ascii_uppercase(),
        }
    }

    pub fn verify_price(&self, submission: PriceSubmission) -> Result<VerifiedPrice, GroundingError> {
        let source = require_source(submission.source_url.as_deref(), FactKind::Price)?;
        if !submission.price.is_finite() || submission.price <= 0.0 {
            return Err(GroundingError::InvalidPrice(submission.price));
        }
        let currency = submission
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_currency.clone());

        Ok(VerifiedPrice {
            product_id: submission.product_id,
            price: submission.price,
            currency,
            source,
            observed_at: submission.observed_at.unwrap_or_else(Utc::now),
        })
    }

    pub fn verify_sentiment(
        &self,
        submission: SentimentSubmission,
    ) -> Result<VerifiedSentiment, GroundingError> {
        let source = require_source(submission.source_url.as_deref(), FactKind::Sentiment)?;
        let score = submission.sentiment_score;
        // NaN fails the range check too.
        if !(-1.0..=1.0).contains(&score) {
            return Err(GroundingError::SentimentOutOfRange(score));
        }

        Ok(VerifiedSentiment {
            product_id: submission.product_id,
            score,
            text: submission
                .sentiment_text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            raw_reviews: submission.raw_reviews.unwrap_or_default(),
            source,
            observed_at: submission.observed_at.unwrap_or_else(Utc::now),
        })
    }
}

fn require_source(raw: Option<&str>, fact: FactKind) -> Result<SourceRef, GroundingError> {
    raw.and_then(|s| SourceRef::parse(s).ok())
        .ok_or(GroundingError::MissingSource { fact })
}

//! Core fact model and provenance types for Velocity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod grounding;

pub use grounding::{
    FactKind, GroundingError, GroundingValidator, PriceSubmission, SentimentSubmission,
    VerifiedPrice, VerifiedSentiment,
};

pub const CRATE_NAME: &str = "vel-core";

pub type ProductId = i64;

/// Traceable origin of a fact: the page URL (or equivalent identifier) it was read from.
///
/// Never empty. Deserialization goes through [`SourceRef::parse`] as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceRef(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("source reference is blank")]
pub struct BlankSourceRef;

impl SourceRef {
    pub fn parse(raw: &str) -> Result<Self, BlankSourceRef> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BlankSourceRef);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SourceRef {
    type Error = BlankSourceRef;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceRef> for String {
    fn from(value: SourceRef) -> Self {
        value.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub competitor: Option<String>,
    pub insight: String,
    pub created_at: DateTime<Utc>,
}

/// Product creation request. Blank category/competitor labels are treated as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub competitor: Option<String>,
    #[serde(default)]
    pub insight: String,
}

impl NewProduct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            competitor: None,
            insight: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_competitor(mut self, competitor: impl Into<String>) -> Self {
        self.competitor = Some(competitor.into());
        self
    }

    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.insight = insight.into();
        self
    }

    pub fn normalized(self) -> Self {
        let name = self.name.trim();
        Self {
            name: if name.is_empty() {
                "Unknown Product".to_string()
            } else {
                name.to_string()
            },
            category: non_blank(self.category),
            competitor: non_blank(self.competitor),
            insight: self.insight.trim().to_string(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: i64,
    pub product_id: ProductId,
    pub price: f64,
    pub currency: String,
    #[serde(rename = "source_url")]
    pub source: SourceRef,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentObservation {
    pub id: i64,
    pub product_id: ProductId,
    pub score: f64,
    pub text: Option<String>,
    #[serde(default)]
    pub raw_reviews: Vec<String>,
    #[serde(rename = "source_url")]
    pub source: SourceRef,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Running,
    Success,
    Error,
}

impl ActivityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity status `{0}`")]
pub struct UnknownActivityStatus(pub String);

impl FromStr for ActivityStatus {
    type Err = UnknownActivityStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(UnknownActivityStatus(other.to_string())),
        }
    }
}

/// Audit trail record. Written by ingestion, never read by the insight engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub action: String,
    pub status: ActivityStatus,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub action: String,
    pub status: ActivityStatus,
    #[serde(default)]
    pub details: Option<String>,
}

impl NewActivity {
    pub fn new(action: impl Into<String>, status: ActivityStatus, details: impl Into<String>) -> Self {
        let details = details.into();
        Self {
            action: action.into(),
            status,
            details: if details.is_empty() { None } else { Some(details) },
        }
    }

    pub fn running(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(action, ActivityStatus::Running, details)
    }

    pub fn success(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(action, ActivityStatus::Success, details)
    }

    pub fn error(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(action, ActivityStatus::Error, details)
    }
}

/// One product with every fact attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFacts {
    pub product: Product,
    pub prices: Vec<PriceObservation>,
    pub sentiments: Vec<SentimentObservation>,
}

impl ProductFacts {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            prices: Vec::new(),
            sentiments: Vec::new(),
        }
    }
}

/// Read-once view of the fact store that the insight engine runs over.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FactSnapshot {
    pub taken_at: Option<DateTime<Utc>>,
    pub products: Vec<ProductFacts>,
}

impl FactSnapshot {
    pub fn new(products: Vec<ProductFacts>) -> Self {
        Self {
            taken_at: Some(Utc::now()),
            products,
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn sentiment_count(&self) -> usize {
        self.products.iter().map(|p| p.sentiments.len()).sum()
    }
}

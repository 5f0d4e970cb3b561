//! Insight engine: aggregation, SWOT classification and strategic selection over
//! grounded facts. Everything here is synchronous and pure over a [`FactSnapshot`].

use serde::Serialize;
use vel_core::FactSnapshot;

pub mod aggregate;
pub mod render;
pub mod strategic;
pub mod swot;
pub mod view;

#[cfg(test)]
mod testing;

pub use aggregate::{aggregate, sentiment_summary, Aggregation, ProductKpis, SentimentSummary};
pub use render::{finding_text, strategic_headline, swot_text, SwotText};
pub use strategic::{select_strategic, Baseline, PriceGap, StrategicOverview, TopStrength};
pub use swot::{classify, Finding, ProductRef, Quadrant, Rule, Subject, SwotReport};
pub use view::{select_products, ProductPage, ProductQuery, SortKey, SortOrder};

pub const CRATE_NAME: &str = "vel-insights";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub sentiment: SentimentSummary,
    pub aggregation: Aggregation,
    pub swot: SwotReport,
    pub strategic: StrategicOverview,
}

impl InsightReport {
    pub fn headline(&self) -> String {
        strategic_headline(&self.strategic)
    }
}

pub fn analyze(snapshot: &FactSnapshot) -> InsightReport {
    let aggregation = aggregate(snapshot);
    let swot = classify(&aggregation);
    let strategic = select_strategic(&aggregation);
    tracing::debug!(
        products = aggregation.product_count(),
        strengths = swot.strengths.len(),
        weaknesses = swot.weaknesses.len(),
        opportunities = swot.opportunities.len(),
        threats = swot.threats.len(),
        "insight analysis complete"
    );
    InsightReport {
        sentiment: sentiment_summary(snapshot),
        aggregation,
        swot,
        strategic,
    }
}

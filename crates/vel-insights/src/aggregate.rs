//! Per-product KPIs and category/competitor price means over a fact snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use vel_core::{FactSnapshot, PriceObservation, Product, ProductFacts, ProductId, SourceRef};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductKpis {
    pub product: Product,
    pub latest_price: Option<f64>,
    pub latest_currency: Option<String>,
    pub latest_observed_at: Option<DateTime<Utc>>,
    pub latest_price_source: Option<SourceRef>,
    pub mean_price: Option<f64>,
    pub price_count: usize,
    pub mean_sentiment: Option<f64>,
    pub sentiment_count: usize,
    pub sentiment_sources: Vec<SourceRef>,
    pub category_mean_price: Option<f64>,
    pub competitor_mean_price: Option<f64>,
}

impl ProductKpis {
    pub fn id(&self) -> ProductId {
        self.product.id
    }
}

/// Latest prices of a group's members, kept per product so peer means are summed directly.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PriceGroup {
    members: Vec<(ProductId, f64)>,
}

impl PriceGroup {
    fn add(&mut self, id: ProductId, price: f64) {
        self.members.push((id, price));
    }

    fn mean(&self) -> Option<f64> {
        mean(self.members.iter().map(|(_, p)| *p))
    }

    fn mean_without(&self, id: ProductId) -> Option<f64> {
        mean(
            self.members
                .iter()
                .filter(|(member, _)| *member != id)
                .map(|(_, p)| *p),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregation {
    pub products: Vec<ProductKpis>,
    pub overall_mean_price: Option<f64>,
    pub category_counts: BTreeMap<String, usize>,
    pub category_means: BTreeMap<String, f64>,
    pub competitor_means: BTreeMap<String, f64>,
    #[serde(skip)]
    pub(crate) competitor_groups: BTreeMap<String, PriceGroup>,
}

impl Aggregation {
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn get(&self, id: ProductId) -> Option<&ProductKpis> {
        self.products.iter().find(|k| k.product.id == id)
    }

    /// Mean latest price of the other products sharing this product's competitor.
    pub fn competitor_peer_mean(&self, kpis: &ProductKpis) -> Option<f64> {
        let competitor = kpis.product.competitor.as_ref()?;
        self.competitor_groups
            .get(competitor)?
            .mean_without(kpis.id())
    }

    pub fn category_size(&self, category: &str) -> usize {
        self.category_counts.get(category).copied().unwrap_or(0)
    }
}

/// Latest = max `observed_at`; equal timestamps resolve to the later insert (higher id).
pub fn latest_price(prices: &[PriceObservation]) -> Option<&PriceObservation> {
    prices
        .iter()
        .max_by(|a, b| a.observed_at.cmp(&b.observed_at).then(a.id.cmp(&b.id)))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn base_kpis(facts: &ProductFacts) -> ProductKpis {
    let latest = latest_price(&facts.prices);
    let mut sentiment_sources: Vec<SourceRef> = Vec::new();
    for s in &facts.sentiments {
        if !sentiment_sources.contains(&s.source) {
            sentiment_sources.push(s.source.clone());
        }
    }

    ProductKpis {
        product: facts.product.clone(),
        latest_price: latest.map(|p| p.price),
        latest_currency: latest.map(|p| p.currency.clone()),
        latest_observed_at: latest.map(|p| p.observed_at),
        latest_price_source: latest.map(|p| p.source.clone()),
        mean_price: mean(facts.prices.iter().map(|p| p.price)),
        price_count: facts.prices.len(),
        mean_sentiment: mean(facts.sentiments.iter().map(|s| s.score)),
        sentiment_count: facts.sentiments.len(),
        sentiment_sources,
        category_mean_price: None,
        competitor_mean_price: None,
    }
}

/// Single pass for per-product values, single pass for group sums, then a fill-in pass.
pub fn aggregate(snapshot: &FactSnapshot) -> Aggregation {
    let mut products: Vec<ProductKpis> = snapshot.products.iter().map(base_kpis).collect();

    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut category_groups: BTreeMap<String, PriceGroup> = BTreeMap::new();
    let mut competitor_groups: BTreeMap<String, PriceGroup> = BTreeMap::new();
    let mut overall = PriceGroup::default();

    for kpis in &products {
        if let Some(category) = &kpis.product.category {
            *category_counts.entry(category.clone()).or_default() += 1;
        }
        let Some(price) = kpis.latest_price else {
            continue;
        };
        overall.add(kpis.id(), price);
        if let Some(category) = &kpis.product.category {
            category_groups
                .entry(category.clone())
                .or_default()
                .add(kpis.id(), price);
        }
        if let Some(competitor) = &kpis.product.competitor {
            competitor_groups
                .entry(competitor.clone())
                .or_default()
                .add(kpis.id(), price);
        }
    }

    let category_means: BTreeMap<String, f64> = category_groups
        .iter()
        .filter_map(|(k, g)| g.mean().map(|m| (k.clone(), m)))
        .collect();
    let competitor_means: BTreeMap<String, f64> = competitor_groups
        .iter()
        .filter_map(|(k, g)| g.mean().map(|m| (k.clone(), m)))
        .collect();

    for kpis in &mut products {
        kpis.category_mean_price = kpis
            .product
            .category
            .as_ref()
            .and_then(|c| category_means.get(c).copied());
        kpis.competitor_mean_price = kpis
            .product
            .competitor
            .as_ref()
            .and_then(|c| competitor_means.get(c).copied());
    }

    Aggregation {
        products,
        overall_mean_price: overall.mean(),
        category_counts,
        category_means,
        competitor_means,
        competitor_groups,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSentiment {
    pub product_id: ProductId,
    pub product_name: String,
    pub average_sentiment: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SentimentSummary {
    pub overall_average_sentiment: Option<f64>,
    pub total_count: usize,
    pub by_product: Vec<ProductSentiment>,
}

/// Mean over every sentiment observation, plus one row per product that has any.
pub fn sentiment_summary(snapshot: &FactSnapshot) -> SentimentSummary {
    let overall = mean(
        snapshot
            .products
            .iter()
            .flat_map(|p| p.sentiments.iter().map(|s| s.score)),
    );
    let by_product = snapshot
        .products
        .iter()
        .filter_map(|facts| {
            mean(facts.sentiments.iter().map(|s| s.score)).map(|avg| ProductSentiment {
                product_id: facts.product.id,
                product_name: facts.product.name.clone(),
                average_sentiment: avg,
                count: facts.sentiments.len(),
            })
        })
        .collect();

    SentimentSummary {
        overall_average_sentiment: overall,
        total_count: snapshot.sentiment_count(),
        by_product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn latest_price_uses_timestamp_then_insertion_order() {
        let facts = product(1, "Robot Vacuum Pro")
            .price_at(10, 299.99, 5)
            .price_at(11, 249.99, 9)
            .price_at(12, 279.99, 9)
            .price_at(13, 199.99, 2)
            .build();
        let latest = latest_price(&facts.prices).unwrap();
        assert_eq!(latest.id, 12);
        assert_eq!(latest.price, 279.99);
    }

    #[test]
    fn mean_sentiment_is_absent_without_observations() {
        let snap = snapshot(vec![product(1, "Blender Ultra").price(69.99).build()]);
        let agg = aggregate(&snap);
        assert_eq!(agg.products[0].mean_sentiment, None);
        assert_eq!(agg.products[0].sentiment_count, 0);
    }

    #[test]
    fn mean_sentiment_is_plain_average() {
        let snap = snapshot(vec![product(1, "Smart Thermostat")
            .sentiment(0.5)
            .sentiment(1.0)
            .sentiment(-0.25)
            .build()]);
        let agg = aggregate(&snap);
        assert_eq!(agg.products[0].mean_sentiment, Some(1.25 / 3.0));
    }

    #[test]
    fn group_means_skip_unpriced_and_ungrouped_products() {
        let snap = snapshot(vec![
            product(1, "A").category("Wearables").competitor("FitTech").price(100.0).build(),
            product(2, "B").category("Wearables").competitor("FitTech").price(50.0).build(),
            product(3, "C").category("Wearables").competitor("FitTech").sentiment(0.4).build(),
            product(4, "D").price(300.0).build(),
        ]);
        let agg = aggregate(&snap);

        assert_eq!(agg.category_means.get("Wearables"), Some(&75.0));
        assert_eq!(agg.competitor_means.get("FitTech"), Some(&75.0));
        assert_eq!(agg.category_size("Wearables"), 3);
        assert_eq!(agg.overall_mean_price, Some(150.0));

        let unpriced = agg.get(3).unwrap();
        assert_eq!(unpriced.latest_price, None);
        assert_eq!(unpriced.category_mean_price, Some(75.0));
        assert_eq!(agg.get(4).unwrap().category_mean_price, None);
    }

    #[test]
    fn competitor_peer_mean_excludes_the_product_itself() {
        let snap = snapshot(vec![
            product(1, "A").competitor("SoundWave").price(40.0).build(),
            product(2, "B").competitor("SoundWave").price(100.0).build(),
            product(3, "C").competitor("SoundWave").sentiment(0.1).build(),
            product(4, "D").competitor("Solo").price(10.0).build(),
        ]);
        let agg = aggregate(&snap);
        assert_eq!(agg.competitor_peer_mean(agg.get(1).unwrap()), Some(100.0));
        assert_eq!(agg.competitor_peer_mean(agg.get(3).unwrap()), Some(70.0));
        assert_eq!(agg.competitor_peer_mean(agg.get(4).unwrap()), None);
    }

    #[test]
    fn competitor_peer_mean_sums_the_peers_directly() {
        let snap = snapshot(vec![
            product(1, "A").category("C").competitor("X").price(434.28).build(),
            product(2, "B").competitor("X").price(100.46).build(),
            product(3, "D").competitor("X").price(104.83).build(),
            product(4, "E").category("C").price(1097.55).build(),
        ]);
        let agg = aggregate(&snap);
        assert_eq!(
            agg.competitor_peer_mean(agg.get(1).unwrap()),
            Some((100.46 + 104.83) / 2.0)
        );
    }

    #[test]
    fn sentiment_summary_averages_all_observations() {
        let snap = snapshot(vec![
            product(1, "A").sentiment(1.0).sentiment(0.0).sentiment(0.5).build(),
            product(2, "B").sentiment(-0.5).build(),
            product(3, "C").price(10.0).build(),
        ]);
        let summary = sentiment_summary(&snap);
        assert_eq!(summary.overall_average_sentiment, Some(0.25));
        assert_eq!(summary.total_count, 4);
        assert_eq!(summary.by_product.len(), 2);
        assert_eq!(summary.by_product[0].average_sentiment, 0.5);
        assert_eq!(summary.by_product[0].count, 3);
        assert_eq!(summary.by_product[1].product_id, 2);
    }

    #[test]
    fn empty_snapshot_aggregates_to_nothing() {
        let agg = aggregate(&FactSnapshot::default());
        assert!(agg.products.is_empty());
        assert_eq!(agg.overall_mean_price, None);
        assert_eq!(sentiment_summary(&FactSnapshot::default()).overall_average_sentiment, None);
    }
}

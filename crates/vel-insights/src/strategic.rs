//! Strategic overview: the single strongest product and the largest pricing gap.

use serde::Serialize;
use vel_core::SourceRef;

use crate::aggregate::{Aggregation, ProductKpis};
use crate::swot::ProductRef;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopStrength {
    pub product: ProductRef,
    pub mean_sentiment: f64,
    pub evidence: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Baseline {
    Competitor { name: String },
    Category { name: String },
}

/// Distance between a product's latest price and the mean of its peers.
///
/// `gap` is signed: negative means the product undercuts the baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceGap {
    pub product: ProductRef,
    pub baseline: Baseline,
    pub price: f64,
    pub baseline_mean: f64,
    pub gap: f64,
    pub gap_percent: i64,
    pub evidence: Vec<SourceRef>,
}

impl PriceGap {
    fn new(kpis: &ProductKpis, baseline: Baseline, price: f64, baseline_mean: f64) -> Option<Self> {
        let gap = price - baseline_mean;
        if gap == 0.0 || baseline_mean <= 0.0 {
            return None;
        }
        Some(Self {
            product: ProductRef::from(kpis),
            baseline,
            price,
            baseline_mean,
            gap,
            gap_percent: gap_percent(price, baseline_mean),
            evidence: kpis.latest_price_source.iter().cloned().collect(),
        })
    }

    pub fn is_below_baseline(&self) -> bool {
        self.gap < 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StrategicOverview {
    pub top_strength: Option<TopStrength>,
    pub top_opportunity: Option<PriceGap>,
}

/// `(price - baseline) / baseline * 100`, rounded half away from zero.
pub fn gap_percent(price: f64, baseline: f64) -> i64 {
    ((price - baseline) / baseline * 100.0).round() as i64
}

fn top_strength(agg: &Aggregation) -> Option<TopStrength> {
    let mut best: Option<(&ProductKpis, f64)> = None;
    for kpis in &agg.products {
        let Some(s) = kpis.mean_sentiment else {
            continue;
        };
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((kpis, s));
        }
    }
    best.map(|(kpis, s)| TopStrength {
        product: ProductRef::from(kpis),
        mean_sentiment: s,
        evidence: kpis.sentiment_sources.clone(),
    })
}

fn top_opportunity(agg: &Aggregation) -> Option<PriceGap> {
    let mut best: Option<PriceGap> = None;
    let mut consider = |candidate: Option<PriceGap>| {
        let Some(candidate) = candidate else {
            return;
        };
        if best
            .as_ref()
            .map_or(true, |b| candidate.gap.abs() > b.gap.abs())
        {
            best = Some(candidate);
        }
    };

    for kpis in &agg.products {
        let Some(price) = kpis.latest_price else {
            continue;
        };
        if let (Some(name), Some(peer_mean)) =
            (&kpis.product.competitor, agg.competitor_peer_mean(kpis))
        {
            consider(PriceGap::new(
                kpis,
                Baseline::Competitor { name: name.clone() },
                price,
                peer_mean,
            ));
        }
        if let (Some(name), Some(category_mean)) = (&kpis.product.category, kpis.category_mean_price)
        {
            consider(PriceGap::new(
                kpis,
                Baseline::Category { name: name.clone() },
                price,
                category_mean,
            ));
        }
    }
    best
}

pub fn select_strategic(agg: &Aggregation) -> StrategicOverview {
    StrategicOverview {
        top_strength: top_strength(agg),
        top_opportunity: top_opportunity(agg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::testing::*;
    use vel_core::ProductFacts;

    fn run(products: Vec<ProductFacts>) -> StrategicOverview {
        select_strategic(&aggregate(&snapshot(products)))
    }

    #[test]
    fn empty_input_selects_nothing() {
        assert_eq!(run(vec![]), StrategicOverview::default());
    }

    #[test]
    fn top_strength_tie_goes_to_first_in_input_order() {
        let overview = run(vec![
            product(1, "A").sentiment(0.4).build(),
            product(2, "B").sentiment(0.9).build(),
            product(3, "C").sentiment(0.9).build(),
        ]);
        let top = overview.top_strength.unwrap();
        assert_eq!(top.product.id, 2);
        assert_eq!(top.mean_sentiment, 0.9);
    }

    #[test]
    fn top_strength_skips_products_without_sentiment() {
        let overview = run(vec![
            product(1, "Unrated").price(10.0).build(),
            product(2, "Disliked").sentiment(-0.8).build(),
        ]);
        assert_eq!(overview.top_strength.unwrap().product.id, 2);
    }

    #[test]
    fn category_gap_wins_when_larger() {
        // Category mean 100: P1 gap -20, P2 gap +20; competitor peer gap for P1 is -10.
        let overview = run(vec![
            product(1, "A").category("Kitchen").competitor("ChefPro").price(80.0).build(),
            product(2, "B").category("Kitchen").price(120.0).build(),
            product(3, "C").competitor("ChefPro").price(90.0).build(),
        ]);
        let gap = overview.top_opportunity.unwrap();
        assert_eq!(gap.product.id, 1);
        assert_eq!(gap.baseline, Baseline::Category { name: "Kitchen".into() });
        assert_eq!(gap.gap, -20.0);
        assert_eq!(gap.gap_percent, -20);
        assert!(gap.is_below_baseline());
    }

    #[test]
    fn competitor_gap_is_considered_before_category_gap_on_ties() {
        // Competitor peer mean 60 and category mean 60 give the same |gap| of 20.
        let overview = run(vec![
            product(1, "A").category("Home").competitor("HomeTech").price(40.0).build(),
            product(2, "B").competitor("HomeTech").price(60.0).build(),
            product(3, "C").category("Home").price(80.0).build(),
        ]);
        let gap = overview.top_opportunity.unwrap();
        assert_eq!(gap.product.id, 1);
        assert_eq!(gap.baseline, Baseline::Competitor { name: "HomeTech".into() });
    }

    #[test]
    fn competitor_tie_holds_with_inexact_peer_prices() {
        // Peer mean 102.645 and category mean 765.915 are both 331.635 away from 434.28.
        let overview = run(vec![
            product(1, "A").category("C").competitor("X").price(434.28).build(),
            product(2, "B").competitor("X").price(100.46).build(),
            product(3, "D").competitor("X").price(104.83).build(),
            product(4, "E").category("C").price(1097.55).build(),
        ]);
        let gap = overview.top_opportunity.unwrap();
        assert_eq!(gap.product.id, 1);
        assert_eq!(gap.baseline, Baseline::Competitor { name: "X".into() });
    }

    #[test]
    fn zero_gaps_are_not_opportunities() {
        let overview = run(vec![
            product(1, "A").category("Fitness").price(50.0).build(),
            product(2, "B").category("Fitness").price(50.0).build(),
        ]);
        assert_eq!(overview.top_opportunity, None);
    }

    #[test]
    fn single_product_has_no_competitor_baseline() {
        let overview = run(vec![product(1, "Solo").competitor("Lonely").price(10.0).build()]);
        assert_eq!(overview.top_opportunity, None);
    }

    #[test]
    fn gap_percent_rounds_half_away_from_zero() {
        assert_eq!(gap_percent(100.5, 100.0), 1);
        assert_eq!(gap_percent(99.5, 100.0), -1);
        assert_eq!(gap_percent(120.0, 90.0), 33);
        assert_eq!(gap_percent(45.0, 90.0), -50);
    }
}

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use vel_core::{FactSnapshot, PriceObservation, Product, ProductFacts, SentimentObservation, SourceRef};
use vel_insights::{analyze, classify, aggregate, swot_text, Quadrant};

const CATEGORIES: [&str; 3] = ["Electronics", "Kitchen", "Fitness"];
const COMPETITORS: [&str; 3] = ["TechGear", "ChefPro", "FitLife"];

#[derive(Debug, Clone)]
struct Spec {
    category: Option<usize>,
    competitor: Option<usize>,
    prices: Vec<f64>,
    sentiments: Vec<f64>,
}

fn spec_strategy() -> impl Strategy<Value = Spec> {
    (
        proptest::option::of(0..CATEGORIES.len()),
        proptest::option::of(0..COMPETITORS.len()),
        proptest::collection::vec(1.0f64..500.0, 0..4),
        proptest::collection::vec(-1.0f64..=1.0, 0..4),
    )
        .prop_map(|(category, competitor, prices, sentiments)| Spec {
            category,
            competitor,
            prices,
            sentiments,
        })
}

fn build(specs: &[Spec]) -> FactSnapshot {
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap();
    let mut next = 0i64;
    let products = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let id = i as i64 + 1;
            let source = SourceRef::parse(&format!("https://example.com/products/{id}")).unwrap();
            let mut facts = ProductFacts::new(Product {
                id,
                name: format!("Product {id}"),
                category: spec.category.map(|c| CATEGORIES[c].to_string()),
                competitor: spec.competitor.map(|c| COMPETITORS[c].to_string()),
                insight: String::new(),
                created_at: t0,
            });
            for price in &spec.prices {
                next += 1;
                facts.prices.push(PriceObservation {
                    id: next,
                    product_id: id,
                    price: *price,
                    currency: "USD".into(),
                    source: source.clone(),
                    observed_at: t0 + Duration::minutes(next),
                });
            }
            for score in &spec.sentiments {
                next += 1;
                facts.sentiments.push(SentimentObservation {
                    id: next,
                    product_id: id,
                    score: *score,
                    text: None,
                    raw_reviews: Vec::new(),
                    source: source.clone(),
                    observed_at: t0 + Duration::minutes(next),
                });
            }
            facts
        })
        .collect();
    FactSnapshot {
        taken_at: Some(t0),
        products,
    }
}

proptest! {
    #[test]
    fn every_quadrant_is_non_empty(specs in proptest::collection::vec(spec_strategy(), 0..12)) {
        let report = classify(&aggregate(&build(&specs)));
        for quadrant in Quadrant::ALL {
            prop_assert!(!report.quadrant(quadrant).is_empty());
        }
    }

    #[test]
    fn analysis_is_idempotent(specs in proptest::collection::vec(spec_strategy(), 0..8)) {
        let snapshot = build(&specs);
        prop_assert_eq!(analyze(&snapshot), analyze(&snapshot));
    }

    #[test]
    fn every_product_finding_cites_a_source(specs in proptest::collection::vec(spec_strategy(), 1..8)) {
        let report = classify(&aggregate(&build(&specs)));
        for finding in report.findings() {
            if finding.product_id().is_some() {
                prop_assert!(!finding.evidence.is_empty(), "{:?}", finding.rule);
            }
        }
    }

    #[test]
    fn unrated_products_get_no_sentiment_findings(specs in proptest::collection::vec(spec_strategy(), 1..8)) {
        let snapshot = build(&specs);
        let report = classify(&aggregate(&snapshot));
        for (i, spec) in specs.iter().enumerate() {
            if spec.sentiments.is_empty() {
                let id = i as i64 + 1;
                for finding in report.for_product(id) {
                    prop_assert!(matches!(
                        finding.rule.id(),
                        "category_price_edge" | "category_overpriced" | "competitor_price_edge"
                    ));
                }
            }
        }
    }
}

#[test]
fn one_product_reports_narrow_portfolio_verbatim() {
    let snapshot = build(&[Spec {
        category: None,
        competitor: None,
        prices: vec![25.0],
        sentiments: vec![],
    }]);
    let text = swot_text(&classify(&aggregate(&snapshot)));
    assert!(text.opportunities.iter().any(|t| t.contains("(1 products)")));
}

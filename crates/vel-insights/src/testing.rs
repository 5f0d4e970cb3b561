//! Snapshot builders for unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use vel_core::{
    FactSnapshot, PriceObservation, Product, ProductFacts, ProductId, SentimentObservation,
    SourceRef,
};

pub(crate) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().unwrap()
}

pub(crate) struct FactsBuilder {
    facts: ProductFacts,
    next_id: i64,
}

pub(crate) fn product(id: ProductId, name: &str) -> FactsBuilder {
    FactsBuilder {
        facts: ProductFacts::new(Product {
            id,
            name: name.to_string(),
            category: None,
            competitor: None,
            insight: String::new(),
            created_at: base_time(),
        }),
        next_id: id * 1000,
    }
}

pub(crate) fn snapshot(products: Vec<ProductFacts>) -> FactSnapshot {
    FactSnapshot {
        taken_at: Some(base_time()),
        products,
    }
}

impl FactsBuilder {
    pub(crate) fn category(mut self, category: &str) -> Self {
        self.facts.product.category = Some(category.to_string());
        self
    }

    pub(crate) fn competitor(mut self, competitor: &str) -> Self {
        self.facts.product.competitor = Some(competitor.to_string());
        self
    }

    pub(crate) fn price(mut self, value: f64) -> Self {
        self.next_id += 1;
        let minute = self.next_id;
        let id = self.next_id;
        self.push_price(id, value, minute);
        self
    }

    pub(crate) fn price_at(mut self, id: i64, value: f64, minute: i64) -> Self {
        self.push_price(id, value, minute);
        self
    }

    pub(crate) fn sentiment(mut self, score: f64) -> Self {
        self.next_id += 1;
        let slug = self.slug();
        self.facts.sentiments.push(SentimentObservation {
            id: self.next_id,
            product_id: self.facts.product.id,
            score,
            text: None,
            raw_reviews: Vec::new(),
            source: SourceRef::parse(&format!("https://example.com/reviews/{slug}")).unwrap(),
            observed_at: base_time() + Duration::minutes(self.next_id),
        });
        self
    }

    pub(crate) fn build(self) -> ProductFacts {
        self.facts
    }

    fn push_price(&mut self, id: i64, value: f64, minute: i64) {
        let slug = self.slug();
        self.facts.prices.push(PriceObservation {
            id,
            product_id: self.facts.product.id,
            price: value,
            currency: "USD".to_string(),
            source: SourceRef::parse(&format!("https://example.com/products/{slug}/{id}")).unwrap(),
            observed_at: base_time() + Duration::minutes(minute),
        });
    }

    fn slug(&self) -> String {
        self.facts.product.name.to_ascii_lowercase().replace(' ', "-")
    }
}

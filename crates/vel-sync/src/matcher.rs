use strsim::jaro_winkler;
use vel_core::{NewProduct, Product};

use crate::config::DEFAULT_MATCH_THRESHOLD;

/// Lowercase, punctuation to spaces, collapsed whitespace.
pub fn normalize_name(raw: &str) -> String {
    raw.to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn same_competitor(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        (None, None) => true,
        _ => false,
    }
}

/// Finds the stored product a scraped one refers to, within the same competitor.
#[derive(Debug, Clone, Copy)]
pub struct ProductMatcher {
    threshold: f64,
}

impl Default for ProductMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl ProductMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        jaro_winkler(&normalize_name(a), &normalize_name(b))
    }

    /// Exact normalized match wins, otherwise the most similar name at or above the threshold.
    pub fn find<'a>(&self, candidate: &NewProduct, existing: &'a [Product]) -> Option<&'a Product> {
        let wanted = normalize_name(&candidate.name);
        let peers = existing
            .iter()
            .filter(|p| same_competitor(p.competitor.as_deref(), candidate.competitor.as_deref()));

        let mut best: Option<(&Product, f64)> = None;
        for product in peers {
            let name = normalize_name(&product.name);
            if name == wanted {
                return Some(product);
            }
            let score = jaro_winkler(&name, &wanted);
            if score >= self.threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((product, score));
            }
        }
        best.map(|(product, _)| product)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn stored(id: i64, name: &str, competitor: Option<&str>) -> Product {
        Product {
            id,
            name: name.to_string(),
            category: None,
            competitor: competitor.map(ToString::to_string),
            insight: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn normalization_drops_case_and_punctuation() {
        assert_eq!(normalize_name("  Noise-Cancelling   Headphones!! "), "noise cancelling headphones");
        assert_eq!(normalize_name("4K Webcam (v2)"), "4k webcam v2");
    }

    #[test]
    fn exact_normalized_names_match_within_competitor() {
        let existing = vec![
            stored(1, "Robot Vacuum Pro", Some("HomeTech")),
            stored(2, "Robot Vacuum Pro", Some("CleanCo")),
        ];
        let candidate = NewProduct::new("robot vacuum pro").with_competitor("cleanco");
        assert_eq!(ProductMatcher::default().find(&candidate, &existing).map(|p| p.id), Some(2));
    }

    #[test]
    fn near_duplicates_match_above_threshold_only() {
        let existing = vec![stored(1, "Smart Thermostat", Some("HomeTech"))];
        let close = NewProduct::new("Smart Thermostats").with_competitor("HomeTech");
        let far = NewProduct::new("Smart Doorbell").with_competitor("HomeTech");
        let matcher = ProductMatcher::default();
        assert_eq!(matcher.find(&close, &existing).map(|p| p.id), Some(1));
        assert!(matcher.find(&far, &existing).is_none());
    }

    #[test]
    fn other_competitors_never_match() {
        let existing = vec![stored(1, "Yoga Mat Pro", Some("FitLife"))];
        let candidate = NewProduct::new("Yoga Mat Pro");
        assert!(ProductMatcher::default().find(&candidate, &existing).is_none());
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(ProductMatcher::new(3.0).threshold(), 1.0);
        assert_eq!(ProductMatcher::new(-1.0).threshold(), 0.0);
    }
}

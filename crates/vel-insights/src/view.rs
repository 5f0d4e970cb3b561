//! Filtering, sorting and paging over an aggregated product snapshot.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aggregate::ProductKpis;

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Price,
    Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub competitor: Option<String>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductKpis>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub categories: BTreeMap<String, usize>,
}

fn matches_label(value: Option<&String>, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        None => true,
        Some(w) => value.is_some_and(|v| v.eq_ignore_ascii_case(w)),
    }
}

/// Absent keys go last in either direction.
fn compare_optional(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.total_cmp(&b);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn select_products(products: &[ProductKpis], query: &ProductQuery) -> ProductPage {
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for kpis in products {
        if let Some(c) = &kpis.product.category {
            *categories.entry(c.clone()).or_default() += 1;
        }
    }

    let mut items: Vec<&ProductKpis> = products
        .iter()
        .filter(|k| matches_label(k.product.category.as_ref(), query.category.as_deref()))
        .filter(|k| matches_label(k.product.competitor.as_ref(), query.competitor.as_deref()))
        .collect();

    let order = query.order.unwrap_or_default();
    match query.sort.unwrap_or_default() {
        SortKey::Name => items.sort_by(|a, b| {
            let ord = a
                .product
                .name
                .to_lowercase()
                .cmp(&b.product.name.to_lowercase());
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }),
        SortKey::Price => {
            items.sort_by(|a, b| compare_optional(a.latest_price, b.latest_price, order))
        }
        SortKey::Sentiment => {
            items.sort_by(|a, b| compare_optional(a.mean_sentiment, b.mean_sentiment, order))
        }
    }

    let total = items.len();
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    let total_pages = total.div_ceil(per_page).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);

    ProductPage {
        items: items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect(),
        total,
        page,
        per_page,
        total_pages,
        categories,
    }
}

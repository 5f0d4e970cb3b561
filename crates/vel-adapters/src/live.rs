//! Live product-page scraping: selector-based extraction and keyword sentiment.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;
use vel_core::NewProduct;
use vel_storage::PageFetcher;

use crate::{AdapterError, ScrapeAdapter, ScrapeTarget, ScrapedItem, ScrapedPrice, ScrapedSentiment};

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_REVIEWS: usize = 3;
pub const MIN_REVIEW_CHARS: usize = 20;
pub const MAX_REVIEW_CHARS: usize = 500;
pub const MAX_SENTIMENT_TEXT_CHARS: usize = 200;

const NAME_SELECTORS: &[&str] = &[
    "h1",
    r#"[data-test="product-title"]"#,
    ".product-title",
    r#"[itemprop="name"]"#,
    "#productTitle",
];

const PRICE_SELECTORS: &[&str] = &[
    r#"[data-test="product-price"]"#,
    ".price",
    r#"[itemprop="price"]"#,
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    ".product-price",
    ".price-now",
    r#"[class*="price"]"#,
];

const REVIEW_SELECTORS: &[&str] = &[
    r#"[data-test="review-text"]"#,
    ".review-text",
    r#"[itemprop="reviewBody"]"#,
    ".review-content",
    ".customer-review",
    r#"[class*="review"]"#,
];

const POSITIVE_WORDS: &[&str] = &["great", "excellent", "amazing", "love", "perfect", "recommend", "best"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "poor", "worst", "disappointing", "waste", "awful"];

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+\.?\d*").expect("valid dollar pattern"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.?\d*").expect("valid number pattern"));

fn selector(raw: &str) -> Result<Selector, AdapterError> {
    Selector::parse(raw).map_err(|e| AdapterError::Selector {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First positive number in the text, thousands separators ignored.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    NUMBER
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|p| *p > 0.0)
}

fn extract_name(document: &Html) -> Result<String, AdapterError> {
    for raw in NAME_SELECTORS {
        let sel = selector(raw)?;
        if let Some(text) = document.select(&sel).next().map(element_text) {
            if !text.is_empty() {
                return Ok(truncate_chars(&text, MAX_NAME_CHARS));
            }
        }
    }
    Ok(UNKNOWN_PRODUCT.to_string())
}

fn extract_price(document: &Html) -> Result<Option<f64>, AdapterError> {
    for raw in PRICE_SELECTORS {
        let sel = selector(raw)?;
        if let Some(price) = document
            .select(&sel)
            .next()
            .and_then(|el| parse_price(&element_text(el)))
        {
            return Ok(Some(price));
        }
    }
    Ok(document
        .root_element()
        .text()
        .find(|node| DOLLAR_AMOUNT.is_match(node))
        .and_then(parse_price))
}

fn extract_reviews(document: &Html) -> Result<Vec<String>, AdapterError> {
    let mut reviews = Vec::new();
    for raw in REVIEW_SELECTORS {
        let sel = selector(raw)?;
        for el in document.select(&sel) {
            let text = element_text(el);
            if text.chars().count() > MIN_REVIEW_CHARS {
                reviews.push(truncate_chars(&text, MAX_REVIEW_CHARS));
                if reviews.len() >= MAX_REVIEWS {
                    break;
                }
            }
        }
        if !reviews.is_empty() {
            break;
        }
    }
    Ok(reviews)
}

/// Keyword estimate in [-1, 1]: (positive - negative) / matched keywords, 0 without matches.
pub fn estimate_sentiment(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let total = positive + negative;
    if total == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / total as f64
}

pub fn review_sentiment(reviews: &[String]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    reviews.iter().map(|r| estimate_sentiment(r)).sum::<f64>() / reviews.len() as f64
}

/// Extract one product from a fetched page. Every fact points back at `page_url`.
pub fn extract_product_page(html: &str, page_url: &str) -> Result<ScrapedItem, AdapterError> {
    let host = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .ok_or_else(|| AdapterError::InvalidUrl(page_url.to_string()))?;

    let document = Html::parse_document(html);
    let name = extract_name(&document)?;
    let price = extract_price(&document)?.ok_or_else(|| AdapterError::PriceNotFound {
        url: page_url.to_string(),
    })?;
    let reviews = extract_reviews(&document)?;

    let sentiment = (!reviews.is_empty()).then(|| ScrapedSentiment {
        score: review_sentiment(&reviews),
        text: reviews
            .first()
            .map(|r| truncate_chars(r, MAX_SENTIMENT_TEXT_CHARS)),
        raw_reviews: reviews.clone(),
        source_url: Some(page_url.to_string()),
    });

    Ok(ScrapedItem {
        product: NewProduct::new(name)
            .with_competitor(host.clone())
            .with_insight(format!("Live data extracted from {host}")),
        price: Some(ScrapedPrice {
            price,
            currency: None,
            source_url: Some(page_url.to_string()),
        }),
        sentiment,
    })
}

pub struct LivePageAdapter {
    fetcher: Arc<PageFetcher>,
}

impl LivePageAdapter {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ScrapeAdapter for LivePageAdapter {
    fn adapter_id(&self) -> &'static str {
        "live-page"
    }

    async fn scrape(&self, target: &ScrapeTarget) -> Result<Vec<ScrapedItem>, AdapterError> {
        let ScrapeTarget::Live(url) = target else {
            return Err(AdapterError::InvalidUrl(target.to_string()));
        };
        let page = self.fetcher.fetch_page(url).await?;
        let item = extract_product_page(&page.body, url)?;
        tracing::info!(url = %url, product = %item.product.name, "live page extracted");
        Ok(vec![item])
    }
}

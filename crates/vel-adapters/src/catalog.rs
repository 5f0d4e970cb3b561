//! Demo catalog: a fixed pool of sample competitor products, sampled per run.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vel_core::NewProduct;

use crate::{AdapterError, ScrapeAdapter, ScrapeTarget, ScrapedItem, ScrapedPrice, ScrapedSentiment};

pub const DEMO_BASE_URL: &str = "https://example.com";
pub const MIN_SAMPLE: usize = 3;
pub const MAX_SAMPLE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub category: &'static str,
    pub competitor: &'static str,
    pub price: f64,
    pub sentiment_score: f64,
    pub sentiment_text: &'static str,
    pub insight: &'static str,
}

impl CatalogEntry {
    pub fn slug(&self) -> String {
        self.name.to_lowercase().replace(' ', "-")
    }

    pub fn to_item(&self) -> ScrapedItem {
        let slug = self.slug();
        ScrapedItem {
            product: NewProduct::new(self.name)
                .with_category(self.category)
                .with_competitor(self.competitor)
                .with_insight(self.insight),
            price: Some(ScrapedPrice {
                price: self.price,
                currency: None,
                source_url: Some(format!("{DEMO_BASE_URL}/products/{slug}")),
            }),
            sentiment: Some(ScrapedSentiment {
                score: self.sentiment_score,
                text: Some(self.sentiment_text.to_string()),
                raw_reviews: Vec::new(),
                source_url: Some(format!("{DEMO_BASE_URL}/reviews/{slug}")),
            }),
        }
    }
}

pub const DEMO_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "UltraSound Pro Headphones",
        category: "Electronics",
        competitor: "AudioTech",
        price: 149.99,
        sentiment_score: 0.85,
        sentiment_text: "Excellent sound quality and comfortable fit",
        insight: "Strong customer satisfaction. Premium pricing justified by quality. Recommend highlighting noise cancellation in marketing.",
    },
    CatalogEntry {
        name: "SmartHome Hub Pro",
        category: "Electronics",
        competitor: "HomeTech",
        price: 89.99,
        sentiment_score: 0.78,
        sentiment_text: "Easy setup, works with most devices",
        insight: "Good value proposition at $90. Consider bundling with smart bulbs to increase AOV.",
    },
    CatalogEntry {
        name: "Wireless Charger Pad",
        category: "Electronics",
        competitor: "ChargeTech",
        price: 29.99,
        sentiment_score: 0.65,
        sentiment_text: "Works fine but charges slowly",
        insight: "Price competitive but sentiment declining. Monitor competitor fast-charging offerings.",
    },
    CatalogEntry {
        name: "4K Webcam Pro",
        category: "Electronics",
        competitor: "VisionTech",
        price: 119.99,
        sentiment_score: 0.82,
        sentiment_text: "Crystal clear video, perfect for remote work",
        insight: "Strong WFH market fit. Price 15% above market avg - consider promotion to gain share.",
    },
    CatalogEntry {
        name: "Bluetooth Speaker Mini",
        category: "Electronics",
        competitor: "SoundWave",
        price: 39.99,
        sentiment_score: 0.71,
        sentiment_text: "Good sound for the size",
        insight: "Entry-level product performing well. Opportunity to upsell to premium line.",
    },
    CatalogEntry {
        name: "FitTrack Elite Watch",
        category: "Wearables",
        competitor: "FitnessTech",
        price: 199.99,
        sentiment_score: 0.72,
        sentiment_text: "Good fitness tracking, battery could be better",
        insight: "Battery life complaints increasing. R&D should prioritize longer battery in next version.",
    },
    CatalogEntry {
        name: "SmartBand Health",
        category: "Wearables",
        competitor: "HealthTrack",
        price: 79.99,
        sentiment_score: 0.88,
        sentiment_text: "Accurate tracking, comfortable all day",
        insight: "Exceptional value + high satisfaction. PROMOTE HEAVILY - this is a market winner.",
    },
    CatalogEntry {
        name: "RunPro GPS Watch",
        category: "Wearables",
        competitor: "RunTech",
        price: 249.99,
        sentiment_score: 0.79,
        sentiment_text: "Precise GPS, great for marathons",
        insight: "Niche product for serious runners. Target running communities and marathon events.",
    },
    CatalogEntry {
        name: "Sleep Tracker Ring",
        category: "Wearables",
        competitor: "SleepTech",
        price: 299.99,
        sentiment_score: 0.74,
        sentiment_text: "Interesting insights but pricey",
        insight: "Premium pricing limiting adoption. Consider financing options to reduce barrier.",
    },
    CatalogEntry {
        name: "BrewMaster Deluxe",
        category: "Home Appliances",
        competitor: "KitchenPro",
        price: 89.99,
        sentiment_score: 0.68,
        sentiment_text: "Makes great coffee, a bit noisy",
        insight: "Noise complaints detected. Highlight programmable features to offset concern.",
    },
    CatalogEntry {
        name: "Air Purifier Max",
        category: "Home Appliances",
        competitor: "CleanAir",
        price: 159.99,
        sentiment_score: 0.91,
        sentiment_text: "Drastically improved air quality",
        insight: "TOP PERFORMER - 91% positive sentiment. Capitalize on health trends, emphasize in ads.",
    },
    CatalogEntry {
        name: "Robot Vacuum Pro",
        category: "Home Appliances",
        competitor: "AutoClean",
        price: 299.99,
        sentiment_score: 0.76,
        sentiment_text: "Good cleaning, occasionally gets stuck",
        insight: "Premium segment. Reliability concerns - ensure customer success team follows up.",
    },
    CatalogEntry {
        name: "Smart Thermostat",
        category: "Home Appliances",
        competitor: "EcoHome",
        price: 129.99,
        sentiment_score: 0.83,
        sentiment_text: "Saves money, easy to use",
        insight: "Energy savings resonate with customers. Quantify ROI in marketing (payback period).",
    },
    CatalogEntry {
        name: "Blender Ultra",
        category: "Home Appliances",
        competitor: "BlendTech",
        price: 69.99,
        sentiment_score: 0.70,
        sentiment_text: "Powerful but loud",
        insight: "Performance vs noise tradeoff. Position as professional-grade for enthusiasts.",
    },
    CatalogEntry {
        name: "RunComfort Sneakers",
        category: "Fashion",
        competitor: "SportStyle",
        price: 79.99,
        sentiment_score: 0.86,
        sentiment_text: "Most comfortable shoes I own",
        insight: "Comfort is key differentiator. Expand color options to capture more market.",
    },
    CatalogEntry {
        name: "Urban Backpack Pro",
        category: "Fashion",
        competitor: "CityGear",
        price: 59.99,
        sentiment_score: 0.81,
        sentiment_text: "Durable and stylish",
        insight: "Strong appeal to young professionals. Cross-sell with laptop sleeves.",
    },
    CatalogEntry {
        name: "Winter Jacket Elite",
        category: "Fashion",
        competitor: "OutdoorWear",
        price: 149.99,
        sentiment_score: 0.77,
        sentiment_text: "Warm but heavy",
        insight: "Seasonal product. Weight complaints - consider lightweight insulation R&D.",
    },
    CatalogEntry {
        name: "Casual Watch Classic",
        category: "Fashion",
        competitor: "TimeTech",
        price: 99.99,
        sentiment_score: 0.75,
        sentiment_text: "Nice design, good value",
        insight: "Mid-tier positioning. Limited edition releases could create urgency.",
    },
    CatalogEntry {
        name: "LED Grow Light",
        category: "Home & Garden",
        competitor: "PlantTech",
        price: 49.99,
        sentiment_score: 0.89,
        sentiment_text: "Plants are thriving!",
        insight: "Urban gardening trend growing. Bundle with starter plant kits.",
    },
    CatalogEntry {
        name: "Smart Sprinkler System",
        category: "Home & Garden",
        competitor: "WaterSmart",
        price: 199.99,
        sentiment_score: 0.73,
        sentiment_text: "Saves water, setup was tricky",
        insight: "Installation friction. Offer free setup service or improve instructions.",
    },
    CatalogEntry {
        name: "Outdoor Security Camera",
        category: "Home & Garden",
        competitor: "SecureHome",
        price: 129.99,
        sentiment_score: 0.84,
        sentiment_text: "Clear night vision, easy install",
        insight: "Security is high-priority. Create multi-camera bundles for whole-home coverage.",
    },
    CatalogEntry {
        name: "Solar Path Lights",
        category: "Home & Garden",
        competitor: "EcoLight",
        price: 34.99,
        sentiment_score: 0.69,
        sentiment_text: "Nice ambiance but not very bright",
        insight: "Brightness issues. Next version should prioritize lumens. Price sensitive segment.",
    },
    CatalogEntry {
        name: "Sonic Toothbrush Pro",
        category: "Beauty & Personal Care",
        competitor: "DentalTech",
        price: 89.99,
        sentiment_score: 0.87,
        sentiment_text: "Dentist recommended, works great",
        insight: "Medical endorsements drive trust. Partner with dental offices for referrals.",
    },
    CatalogEntry {
        name: "Hair Dryer Ionic",
        category: "Beauty & Personal Care",
        competitor: "SalonPro",
        price: 69.99,
        sentiment_score: 0.80,
        sentiment_text: "Dries quickly, reduces frizz",
        insight: "Professional-quality at consumer price. Influencer partnerships recommended.",
    },
    CatalogEntry {
        name: "Facial Cleansing Brush",
        category: "Beauty & Personal Care",
        competitor: "SkinCare",
        price: 39.99,
        sentiment_score: 0.76,
        sentiment_text: "Skin feels cleaner",
        insight: "Subscription opportunity for brush head replacements (recurring revenue).",
    },
    CatalogEntry {
        name: "LED Mirror Vanity",
        category: "Beauty & Personal Care",
        competitor: "BeautyTech",
        price: 79.99,
        sentiment_score: 0.82,
        sentiment_text: "Perfect lighting for makeup",
        insight: "High engagement on social media. User-generated content strategy recommended.",
    },
    CatalogEntry {
        name: "Standing Desk Converter",
        category: "Office & Productivity",
        competitor: "ErgoWork",
        price: 149.99,
        sentiment_score: 0.78,
        sentiment_text: "Good for back pain",
        insight: "Health benefit is key selling point. Target corporate wellness programs.",
    },
    CatalogEntry {
        name: "Ergonomic Mouse",
        category: "Office & Productivity",
        competitor: "ComfortTech",
        price: 49.99,
        sentiment_score: 0.85,
        sentiment_text: "No more wrist pain",
        insight: "Pain-relief messaging resonates. Medical/therapeutic positioning opportunity.",
    },
    CatalogEntry {
        name: "Wireless Keyboard Slim",
        category: "Office & Productivity",
        competitor: "TypeTech",
        price: 59.99,
        sentiment_score: 0.74,
        sentiment_text: "Quiet typing, nice feel",
        insight: "Open office appeal. Bundle with mouse for higher cart value.",
    },
    CatalogEntry {
        name: "Desk Organizer Premium",
        category: "Office & Productivity",
        competitor: "OfficePro",
        price: 29.99,
        sentiment_score: 0.72,
        sentiment_text: "Keeps desk tidy",
        insight: "Low-cost add-on item. Perfect for cart threshold free shipping promotions.",
    },
    CatalogEntry {
        name: "Monitor Arm Dual",
        category: "Office & Productivity",
        competitor: "ScreenTech",
        price: 99.99,
        sentiment_score: 0.81,
        sentiment_text: "More desk space, adjustable",
        insight: "Productivity enhancer. Target remote workers and gamers (dual use cases).",
    },
    CatalogEntry {
        name: "Laptop Stand Aluminum",
        category: "Office & Productivity",
        competitor: "TechGear",
        price: 39.99,
        sentiment_score: 0.79,
        sentiment_text: "Better posture, sleek design",
        insight: "Aesthetics + ergonomics. Instagram-worthy - leverage influencer unboxings.",
    },
    CatalogEntry {
        name: "Cable Management Kit",
        category: "Office & Productivity",
        competitor: "OrganizeTech",
        price: 19.99,
        sentiment_score: 0.68,
        sentiment_text: "Helps but not perfect",
        insight: "Utility product with room for improvement. Customer feedback for V2 design.",
    },
    CatalogEntry {
        name: "USB-C Hub 7-in-1",
        category: "Office & Productivity",
        competitor: "ConnectTech",
        price: 44.99,
        sentiment_score: 0.83,
        sentiment_text: "Essential for new MacBooks",
        insight: "Mac ecosystem tie-in. Market alongside Apple product launches.",
    },
];

/// Samples 3 to 5 distinct catalog entries per scrape.
#[derive(Debug)]
pub struct DemoCatalogAdapter {
    rng: Mutex<StdRng>,
}

impl Default for DemoCatalogAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoCatalogAdapter {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn sample(&self) -> Vec<&'static CatalogEntry> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let amount = rng.random_range(MIN_SAMPLE..=MAX_SAMPLE);
        rand::seq::index::sample(&mut *rng, DEMO_CATALOG.len(), amount)
            .into_iter()
            .map(|i| &DEMO_CATALOG[i])
            .collect()
    }
}

#[async_trait]
impl ScrapeAdapter for DemoCatalogAdapter {
    fn adapter_id(&self) -> &'static str {
        "demo-catalog"
    }

    async fn scrape(&self, target: &ScrapeTarget) -> Result<Vec<ScrapedItem>, AdapterError> {
        let items: Vec<ScrapedItem> = self.sample().into_iter().map(CatalogEntry::to_item).collect();
        tracing::debug!(scrape_target = %target, items = items.len(), "demo catalog sampled");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn catalog_spans_seven_categories() {
        let categories: BTreeSet<&str> = DEMO_CATALOG.iter().map(|e| e.category).collect();
        assert_eq!(categories.len(), 7);
        assert_eq!(DEMO_CATALOG.len(), 34);
        assert!(DEMO_CATALOG
            .iter()
            .all(|e| e.price > 0.0 && (-1.0..=1.0).contains(&e.sentiment_score)));
    }

    #[test]
    fn sample_size_is_between_three_and_five_and_distinct() {
        let adapter = DemoCatalogAdapter::seeded(7);
        for _ in 0..50 {
            let picked = adapter.sample();
            assert!((MIN_SAMPLE..=MAX_SAMPLE).contains(&picked.len()));
            let names: BTreeSet<&str> = picked.iter().map(|e| e.name).collect();
            assert_eq!(names.len(), picked.len());
        }
    }

    #[test]
    fn seeded_adapters_are_reproducible() {
        let a: Vec<&str> = DemoCatalogAdapter::seeded(42).sample().iter().map(|e| e.name).collect();
        let b: Vec<&str> = DemoCatalogAdapter::seeded(42).sample().iter().map(|e| e.name).collect();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn items_carry_product_and_review_sources() {
        let adapter = DemoCatalogAdapter::seeded(1);
        let items = adapter
            .scrape(&ScrapeTarget::Catalog("default".into()))
            .await
            .unwrap();
        for item in &items {
            let slug = item.product.name.to_lowercase().replace(' ', "-");
            let price = item.price.as_ref().unwrap();
            assert_eq!(
                price.source_url.as_deref(),
                Some(format!("https://example.com/products/{slug}").as_str())
            );
            let sentiment = item.sentiment.as_ref().unwrap();
            assert_eq!(
                sentiment.source_url.as_deref(),
                Some(format!("https://example.com/reviews/{slug}").as_str())
            );
            assert!(item.product.category.is_some());
        }
    }
}

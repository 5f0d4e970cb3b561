use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use vel_core::{
    ActivityLogEntry, ActivityStatus, NewActivity, NewProduct, PriceObservation, Product,
    ProductId, SentimentObservation, SourceRef, VerifiedPrice, VerifiedSentiment,
};

use crate::{FactStore, StoreError};

const PRODUCT_COLUMNS: &str = "id, name, category, competitor, insight, created_at";
const PRICE_COLUMNS: &str = "id, product_id, price, currency, source_url, observed_at";
const SENTIMENT_COLUMNS: &str =
    "id, product_id, score, text, raw_reviews, source_url, observed_at";

#[derive(Debug, Clone)]
pub struct PgFactStore {
    pool: PgPool,
}

impl PgFactStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn require_product(&self, id: ProductId) -> Result<(), StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(())
        } else {
            Err(StoreError::ProductNotFound(id))
        }
    }
}

fn source_from_row(row: &PgRow) -> Result<SourceRef, StoreError> {
    let raw: String = row.try_get("source_url")?;
    SourceRef::parse(&raw).map_err(|err| StoreError::InvalidRow(err.to_string()))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        competitor: row.try_get("competitor")?,
        insight: row.try_get("insight")?,
        created_at: row.try_get("created_at")?,
    })
}

fn price_from_row(row: &PgRow) -> Result<PriceObservation, StoreError> {
    Ok(PriceObservation {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        price: row.try_get("price")?,
        currency: row.try_get("currency")?,
        source: source_from_row(row)?,
        observed_at: row.try_get("observed_at")?,
    })
}

fn sentiment_from_row(row: &PgRow) -> Result<SentimentObservation, StoreError> {
    Ok(SentimentObservation {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        score: row.try_get("score")?,
        text: row.try_get("text")?,
        raw_reviews: row.try_get("raw_reviews")?,
        source: source_from_row(row)?,
        observed_at: row.try_get("observed_at")?,
    })
}

fn activity_from_row(row: &PgRow) -> Result<ActivityLogEntry, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(ActivityLogEntry {
        id: row.try_get("id")?,
        action: row.try_get("action")?,
        status: status
            .parse::<ActivityStatus>()
            .map_err(|err| StoreError::InvalidRow(err.to_string()))?,
        details: row.try_get("details")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl FactStore for PgFactStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let product = product.normalized();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, category, competitor, insight)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.competitor)
        .bind(&product.insight)
        .fetch_one(&self.pool)
        .await?;
        product_from_row(&row)
    }

    async fn update_insight(&self, id: ProductId, insight: &str) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE products SET insight = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(insight.trim())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => product_from_row(&row),
            None => Err(StoreError::ProductNotFound(id)),
        }
    }

    async fn list_prices(&self, product_id: ProductId) -> Result<Vec<PriceObservation>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRICE_COLUMNS}
              FROM price_observations
             WHERE product_id = $1
             ORDER BY observed_at DESC, id DESC
            "#
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(price_from_row).collect()
    }

    async fn list_all_prices(&self) -> Result<Vec<PriceObservation>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRICE_COLUMNS} FROM price_observations ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(price_from_row).collect()
    }

    async fn add_price(&self, price: VerifiedPrice) -> Result<PriceObservation, StoreError> {
        self.require_product(price.product_id()).await?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO price_observations (product_id, price, currency, source_url, observed_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRICE_COLUMNS}
            "#
        ))
        .bind(price.product_id())
        .bind(price.price())
        .bind(price.currency())
        .bind(price.source().as_str())
        .bind(price.observed_at())
        .fetch_one(&self.pool)
        .await?;
        price_from_row(&row)
    }

    async fn list_sentiment(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<Vec<SentimentObservation>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SENTIMENT_COLUMNS}
              FROM sentiment_observations
             WHERE ($1::BIGINT IS NULL OR product_id = $1)
             ORDER BY observed_at DESC, id DESC
            "#
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(sentiment_from_row).collect()
    }

    async fn add_sentiment(
        &self,
        sentiment: VerifiedSentiment,
    ) -> Result<SentimentObservation, StoreError> {
        self.require_product(sentiment.product_id()).await?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO sentiment_observations
                (product_id, score, text, raw_reviews, source_url, observed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SENTIMENT_COLUMNS}
            "#
        ))
        .bind(sentiment.product_id())
        .bind(sentiment.score())
        .bind(sentiment.text())
        .bind(sentiment.raw_reviews().to_vec())
        .bind(sentiment.source().as_str())
        .bind(sentiment.observed_at())
        .fetch_one(&self.pool)
        .await?;
        sentiment_from_row(&row)
    }

    async fn append_activity(&self, entry: NewActivity) -> Result<ActivityLogEntry, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO activity_log (action, status, details)
            VALUES ($1, $2, $3)
            RETURNING id, action, status, details, created_at
            "#,
        )
        .bind(&entry.action)
        .bind(entry.status.as_str())
        .bind(&entry.details)
        .fetch_one(&self.pool)
        .await?;
        activity_from_row(&row)
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityLogEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, action, status, details, created_at
              FROM activity_log
             ORDER BY created_at DESC, id DESC
             LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(activity_from_row).collect()
    }
}

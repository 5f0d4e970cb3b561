//! Axum JSON API over the fact store, the insight engine and background ingestion.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use vel_core::{
    GroundingValidator, NewActivity, NewProduct, PriceSubmission, ProductId, SentimentSubmission,
};
use vel_insights::{
    aggregate, analyze, classify, select_products, select_strategic, sentiment_summary,
    strategic_headline, swot_text, ProductQuery, StrategicOverview, SwotReport, SwotText,
};
use vel_storage::{load_snapshot, FactStore};
use vel_sync::IngestionJobs;

mod error;

pub use error::ApiError;

pub const CRATE_NAME: &str = "vel-web";
pub const DEFAULT_LOG_LIMIT: usize = 50;
pub const MAX_LOG_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub bind: String,
    pub port: u16,
}

impl WebConfig {
    pub fn from_env() -> Self {
        Self {
            bind: std::env::var("VELOCITY_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("VELOCITY_WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FactStore>,
    pub jobs: IngestionJobs,
    pub validator: GroundingValidator,
}

impl AppState {
    pub fn new(store: Arc<dyn FactStore>, jobs: IngestionJobs) -> Self {
        Self {
            store,
            jobs,
            validator: GroundingValidator::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(Envelope { success: true, data })).into_response()
}

type ApiResult = Result<Response, ApiError>;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/products", get(list_products_handler).post(create_product_handler))
        .route("/api/products/{id}", get(product_handler))
        .route(
            "/api/products/{id}/prices",
            get(list_prices_handler).post(add_price_handler),
        )
        .route("/api/sentiment", get(list_sentiment_handler).post(add_sentiment_handler))
        .route("/api/analytics/sentiment", get(sentiment_summary_handler))
        .route("/api/analytics/swot", get(swot_handler))
        .route("/api/analytics/strategic", get(strategic_handler))
        .route("/api/agent/scrape", post(scrape_handler))
        .route("/api/agent/logs", get(activity_handler))
        .route("/api/agent/log", post(append_activity_handler))
        .with_state(Arc::new(state))
}

pub async fn serve(config: &WebConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, backend = state.store.backend(), "velocity api listening");
    axum::serve(listener, app(state)).await.context("serving http")?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(json!({ "status": "ok", "backend": state.store.backend() })).into_response()
}

async fn list_products_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> ApiResult {
    let snapshot = load_snapshot(state.store.as_ref()).await?;
    let agg = aggregate(&snapshot);
    Ok(respond(StatusCode::OK, select_products(&agg.products, &query)))
}

async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewProduct>,
) -> ApiResult {
    if body.name.trim().is_empty() {
        return Err(ApiError::Invalid("product name is required".into()));
    }
    let product = state.store.create_product(body.normalized()).await?;
    tracing::info!(product_id = product.id, name = %product.name, "product created");
    Ok(respond(StatusCode::CREATED, product))
}

async fn product_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> ApiResult {
    let snapshot = load_snapshot(state.store.as_ref()).await?;
    let agg = aggregate(&snapshot);
    let kpis = agg.get(id).ok_or(ApiError::NotFound(id))?;
    Ok(respond(StatusCode::OK, kpis))
}

async fn list_prices_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> ApiResult {
    if state.store.get_product(id).await?.is_none() {
        return Err(ApiError::NotFound(id));
    }
    Ok(respond(StatusCode::OK, state.store.list_prices(id).await?))
}

#[derive(Debug, Deserialize)]
struct NewPrice {
    price: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    observed_at: Option<DateTime<Utc>>,
}

async fn add_price_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
    Json(body): Json<NewPrice>,
) -> ApiResult {
    let verified = state.validator.verify_price(PriceSubmission {
        product_id: id,
        price: body.price,
        currency: body.currency,
        source_url: body.source_url,
        observed_at: body.observed_at,
    })?;
    let stored = state.store.add_price(verified).await?;
    Ok(respond(StatusCode::CREATED, stored))
}

#[derive(Debug, Default, Deserialize)]
struct SentimentQuery {
    product_id: Option<ProductId>,
}

async fn list_sentiment_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SentimentQuery>,
) -> ApiResult {
    Ok(respond(
        StatusCode::OK,
        state.store.list_sentiment(query.product_id).await?,
    ))
}

async fn add_sentiment_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SentimentSubmission>,
) -> ApiResult {
    let verified = state.validator.verify_sentiment(body)?;
    let stored = state.store.add_sentiment(verified).await?;
    Ok(respond(StatusCode::CREATED, stored))
}

async fn sentiment_summary_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = load_snapshot(state.store.as_ref()).await?;
    Ok(respond(StatusCode::OK, sentiment_summary(&snapshot)))
}

#[derive(Debug, Serialize)]
struct SwotResponse {
    findings: SwotReport,
    text: SwotText,
}

async fn swot_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = load_snapshot(state.store.as_ref()).await?;
    let findings = classify(&aggregate(&snapshot));
    let text = swot_text(&findings);
    Ok(respond(StatusCode::OK, SwotResponse { findings, text }))
}

#[derive(Debug, Serialize)]
struct StrategicResponse {
    #[serde(flatten)]
    overview: StrategicOverview,
    headline: String,
}

async fn strategic_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = load_snapshot(state.store.as_ref()).await?;
    let overview = select_strategic(&aggregate(&snapshot));
    let headline = strategic_headline(&overview);
    Ok(respond(StatusCode::OK, StrategicResponse { overview, headline }))
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    targets: Vec<String>,
}

async fn scrape_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ScrapeRequest>>,
) -> ApiResult {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let mut targets = request.targets;
    targets.extend(request.target);
    let job = state.jobs.submit(&targets)?;
    Ok(respond(StatusCode::ACCEPTED, job.ticket))
}

#[derive(Debug, Default, Deserialize)]
struct LogQuery {
    limit: Option<usize>,
}

async fn activity_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    Ok(respond(StatusCode::OK, state.store.list_activity(limit).await?))
}

async fn append_activity_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewActivity>,
) -> ApiResult {
    if body.action.trim().is_empty() {
        return Err(ApiError::Invalid("activity action is required".into()));
    }
    Ok(respond(StatusCode::CREATED, state.store.append_activity(body).await?))
}

/// Full report for one snapshot, used by the CLI `report` command.
pub async fn report_json(store: &dyn FactStore) -> anyhow::Result<serde_json::Value> {
    let snapshot = load_snapshot(store).await.context("loading fact snapshot")?;
    let report = analyze(&snapshot);
    Ok(json!({
        "headline": report.headline(),
        "swot": swot_text(&report.swot),
        "report": report,
    }))
}

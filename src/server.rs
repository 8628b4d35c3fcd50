//! HTTP API server.
//!
//! Exposes the search engine and ingestion coordinator as a JSON HTTP API.
//! All caller-input validation lives here: the engine below assumes a
//! non-empty normalized query and in-range pagination.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/search?q&page&limit&sort` | Relevance-ranked search |
//! | `GET`  | `/suggest?q&limit` | Autocomplete suggestions |
//! | `GET`  | `/products/category/{category}?page&limit` | Browse by category |
//! | `GET`  | `/products/brand/{brand}?page&limit` | Browse by brand |
//! | `GET`  | `/products/top?limit` | Top-rated products |
//! | `POST` | `/admin/load` | Ingest the configured CSV feed |
//! | `POST` | `/admin/clear` | Delete all products |
//! | `GET`  | `/admin/stats` | Catalog statistics |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query parameter 'q' is required" } }
//! ```
//!
//! Error codes: `bad_request` (400), `empty_ingest` (400),
//! `store_unavailable` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! storefront clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::csv_source;
use crate::error::EngineError;
use crate::ingest::Ingestor;
use crate::models::{IngestReport, Product, SearchResult, SortMode};
use crate::search::SearchEngine;
use crate::stats::{self, CatalogStats};

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    engine: SearchEngine,
    ingestor: Ingestor,
    pool: SqlitePool,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and registers all
/// route handlers. The server runs until the process is terminated.
pub async fn run_server(
    config: &Config,
    engine: SearchEngine,
    ingestor: Ingestor,
    pool: SqlitePool,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        engine,
        ingestor,
        pool,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/search", get(handle_search))
        .route("/suggest", get(handle_suggest))
        .route("/products/category/{category}", get(handle_by_category))
        .route("/products/brand/{brand}", get(handle_by_brand))
        .route("/products/top", get(handle_top_rated))
        .route("/admin/load", post(handle_load))
        .route("/admin/clear", post(handle_clear))
        .route("/admin/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("storefront-search listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRequest(message) => bad_request(message),
            EngineError::StoreUnavailable(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "store_unavailable".to_string(),
                message: err.to_string(),
            },
            EngineError::EmptyIngest => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "empty_ingest".to_string(),
                message: err.to_string(),
            },
        }
    }
}

// ============ Parameter validation ============

fn validate_page(page: Option<i64>) -> Result<i64, AppError> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(bad_request("page must be greater than 0"));
    }
    Ok(page)
}

fn validate_limit(limit: Option<i64>, default: i64, max: i64) -> Result<i64, AppError> {
    let limit = limit.unwrap_or(default);
    if limit < 1 || limit > max {
        return Err(bad_request(format!("limit must be between 1 and {}", max)));
    }
    Ok(limit)
}

fn validate_sort(sort: Option<&str>) -> Result<SortMode, AppError> {
    match sort {
        None => Ok(SortMode::Relevance),
        Some(raw) => SortMode::parse(raw).ok_or_else(|| {
            bad_request(
                "sort must be one of relevance, price_asc, price_desc, rating, newest",
            )
        }),
    }
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
    sort: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>, AppError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| bad_request("query parameter 'q' is required"))?;

    let page = validate_page(params.page)?;
    let limit = validate_limit(
        params.limit,
        state.config.search.default_page_size,
        state.config.search.max_page_size,
    )?;
    let sort = validate_sort(params.sort.as_deref())?;

    let result = state.engine.search(query, page, limit, sort).await?;
    Ok(Json(result))
}

// ============ GET /suggest ============

#[derive(Deserialize)]
struct SuggestParams {
    q: Option<String>,
    limit: Option<i64>,
}

#[derive(Serialize)]
struct SuggestResponse {
    suggestions: Vec<String>,
    count: usize,
}

async fn handle_suggest(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestResponse>, AppError> {
    let prefix = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| q.len() >= 2)
        .ok_or_else(|| bad_request("query parameter 'q' must be at least 2 characters"))?;

    let limit = validate_limit(params.limit, 10, 50)?;

    let suggestions = state.engine.suggest(prefix, limit as usize).await?;
    let count = suggestions.len();
    Ok(Json(SuggestResponse { suggestions, count }))
}

// ============ GET /products/category/{category}, /products/brand/{brand} ============

#[derive(Deserialize)]
struct BrowseParams {
    page: Option<i64>,
    limit: Option<i64>,
}

async fn handle_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<SearchResult>, AppError> {
    let page = validate_page(params.page)?;
    let limit = validate_limit(
        params.limit,
        state.config.search.default_page_size,
        state.config.search.max_page_size,
    )?;

    let result = state
        .engine
        .products_by_category(&category, page, limit)
        .await?;
    Ok(Json(result))
}

async fn handle_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<SearchResult>, AppError> {
    let page = validate_page(params.page)?;
    let limit = validate_limit(
        params.limit,
        state.config.search.default_page_size,
        state.config.search.max_page_size,
    )?;

    let result = state.engine.products_by_brand(&brand, page, limit).await?;
    Ok(Json(result))
}

// ============ GET /products/top ============

#[derive(Deserialize)]
struct TopParams {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct TopRatedResponse {
    products: Vec<Product>,
    count: usize,
}

async fn handle_top_rated(
    State(state): State<AppState>,
    Query(params): Query<TopParams>,
) -> Result<Json<TopRatedResponse>, AppError> {
    let limit = validate_limit(params.limit, 20, state.config.search.max_page_size)?;

    let products = state.engine.top_rated(limit).await?;
    let count = products.len();
    Ok(Json(TopRatedResponse { products, count }))
}

// ============ POST /admin/load ============

async fn handle_load(State(state): State<AppState>) -> Result<Json<IngestReport>, AppError> {
    let csv_path = state.config.ingest.csv_path.clone();
    let records = tokio::task::spawn_blocking(move || csv_source::read_products(&csv_path))
        .await
        .map_err(|e| internal(e.to_string()))?
        .map_err(|e| internal(e.to_string()))?;

    let report = state.ingestor.load_records(records).await?;
    Ok(Json(report))
}

// ============ POST /admin/clear ============

#[derive(Serialize)]
struct ClearResponse {
    deleted: u64,
}

async fn handle_clear(State(state): State<AppState>) -> Result<Json<ClearResponse>, AppError> {
    let deleted = state.ingestor.clear_all().await?;
    Ok(Json(ClearResponse { deleted }))
}

// ============ GET /admin/stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    let stats = stats::collect(&state.pool, &state.config)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(stats))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

//! HTTP API handlers for reviewdash.
//!
//! The browser page talks to these endpoints. Every view endpoint answers
//! with a `Panel` envelope: `{"status": "ready", "data": ..}` or
//! `{"status": "empty", "message": ..}`.
//!
//! - `POST /api/sessions/:id/fetch` - Pull reviews for the selected countries
//! - `GET /api/sessions/:id/{metrics,overview,trend,comparison,reviews}` - Views
//! - `GET /api/sessions/:id/export` - Filtered reviews as CSV
//!
//! Malformed paths, query strings and bodies are answered with 400 and the
//! same `{"error": ..}` body as every other failure.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::ReviewCache;
use crate::config::Config;
use crate::countries::{self, DEFAULT_SELECTION};
use crate::dashboard::{
    self, ComparisonView, MetricsView, OverviewView, Panel, ReviewsView, SessionView, TrendView,
};
use crate::data_sources::ReviewSource;
use crate::error::ApiError;
use crate::export;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::filter::{DetailFilter, GlobalFilter};
use crate::model::{FetchRequest, FetchResponse, Review, SessionCreated};
use crate::pipeline::collect_reviews;
use crate::session::SessionStore;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ReviewSource>,
    pub cache: ReviewCache,
    pub sessions: SessionStore,
    pub app: AppInfo,
}

/// Static facts about the app being analysed.
#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub app_id: String,
    pub title: String,
    pub export_prefix: String,
}

impl AppState {
    pub fn new(config: &Config, source: Arc<dyn ReviewSource>) -> Self {
        Self {
            source,
            cache: ReviewCache::new(Duration::seconds(config.cache_ttl_secs)),
            sessions: SessionStore::new(Duration::seconds(config.session_idle_secs)),
            app: AppInfo {
                app_id: config.app_id.clone(),
                title: config.app_title.clone(),
                export_prefix: config.export_prefix.clone(),
            },
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/countries", get(list_countries))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/fetch", post(fetch_reviews))
        .route("/api/sessions/:id/clear", post(clear_session))
        .route("/api/sessions/:id/metrics", get(get_metrics))
        .route("/api/sessions/:id/overview", get(get_overview))
        .route("/api/sessions/:id/trend", get(get_trend))
        .route("/api/sessions/:id/comparison", get(get_comparison))
        .route("/api/sessions/:id/reviews", get(get_reviews))
        .route("/api/sessions/:id/export", get(export_reviews))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// GET / - The dashboard page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct CountryEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub lang: &'static str,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct CountriesResponse {
    pub app: AppInfo,
    pub countries: Vec<CountryEntry>,
    pub default_selection: Vec<&'static str>,
}

/// GET /api/countries - The country catalog and default selection.
pub async fn list_countries(State(state): State<AppState>) -> Json<CountriesResponse> {
    let countries = countries::catalog()
        .iter()
        .map(|c| CountryEntry {
            code: c.code,
            name: c.name,
            lang: c.lang,
            label: c.label(),
        })
        .collect();

    Json(CountriesResponse {
        app: state.app.clone(),
        countries,
        default_selection: DEFAULT_SELECTION.to_vec(),
    })
}

/// POST /api/sessions - Start a new session.
#[instrument(skip(state))]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let id = state.sessions.create(Utc::now());
    info!(session = %id, active = state.sessions.len(), "Session created");
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

/// DELETE /api/sessions/:id - Drop a session and its data.
#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id) {
        info!(session = %id, "Session removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

/// POST /api/sessions/:id/clear - Forget the fetched data, keep the session.
#[instrument(skip(state))]
pub async fn clear_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.clear(id, Utc::now()) {
        info!(session = %id, "Session cleared");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

/// POST /api/sessions/:id/fetch - Fetch reviews for the selected countries.
///
/// # Request Body
///
/// ```json
/// { "countries": ["tr", "us", "de"] }
/// ```
///
/// Countries that fail are reported in `warnings` and left out. If nothing
/// at all comes back, the session keeps its previous data.
#[instrument(skip(state, request), fields(countries))]
pub async fn fetch_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<FetchRequest>,
) -> Result<Json<FetchResponse>, ApiError> {
    tracing::Span::current().record("countries", tracing::field::debug(&request.countries));

    if !state.sessions.exists(id) {
        return Err(ApiError::SessionNotFound);
    }
    if request.countries.iter().all(|c| c.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Select at least one country.".to_string(),
        ));
    }

    let now = Utc::now();
    let outcome = collect_reviews(state.source.as_ref(), &state.cache, &request.countries, now).await;

    if outcome.reviews.is_empty() {
        warn!(session = %id, warnings = outcome.warnings.len(), "No reviews found for selection");
        return Ok(Json(FetchResponse {
            loaded: outcome.loaded,
            total: 0,
            warnings: outcome.warnings,
            message: "No reviews were found for the selected countries.".to_string(),
        }));
    }

    let total = outcome.reviews.len();
    if !state.sessions.replace(id, outcome.reviews, now) {
        return Err(ApiError::SessionNotFound);
    }

    info!(session = %id, total, loaded = ?outcome.loaded, "Session dataset replaced");

    Ok(Json(FetchResponse {
        loaded: outcome.loaded,
        total,
        warnings: outcome.warnings,
        message: format!("Analysis complete: {} reviews processed.", total),
    }))
}

/// Query parameters shared by the views.
#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    /// Comma-separated country codes for the global filter.
    pub countries: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub countries: Option<String>,
    /// First day to include (`YYYY-MM-DD`).
    pub start: Option<NaiveDate>,
    /// Last day to include (`YYYY-MM-DD`).
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TableQuery {
    pub countries: Option<String>,
    /// Comma-separated star ratings, 1 to 5.
    pub ratings: Option<String>,
    /// Comma-separated country codes, applied after the global filter.
    pub review_countries: Option<String>,
}

impl TableQuery {
    fn filters(&self) -> Result<(GlobalFilter, DetailFilter), ApiError> {
        let global = GlobalFilter::parse(self.countries.as_deref());
        let detail = DetailFilter::parse(self.ratings.as_deref(), self.review_countries.as_deref())
            .map_err(ApiError::BadRequest)?;
        Ok((global, detail))
    }
}

type Dataset = Option<Arc<Vec<Review>>>;

fn session_dataset(state: &AppState, id: Uuid) -> Result<Dataset, ApiError> {
    state
        .sessions
        .dataset(id, Utc::now())
        .ok_or(ApiError::SessionNotFound)
}

/// GET /api/sessions/:id - What the session currently holds.
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Panel<SessionView>>, ApiError> {
    let dataset = session_dataset(&state, id)?;
    Ok(Json(dashboard::session_view(
        dataset.as_deref().map(Vec::as_slice),
    )))
}

/// GET /api/sessions/:id/metrics - Mean, median, totals and sentiment.
#[instrument(skip(state))]
pub async fn get_metrics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ViewQuery>,
) -> Result<Json<Panel<MetricsView>>, ApiError> {
    let dataset = session_dataset(&state, id)?;
    let global = GlobalFilter::parse(query.countries.as_deref());
    Ok(Json(dashboard::metrics(
        dataset.as_deref().map(Vec::as_slice),
        &global,
    )))
}

/// GET /api/sessions/:id/overview - Sentiment scorecard and rating histogram.
#[instrument(skip(state))]
pub async fn get_overview(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ViewQuery>,
) -> Result<Json<Panel<OverviewView>>, ApiError> {
    let dataset = session_dataset(&state, id)?;
    let global = GlobalFilter::parse(query.countries.as_deref());
    Ok(Json(dashboard::overview(
        dataset.as_deref().map(Vec::as_slice),
        &global,
    )))
}

/// GET /api/sessions/:id/trend - Daily means with a rolling average.
#[instrument(skip(state))]
pub async fn get_trend(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> Result<Json<Panel<TrendView>>, ApiError> {
    let dataset = session_dataset(&state, id)?;
    let global = GlobalFilter::parse(query.countries.as_deref());
    let panel = dashboard::trend(
        dataset.as_deref().map(Vec::as_slice),
        &global,
        query.start,
        query.end,
    )
    .map_err(ApiError::BadRequest)?;
    Ok(Json(panel))
}

/// GET /api/sessions/:id/comparison - Per-country summary and rating shares.
#[instrument(skip(state))]
pub async fn get_comparison(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ViewQuery>,
) -> Result<Json<Panel<ComparisonView>>, ApiError> {
    let dataset = session_dataset(&state, id)?;
    let global = GlobalFilter::parse(query.countries.as_deref());
    Ok(Json(dashboard::comparison(
        dataset.as_deref().map(Vec::as_slice),
        &global,
    )))
}

/// GET /api/sessions/:id/reviews - The filterable review table.
#[instrument(skip(state))]
pub async fn get_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TableQuery>,
) -> Result<Json<Panel<ReviewsView>>, ApiError> {
    let dataset = session_dataset(&state, id)?;
    let (global, detail) = query.filters()?;
    Ok(Json(dashboard::reviews(
        dataset.as_deref().map(Vec::as_slice),
        &global,
        &detail,
    )))
}

/// GET /api/sessions/:id/export - The review table as a CSV download.
///
/// Accepts the same parameters as `/reviews` and exports exactly its rows.
#[instrument(skip(state))]
pub async fn export_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TableQuery>,
) -> Result<Response, ApiError> {
    let dataset = session_dataset(&state, id)?;
    let (global, detail) = query.filters()?;

    let rows = dashboard::table_rows(dataset.as_deref().map(Vec::as_slice), &global, &detail)
        .ok_or_else(|| ApiError::BadRequest("No reviews have been fetched yet.".to_string()))?;
    let body = export::write_csv(&rows)?;
    let file_name = export::export_file_name(&state.app.export_prefix, Utc::now().date_naive());

    info!(session = %id, rows = rows.len(), file = %file_name, "Reviews exported");

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    Ok((headers, body).into_response())
}

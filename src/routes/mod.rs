use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    db::VenueStore,
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware, require_admin},
    models::VenueCategory,
    services::images::ImageProvider,
};

pub mod admin;
pub mod tools;
pub mod venues;

/// Shared application state, built once at startup and injected into handlers
pub struct AppState {
    pub store: Arc<dyn VenueStore>,
    pub images: Arc<dyn ImageProvider>,
    pub admin_token: String,
    pub max_venue_images: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn VenueStore>, images: Arc<dyn ImageProvider>, config: &Config) -> Self {
        Self {
            store,
            images,
            admin_token: config.admin_token.clone(),
            max_venue_images: config.max_venue_images,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/venues/:category", get(venues::list))
        .route("/venues/:category/:id", get(venues::get))
        .route(
            "/venues/:category/:id/recommendations",
            get(venues::recommendations),
        )
        .route("/images/dedupe", post(tools::dedupe_images))
        .route("/recommendations/score", post(tools::score));

    let admin = Router::new()
        .route(
            "/venues/:category/recommendations",
            post(admin::rebuild_category_recommendations),
        )
        .route(
            "/venues/:category/:id/recommendations",
            post(admin::rebuild_venue_recommendations),
        )
        .route("/venues/:category/:id/images", post(admin::backfill_venue_images))
        .route("/staging", get(admin::list_staging).post(admin::create_staging))
        .route("/staging/duplicates", get(admin::staging_duplicates))
        .route("/staging/:id/approve", post(admin::approve_staging))
        .route("/staging/:id/reject", post(admin::reject_staging))
        .route("/staging/:id/requeue", post(admin::requeue_staging))
        .route("/staging/:id/publish", post(admin::publish_staging))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public)
        .nest("/admin", admin)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Parses a category path segment, accepting singular and plural forms
pub(crate) fn parse_category(raw: &str) -> AppResult<VenueCategory> {
    raw.parse().map_err(AppError::InvalidInput)
}

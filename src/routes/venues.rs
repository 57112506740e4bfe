use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_category, AppState};
use crate::{
    error::{AppError, AppResult},
    models::{RecommendationEdge, Venue, VenueKey},
};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
    #[serde(default)]
    offset: usize,
}

/// Published venues in a category, most popular first
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<Venue>>> {
    let category = parse_category(&category)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let venues = state
        .store
        .list_published(category, limit, params.offset)
        .await?;
    Ok(Json(venues))
}

/// A single published venue
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, Uuid)>,
) -> AppResult<Json<Venue>> {
    let key = VenueKey {
        category: parse_category(&category)?,
        id,
    };

    let venue = published_venue(&state, key).await?;
    Ok(Json(venue))
}

async fn published_venue(state: &AppState, key: VenueKey) -> AppResult<Venue> {
    state
        .store
        .get_venue(key)
        .await?
        .filter(Venue::is_published)
        .ok_or_else(|| AppError::NotFound(format!("Venue {}", key)))
}

/// Stored recommendations for a published venue, best first
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, Uuid)>,
) -> AppResult<Json<Vec<RecommendationEdge>>> {
    let key = VenueKey {
        category: parse_category(&category)?,
        id,
    };

    published_venue(&state, key).await?;
    let edges = state.store.list_recommendations(key).await?;
    Ok(Json(edges))
}

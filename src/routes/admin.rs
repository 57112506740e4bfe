use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_category, AppState};
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{StagingItem, StagingPayload, StagingStatus, Venue, VenueCategory, VenueKey},
    services::{
        images::{backfill_images, BackfillSummary},
        recommendations::{self, CategoryRebuildSummary, RebuildSummary},
        staging::{self, StagingDuplicate},
    },
};

/// Rebuilds recommendation edges for one venue
pub async fn rebuild_venue_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((category, id)): Path<(String, Uuid)>,
) -> AppResult<Json<RebuildSummary>> {
    let key = VenueKey {
        category: parse_category(&category)?,
        id,
    };
    tracing::info!(request_id = %request_id, venue = %key, "Rebuilding venue recommendations");

    let summary = recommendations::rebuild_recommendations(state.store.as_ref(), key).await?;
    Ok(Json(summary))
}

/// Rebuilds recommendation edges for every published venue in a category
pub async fn rebuild_category_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(category): Path<String>,
) -> AppResult<Json<CategoryRebuildSummary>> {
    let category = parse_category(&category)?;
    tracing::info!(request_id = %request_id, category = %category, "Rebuilding category recommendations");

    let summary = recommendations::rebuild_category(state.store.as_ref(), category).await?;
    Ok(Json(summary))
}

/// Tops up a venue's images from the stock-photo provider
pub async fn backfill_venue_images(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((category, id)): Path<(String, Uuid)>,
) -> AppResult<Json<BackfillSummary>> {
    let key = VenueKey {
        category: parse_category(&category)?,
        id,
    };
    tracing::info!(request_id = %request_id, venue = %key, "Backfilling venue images");

    let summary = backfill_images(
        state.store.as_ref(),
        state.images.as_ref(),
        key,
        state.max_venue_images,
    )
    .await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct StagingQuery {
    status: Option<String>,
}

/// Staging queue, optionally filtered by status
pub async fn list_staging(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StagingQuery>,
) -> AppResult<Json<Vec<StagingItem>>> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<StagingStatus>)
        .transpose()
        .map_err(AppError::InvalidInput)?;

    let items = state.store.list_staging(status).await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct CreateStagingRequest {
    pub category: VenueCategory,
    pub name: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub payload: StagingPayload,
}

/// Queues scraped content for review
pub async fn create_staging(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateStagingRequest>,
) -> AppResult<(StatusCode, Json<StagingItem>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Staging item name cannot be empty".to_string(),
        ));
    }

    let mut item = StagingItem::new(request.category, name, request.payload);
    item.district = request.district.filter(|d| !d.trim().is_empty());
    state.store.insert_staging(&item).await?;

    tracing::info!(staging_id = %item.id, category = %item.category, "Staging item queued");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Pending items that collide with existing venues or each other
pub async fn staging_duplicates(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<StagingDuplicate>>> {
    let duplicates = staging::find_duplicates(state.store.as_ref()).await?;
    Ok(Json(duplicates))
}

/// Optional body of the review actions; a bare POST is accepted
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

async fn review(
    state: &AppState,
    request_id: &RequestId,
    id: Uuid,
    next: StagingStatus,
    request: Option<Json<ReviewRequest>>,
) -> AppResult<Json<StagingItem>> {
    let notes = request.and_then(|Json(r)| r.notes);
    tracing::info!(request_id = %request_id, staging_id = %id, next = %next, "Reviewing staging item");
    let item = staging::review(state.store.as_ref(), id, next, notes).await?;
    Ok(Json(item))
}

pub async fn approve_staging(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    request: Option<Json<ReviewRequest>>,
) -> AppResult<Json<StagingItem>> {
    review(&state, &request_id, id, StagingStatus::Approved, request).await
}

pub async fn reject_staging(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    request: Option<Json<ReviewRequest>>,
) -> AppResult<Json<StagingItem>> {
    review(&state, &request_id, id, StagingStatus::Rejected, request).await
}

pub async fn requeue_staging(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    request: Option<Json<ReviewRequest>>,
) -> AppResult<Json<StagingItem>> {
    review(&state, &request_id, id, StagingStatus::Pending, request).await
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub item: StagingItem,
    pub venue: Venue,
}

/// Publishes an approved staging item as a venue
pub async fn publish_staging(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<PublishResponse>)> {
    tracing::info!(request_id = %request_id, staging_id = %id, "Publishing staging item");
    let (item, venue) = staging::publish(state.store.as_ref(), id).await?;
    Ok((StatusCode::CREATED, Json(PublishResponse { item, venue })))
}

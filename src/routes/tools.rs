use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    models::RelationKind,
    services::{
        image_dedup::deduplicate_image_values,
        scoring::{score_recommendation, ScoreInput},
    },
};

#[derive(Debug, Deserialize)]
pub struct DedupeRequest {
    /// Raw candidates; non-string entries are passed through
    pub urls: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct DedupeResponse {
    pub urls: Vec<Value>,
    pub removed: usize,
}

/// Deduplicates a list of candidate image URLs
pub async fn dedupe_images(Json(request): Json<DedupeRequest>) -> Json<DedupeResponse> {
    let urls = deduplicate_image_values(&request.urls);
    let removed = request.urls.len() - urls.len();
    Json(DedupeResponse { urls, removed })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    #[serde(default)]
    pub source: ScoreInput,
    #[serde(default)]
    pub target: ScoreInput,
    pub relation_kind: RelationKind,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: u8,
}

/// Scores a hypothetical recommendation without touching storage
pub async fn score(Json(request): Json<ScoreRequest>) -> Json<ScoreResponse> {
    let score = score_recommendation(&request.source, &request.target, request.relation_kind);
    Json(ScoreResponse { score })
}

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;

use crate::{
    db::{CandidateQuery, VenueStore},
    error::{AppError, AppResult},
    models::{RecommendationEdge, RelationKind, Venue, VenueCategory, VenueKey},
    services::{geo, scoring},
};

/// Same-district picks per other category
pub const SAME_DISTRICT_LIMIT: usize = 3;
/// Featured picks per other category
pub const POPULAR_LIMIT: usize = 2;
/// Picks per complementary category
pub const COMPLEMENTARY_LIMIT: usize = 1;

/// Venues loaded per page during a category rebuild
const CATEGORY_PAGE_SIZE: usize = 500;

/// A venue selected for recommendation and the strategy that found it
#[derive(Debug, Clone)]
pub struct Candidate {
    pub venue: Venue,
    pub relation_kind: RelationKind,
}

/// Result of rebuilding one venue's recommendations
#[derive(Debug, Clone, Serialize)]
pub struct RebuildSummary {
    pub source: VenueKey,
    pub edges_written: usize,
}

/// Result of rebuilding every published venue in a category
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryRebuildSummary {
    pub venues_processed: usize,
    pub edges_written: usize,
    pub failures: usize,
}

/// Finds recommendation candidates for `source`
///
/// Three strategies run in order and never pick the same venue twice:
/// 1. up to 3 published venues per other category in the same district;
/// 2. up to 2 featured venues per other category, any district;
/// 3. the single most popular venue in each complementary category.
pub async fn discover_candidates(store: &dyn VenueStore, source: &Venue) -> AppResult<Vec<Candidate>> {
    let mut selected: HashSet<VenueKey> = HashSet::from([source.key()]);
    let mut candidates = Vec::new();

    if let Some(district) = source.district.as_deref().filter(|d| !d.trim().is_empty()) {
        for category in source.category.others() {
            let query = CandidateQuery::new(category, SAME_DISTRICT_LIMIT).in_district(district);
            take_unselected(
                store,
                query,
                RelationKind::SameDistrict,
                &mut selected,
                &mut candidates,
            )
            .await?;
        }
    }

    for category in source.category.others() {
        let query = CandidateQuery::new(category, POPULAR_LIMIT).featured();
        take_unselected(
            store,
            query,
            RelationKind::Popular,
            &mut selected,
            &mut candidates,
        )
        .await?;
    }

    for &category in source.category.complements() {
        let query = CandidateQuery::new(category, COMPLEMENTARY_LIMIT);
        take_unselected(
            store,
            query,
            RelationKind::Complementary,
            &mut selected,
            &mut candidates,
        )
        .await?;
    }

    tracing::debug!(
        source = %source.key(),
        candidates = candidates.len(),
        "Recommendation candidates discovered"
    );

    Ok(candidates)
}

/// Runs `query` and appends up to `query.limit` venues not selected yet
///
/// The query is widened by the number of venues already selected in its
/// category so that skipped venues do not eat into the limit.
async fn take_unselected(
    store: &dyn VenueStore,
    mut query: CandidateQuery,
    relation_kind: RelationKind,
    selected: &mut HashSet<VenueKey>,
    out: &mut Vec<Candidate>,
) -> AppResult<()> {
    let wanted = query.limit;
    let already_selected = selected
        .iter()
        .filter(|key| key.category == query.category)
        .count();
    query.limit = wanted + already_selected;

    let mut taken = 0;
    for venue in store.find_candidates(&query).await? {
        if taken == wanted {
            break;
        }
        if selected.insert(venue.key()) {
            out.push(Candidate {
                venue,
                relation_kind,
            });
            taken += 1;
        }
    }

    Ok(())
}

/// Scores candidates and turns them into edges from `source`
pub fn build_edges(source: &Venue, candidates: &[Candidate]) -> Vec<RecommendationEdge> {
    let source_input = scoring::ScoreInput::from(source);
    let now = Utc::now();

    candidates
        .iter()
        .map(|candidate| {
            let target = &candidate.venue;
            let score = scoring::score_recommendation(
                &source_input,
                &scoring::ScoreInput::from(target),
                candidate.relation_kind,
            );
            let (distance_meters, walking_minutes) =
                geo::distance_and_walk(source.coordinates(), target.coordinates());

            RecommendationEdge {
                source_category: source.category,
                source_id: source.id,
                target_category: target.category,
                target_id: target.id,
                relation_kind: candidate.relation_kind,
                score,
                reason: reason_for(source, target, candidate.relation_kind),
                distance_meters,
                walking_minutes,
                created_at: now,
            }
        })
        .collect()
}

fn reason_for(source: &Venue, target: &Venue, kind: RelationKind) -> String {
    match kind {
        RelationKind::SameDistrict => match target.district.as_deref() {
            Some(district) => format!("Also in {}", district),
            None => "In the same neighbourhood".to_string(),
        },
        RelationKind::Popular => format!("Popular {} in Istanbul", target.category.label()),
        RelationKind::Complementary => {
            format!("Pairs well with your {}", visit_phrase(source.category))
        }
    }
}

fn visit_phrase(category: VenueCategory) -> &'static str {
    match category {
        VenueCategory::Hotel => "hotel stay",
        VenueCategory::Restaurant => "meal",
        VenueCategory::Activity => "day out",
        VenueCategory::Shopping => "shopping trip",
    }
}

/// Recomputes and replaces all recommendation edges of one venue
pub async fn rebuild_recommendations(
    store: &dyn VenueStore,
    key: VenueKey,
) -> AppResult<RebuildSummary> {
    let source = store
        .get_venue(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venue {}", key)))?;

    if !source.is_published() {
        tracing::warn!(venue = %key, status = ?source.status, "Rebuilding recommendations for unpublished venue");
    }

    let candidates = discover_candidates(store, &source).await?;
    let edges = build_edges(&source, &candidates);
    store.replace_recommendations(key, &edges).await?;

    tracing::info!(
        venue = %key,
        edges = edges.len(),
        "Recommendations rebuilt"
    );

    Ok(RebuildSummary {
        source: key,
        edges_written: edges.len(),
    })
}

/// Rebuilds recommendations for every published venue in a category
///
/// A failure on one venue is logged and the batch moves on.
pub async fn rebuild_category(
    store: &dyn VenueStore,
    category: VenueCategory,
) -> AppResult<CategoryRebuildSummary> {
    rebuild_category_paged(store, category, CATEGORY_PAGE_SIZE).await
}

async fn rebuild_category_paged(
    store: &dyn VenueStore,
    category: VenueCategory,
    page_size: usize,
) -> AppResult<CategoryRebuildSummary> {
    let mut summary = CategoryRebuildSummary::default();
    let mut offset = 0;

    tracing::info!(category = %category, "Starting category rebuild");

    // Rebuilding edges does not change popularity, so page order is stable
    loop {
        let page = store.list_published(category, page_size, offset).await?;
        let fetched = page.len();

        for venue in page {
            match rebuild_recommendations(store, venue.key()).await {
                Ok(result) => {
                    summary.venues_processed += 1;
                    summary.edges_written += result.edges_written;
                }
                Err(e) => {
                    tracing::error!(venue = %venue.key(), error = %e, "Recommendation rebuild failed");
                    summary.failures += 1;
                }
            }
        }

        if fetched < page_size {
            break;
        }
        offset += fetched;
        tracing::debug!(category = %category, offset, "Category rebuild page done");
    }

    tracing::info!(
        category = %category,
        processed = summary.venues_processed,
        edges = summary.edges_written,
        failures = summary.failures,
        "Category rebuild finished"
    );

    Ok(summary)
}

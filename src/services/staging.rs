use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::{
    db::VenueStore,
    error::{AppError, AppResult},
    models::{StagingItem, StagingStatus, Venue, VenueCategory, VenueStatus},
    services::image_dedup::deduplicate_image_urls,
};

/// Rating (out of 5) scraped for a venue is scaled to a 0-100 popularity
/// signal; review volume adds up to this much on top.
const REVIEW_VOLUME_CAP: f64 = 20.0;

/// Suffixes tried ("-2", "-3", ...) before giving up on a slug
const MAX_SLUG_SUFFIX: usize = 100;

/// A pending staging item that looks like something we already have
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StagingDuplicate {
    pub staging_id: Uuid,
    pub category: VenueCategory,
    pub name: String,
    /// Existing venue name or earlier staging item it collides with
    pub matches: String,
}

/// Lowercase alphanumerics only, so "Çiya Sofrası" and "ciya sofrasi!" collide
pub fn normalize_name(name: &str) -> String {
    crate::models::slugify(name).replace('-', "")
}

/// Popularity estimate for a freshly published venue
///
/// 80% from the rating, the rest from review volume on a log scale.
pub fn estimate_popularity(rating: Option<f64>, review_count: Option<u32>) -> Option<f64> {
    let rating = rating.filter(|r| r.is_finite())?;
    let from_rating = (rating.clamp(0.0, 5.0) / 5.0) * 80.0;
    let from_volume = review_count
        .map(|n| ((n as f64 + 1.0).log10() * 5.0).min(REVIEW_VOLUME_CAP))
        .unwrap_or(0.0);
    Some((from_rating + from_volume).min(100.0))
}

async fn load(store: &dyn VenueStore, id: Uuid) -> AppResult<StagingItem> {
    store
        .get_staging(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Staging item {}", id)))
}

/// Moves a staging item to `next`, storing reviewer notes when given
pub async fn review(
    store: &dyn VenueStore,
    id: Uuid,
    next: StagingStatus,
    notes: Option<String>,
) -> AppResult<StagingItem> {
    if next == StagingStatus::Published {
        return Err(AppError::InvalidInput(
            "Use the publish action to publish staging items".to_string(),
        ));
    }

    let mut item = load(store, id).await?;
    item.transition(next).map_err(AppError::InvalidInput)?;
    if notes.is_some() {
        item.review_notes = notes;
    }
    store.update_staging(&item).await?;

    tracing::info!(staging_id = %id, status = %item.status, "Staging item reviewed");
    Ok(item)
}

/// Builds the venue a staging item becomes when published
pub fn venue_from_staging(item: &StagingItem) -> Venue {
    let payload = &item.payload;
    let mut venue = Venue::new(item.category, item.name.trim());
    venue.description = payload.description.clone();
    venue.district = item.district.clone();
    venue.latitude = payload.latitude;
    venue.longitude = payload.longitude;
    venue.popularity_score = estimate_popularity(payload.rating, payload.review_count);
    venue.images = deduplicate_image_urls(&payload.images);
    venue.status = VenueStatus::Published;
    if venue.slug.is_empty() {
        venue.slug = venue.id.simple().to_string()[..8].to_string();
    }
    venue
}

/// First of `base`, `base-2`, `base-3`, ... not used in `category`
pub async fn unique_slug(
    store: &dyn VenueStore,
    category: VenueCategory,
    base: &str,
) -> AppResult<String> {
    if !store.slug_exists(category, base).await? {
        return Ok(base.to_string());
    }

    for suffix in 2..=MAX_SLUG_SUFFIX {
        let candidate = format!("{}-{}", base, suffix);
        if !store.slug_exists(category, &candidate).await? {
            return Ok(candidate);
        }
    }

    Err(AppError::Conflict(format!(
        "No free slug for {} in {}",
        base,
        category.label()
    )))
}

/// Publishes an approved staging item as a live venue
pub async fn publish(store: &dyn VenueStore, id: Uuid) -> AppResult<(StagingItem, Venue)> {
    let mut item = load(store, id).await?;
    if !item.status.can_transition_to(StagingStatus::Published) {
        return Err(AppError::InvalidInput(format!(
            "Staging item {} is {}; only approved items can be published",
            id, item.status
        )));
    }

    let mut venue = venue_from_staging(&item);
    venue.slug = unique_slug(store, venue.category, &venue.slug).await?;

    item.transition(StagingStatus::Published)
        .map_err(AppError::InvalidInput)?;
    item.published_venue_id = Some(venue.id);
    store.publish_staging(&item, &venue).await?;

    tracing::info!(
        staging_id = %id,
        venue = %venue.key(),
        images = venue.images.len(),
        "Staging item published"
    );

    Ok((item, venue))
}

/// Flags pending items whose name matches an existing venue or an earlier
/// pending item in the same category
pub async fn find_duplicates(store: &dyn VenueStore) -> AppResult<Vec<StagingDuplicate>> {
    let pending = store.list_staging(Some(StagingStatus::Pending)).await?;

    let categories: HashSet<VenueCategory> = pending.iter().map(|item| item.category).collect();
    let mut known: HashMap<(VenueCategory, String), String> = HashMap::new();
    for category in categories {
        for name in store.venue_names(category).await? {
            known
                .entry((category, normalize_name(&name)))
                .or_insert(name);
        }
    }

    let mut duplicates = Vec::new();
    for item in pending {
        let key = (item.category, normalize_name(&item.name));
        if key.1.is_empty() {
            continue;
        }
        match known.get(&key) {
            Some(existing) => duplicates.push(StagingDuplicate {
                staging_id: item.id,
                category: item.category,
                name: item.name.clone(),
                matches: existing.clone(),
            }),
            None => {
                known.insert(key, item.name.clone());
            }
        }
    }

    tracing::info!(duplicates = duplicates.len(), "Staging duplicate scan finished");
    Ok(duplicates)
}

use serde::Serialize;

use super::{ImageHit, ImageProvider};
use crate::{
    db::VenueStore,
    error::{AppError, AppResult},
    models::{Venue, VenueKey},
    services::image_dedup::ImageUrlSet,
};

/// How many hits to request per backfill, before ranking and dedup
const SEARCH_LIMIT: usize = 15;

/// Words too generic to count as a relevance match
const STOP_WORDS: &[&str] = &["the", "and", "istanbul", "turkey", "hotel", "restaurant", "cafe"];

#[derive(Debug, Clone, Serialize)]
pub struct BackfillSummary {
    pub venue: VenueKey,
    pub images_added: usize,
    pub total_images: usize,
}

/// Search phrase for a venue's photos
pub fn search_query(venue: &Venue) -> String {
    match venue.district.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(district) => format!("{} {} Istanbul", venue.name, district),
        None => format!("{} Istanbul", venue.name),
    }
}

fn keywords(venue: &Venue) -> Vec<String> {
    venue
        .name
        .split(|c: char| !c.is_alphanumeric())
        .chain(venue.district.as_deref().unwrap_or_default().split_whitespace())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 3 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Number of venue keywords that appear in the hit's description
pub fn relevance_score(hit: &ImageHit, keywords: &[String]) -> usize {
    let Some(description) = hit.description.as_deref() else {
        return 0;
    };
    let description = description.to_lowercase();
    keywords
        .iter()
        .filter(|k| description.contains(k.as_str()))
        .count()
}

/// Orders hits by keyword relevance, keeping provider order among ties
pub fn rank_hits(venue: &Venue, mut hits: Vec<ImageHit>) -> Vec<ImageHit> {
    let keywords = keywords(venue);
    hits.sort_by_key(|hit| std::cmp::Reverse(relevance_score(hit, &keywords)));
    hits
}

/// Tops up a venue's gallery with stock photos, up to `max_images`
///
/// Existing images keep their place at the front; new ones are ranked by
/// relevance and deduplicated against everything already stored.
pub async fn backfill_images(
    store: &dyn VenueStore,
    provider: &dyn ImageProvider,
    key: VenueKey,
    max_images: usize,
) -> AppResult<BackfillSummary> {
    let venue = store
        .get_venue(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venue {}", key)))?;

    let mut gallery = ImageUrlSet::new();
    for url in &venue.images {
        gallery.insert(url);
    }
    let existing = gallery.len();

    if existing >= max_images {
        tracing::debug!(venue = %key, images = existing, "Gallery already full, skipping backfill");
        return Ok(BackfillSummary {
            venue: key,
            images_added: 0,
            total_images: existing,
        });
    }

    let query = search_query(&venue);
    let hits = provider.search_images(&query, SEARCH_LIMIT).await?;
    let ranked = rank_hits(&venue, hits);

    for hit in ranked {
        if gallery.len() >= max_images {
            break;
        }
        gallery.insert(&hit.url);
    }

    let total = gallery.len();
    let added = total - existing;

    if added > 0 {
        store.update_images(key, &gallery.into_vec()).await?;
    }

    tracing::info!(
        venue = %key,
        provider = provider.name(),
        query = %query,
        added,
        total,
        "Image backfill completed"
    );

    Ok(BackfillSummary {
        venue: key,
        images_added: added,
        total_images: total,
    })
}

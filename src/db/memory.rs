use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{CandidateQuery, VenueStore};
use crate::{
    error::{AppError, AppResult},
    models::{RecommendationEdge, StagingItem, StagingStatus, Venue, VenueCategory, VenueKey},
};

/// Venue store kept entirely in process memory
#[derive(Clone, Default)]
pub struct InMemoryVenueStore {
    inner: Arc<RwLock<InMemoryInner>>,
}

#[derive(Default)]
struct InMemoryInner {
    venues: HashMap<VenueKey, Venue>,
    recommendations: HashMap<VenueKey, Vec<RecommendationEdge>>,
    staging: HashMap<Uuid, StagingItem>,
}

impl InMemoryVenueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with venues
    pub async fn with_venues(venues: impl IntoIterator<Item = Venue>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().await;
            for venue in venues {
                inner.venues.insert(venue.key(), venue);
            }
        }
        store
    }
}

impl InMemoryInner {
    fn slug_taken(&self, category: VenueCategory, slug: &str) -> bool {
        self.venues
            .values()
            .any(|v| v.category == category && v.slug == slug)
    }

    /// Same uniqueness rule as the `slug` column in Postgres
    fn insert_venue(&mut self, venue: &Venue) -> AppResult<()> {
        let key = venue.key();
        let clashes = self
            .venues
            .values()
            .any(|v| v.category == venue.category && v.slug == venue.slug && v.key() != key);
        if clashes {
            return Err(AppError::Conflict(format!(
                "Slug {} is already used in {}",
                venue.slug,
                venue.category.label()
            )));
        }
        self.venues.insert(key, venue.clone());
        Ok(())
    }
}

/// Highest popularity first, unknown popularity last, name as tie-breaker
fn by_popularity_desc(a: &Venue, b: &Venue) -> Ordering {
    match (a.popularity_score, b.popularity_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.name.cmp(&b.name))
}

#[async_trait::async_trait]
impl VenueStore for InMemoryVenueStore {
    async fn get_venue(&self, key: VenueKey) -> AppResult<Option<Venue>> {
        Ok(self.inner.read().await.venues.get(&key).cloned())
    }

    async fn list_published(
        &self,
        category: VenueCategory,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Venue>> {
        let inner = self.inner.read().await;
        let mut venues: Vec<Venue> = inner
            .venues
            .values()
            .filter(|v| v.category == category && v.is_published())
            .cloned()
            .collect();
        venues.sort_by(by_popularity_desc);
        Ok(venues.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<Venue>> {
        let inner = self.inner.read().await;
        let mut venues: Vec<Venue> = inner
            .venues
            .values()
            .filter(|v| v.category == query.category && v.is_published())
            .filter(|v| !query.featured_only || v.is_featured)
            .filter(|v| match &query.district {
                Some(district) => v.district.as_deref() == Some(district.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        venues.sort_by(by_popularity_desc);
        venues.truncate(query.limit);
        Ok(venues)
    }

    async fn insert_venue(&self, venue: &Venue) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.insert_venue(venue)
    }

    async fn slug_exists(&self, category: VenueCategory, slug: &str) -> AppResult<bool> {
        Ok(self.inner.read().await.slug_taken(category, slug))
    }

    async fn update_images(&self, key: VenueKey, images: &[String]) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let venue = inner
            .venues
            .get_mut(&key)
            .ok_or_else(|| AppError::NotFound(format!("Venue {}", key)))?;
        venue.images = images.to_vec();
        venue.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn list_recommendations(&self, source: VenueKey) -> AppResult<Vec<RecommendationEdge>> {
        let inner = self.inner.read().await;
        let mut edges = inner
            .recommendations
            .get(&source)
            .cloned()
            .unwrap_or_default();
        edges.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(edges)
    }

    async fn replace_recommendations(
        &self,
        source: VenueKey,
        edges: &[RecommendationEdge],
    ) -> AppResult<()> {
        self.inner
            .write()
            .await
            .recommendations
            .insert(source, edges.to_vec());
        Ok(())
    }

    async fn list_staging(&self, status: Option<StagingStatus>) -> AppResult<Vec<StagingItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<StagingItem> = inner
            .staging
            .values()
            .filter(|item| status.map_or(true, |s| item.status == s))
            .cloned()
            .collect();
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }

    async fn get_staging(&self, id: Uuid) -> AppResult<Option<StagingItem>> {
        Ok(self.inner.read().await.staging.get(&id).cloned())
    }

    async fn insert_staging(&self, item: &StagingItem) -> AppResult<()> {
        self.inner
            .write()
            .await
            .staging
            .insert(item.id, item.clone());
        Ok(())
    }

    async fn update_staging(&self, item: &StagingItem) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        match inner.staging.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Staging item {}", item.id))),
        }
    }

    async fn publish_staging(&self, item: &StagingItem, venue: &Venue) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let stored_status = inner
            .staging
            .get(&item.id)
            .map(|stored| stored.status)
            .ok_or_else(|| AppError::NotFound(format!("Staging item {}", item.id)))?;
        if stored_status != StagingStatus::Approved {
            return Err(AppError::Conflict(format!(
                "Staging item {} is {}, not approved",
                item.id, stored_status
            )));
        }

        inner.insert_venue(venue)?;
        inner.staging.insert(item.id, item.clone());
        Ok(())
    }

    async fn venue_names(&self, category: VenueCategory) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .venues
            .values()
            .filter(|v| v.category == category)
            .map(|v| v.name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VenueStatus;

    fn published(category: VenueCategory, name: &str, popularity: Option<f64>) -> Venue {
        let mut venue = Venue::new(category, name);
        venue.status = VenueStatus::Published;
        venue.popularity_score = popularity;
        venue
    }

    #[tokio::test]
    async fn test_candidates_sorted_by_popularity_with_unknown_last() {
        let store = InMemoryVenueStore::with_venues(vec![
            published(VenueCategory::Restaurant, "Unknown", None),
            published(VenueCategory::Restaurant, "Middling", Some(40.0)),
            published(VenueCategory::Restaurant, "Famous", Some(95.0)),
        ])
        .await;

        let found = store
            .find_candidates(&CandidateQuery::new(VenueCategory::Restaurant, 10))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Famous", "Middling", "Unknown"]);
    }

    #[tokio::test]
    async fn test_candidates_skip_drafts_and_respect_filters() {
        let mut draft = published(VenueCategory::Hotel, "Draft", Some(99.0));
        draft.status = VenueStatus::Draft;
        let mut featured = published(VenueCategory::Hotel, "Featured", Some(10.0));
        featured.is_featured = true;
        featured.district = Some("Beşiktaş".to_string());

        let store = InMemoryVenueStore::with_venues(vec![
            draft,
            featured,
            published(VenueCategory::Hotel, "Plain", Some(50.0)),
        ])
        .await;

        let featured_only = store
            .find_candidates(&CandidateQuery::new(VenueCategory::Hotel, 5).featured())
            .await
            .unwrap();
        assert_eq!(featured_only.len(), 1);
        assert_eq!(featured_only[0].name, "Featured");

        let in_district = store
            .find_candidates(&CandidateQuery::new(VenueCategory::Hotel, 5).in_district("Beşiktaş"))
            .await
            .unwrap();
        assert_eq!(in_district.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_slug_taken_in_same_category() {
        let store = InMemoryVenueStore::new();
        store
            .insert_venue(&Venue::new(VenueCategory::Restaurant, "Çiya Sofrası"))
            .await
            .unwrap();

        let clash = store
            .insert_venue(&Venue::new(VenueCategory::Restaurant, "Ciya Sofrasi"))
            .await;
        assert!(matches!(clash, Err(AppError::Conflict(_))));

        // Slugs are unique per table, so another category may reuse it
        store
            .insert_venue(&Venue::new(VenueCategory::Shopping, "Ciya Sofrasi"))
            .await
            .unwrap();
        assert!(store
            .slug_exists(VenueCategory::Restaurant, "ciya-sofrasi")
            .await
            .unwrap());
        assert!(!store
            .slug_exists(VenueCategory::Hotel, "ciya-sofrasi")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_published_pages() {
        let store = InMemoryVenueStore::with_venues(vec![
            published(VenueCategory::Activity, "A", Some(90.0)),
            published(VenueCategory::Activity, "B", Some(80.0)),
            published(VenueCategory::Activity, "C", Some(70.0)),
        ])
        .await;

        let page = store
            .list_published(VenueCategory::Activity, 2, 1)
            .await
            .unwrap();
        let names: Vec<_> = page.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);

        let past_end = store
            .list_published(VenueCategory::Activity, 2, 3)
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_update_images_on_missing_venue_fails() {
        let store = InMemoryVenueStore::new();
        let key = VenueKey {
            category: VenueCategory::Shopping,
            id: Uuid::new_v4(),
        };
        let result = store.update_images(key, &["x.jpg".to_string()]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

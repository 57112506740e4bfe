use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{RecommendationEdge, StagingItem, StagingStatus, Venue, VenueCategory, VenueKey},
};

/// Filter for recommendation candidates
///
/// Candidates are always published venues of a single category, ordered by
/// popularity (highest first, unknown last).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    pub category: VenueCategory,
    /// Exact district match when set
    pub district: Option<String>,
    pub featured_only: bool,
    pub limit: usize,
}

impl CandidateQuery {
    pub fn new(category: VenueCategory, limit: usize) -> Self {
        Self {
            category,
            district: None,
            featured_only: false,
            limit,
        }
    }

    pub fn in_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    pub fn featured(mut self) -> Self {
        self.featured_only = true;
        self
    }
}

/// Persistence for venues, recommendation edges and the staging queue
///
/// The Postgres implementation backs the running service; the in-memory one
/// backs tests and local runs without a database.
#[async_trait::async_trait]
pub trait VenueStore: Send + Sync {
    async fn get_venue(&self, key: VenueKey) -> AppResult<Option<Venue>>;

    /// Published venues of a category, most popular first
    async fn list_published(
        &self,
        category: VenueCategory,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Venue>>;

    async fn find_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<Venue>>;

    /// Fails with `Conflict` when the slug is already used in the category
    async fn insert_venue(&self, venue: &Venue) -> AppResult<()>;

    async fn slug_exists(&self, category: VenueCategory, slug: &str) -> AppResult<bool>;

    async fn update_images(&self, key: VenueKey, images: &[String]) -> AppResult<()>;

    async fn list_recommendations(&self, source: VenueKey) -> AppResult<Vec<RecommendationEdge>>;

    /// Deletes every edge from `source` and inserts `edges` in their place
    async fn replace_recommendations(
        &self,
        source: VenueKey,
        edges: &[RecommendationEdge],
    ) -> AppResult<()>;

    async fn list_staging(&self, status: Option<StagingStatus>) -> AppResult<Vec<StagingItem>>;

    async fn get_staging(&self, id: Uuid) -> AppResult<Option<StagingItem>>;

    async fn insert_staging(&self, item: &StagingItem) -> AppResult<()>;

    /// Persists status, notes and published venue of an existing item
    async fn update_staging(&self, item: &StagingItem) -> AppResult<()>;

    /// Inserts `venue` and stores `item` (already moved to published) as one unit
    ///
    /// Fails with `Conflict`, changing nothing, when the stored item is no
    /// longer approved or the venue slug is taken.
    async fn publish_staging(&self, item: &StagingItem, venue: &Venue) -> AppResult<()>;

    /// Names of every venue in a category, used for staging duplicate checks
    async fn venue_names(&self, category: VenueCategory) -> AppResult<Vec<String>>;
}

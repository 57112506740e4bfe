//! Stock-photo lookup and venue image backfill
//!
//! Image sources sit behind [`ImageProvider`] so the backfill job does not
//! care which API answers. Unsplash is the only production provider.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub mod backfill;
pub mod unsplash;

pub use backfill::{backfill_images, BackfillSummary};
pub use unsplash::UnsplashProvider;

/// One image returned by a provider search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHit {
    pub url: String,
    /// Alt text or caption, used for relevance ranking
    pub description: Option<String>,
}

impl ImageHit {
    pub fn new(url: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            url: url.into(),
            description: description.map(str::to_string),
        }
    }
}

/// Trait for stock-photo providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    /// Searches for up to `limit` images matching `query`
    async fn search_images(&self, query: &str, limit: usize) -> AppResult<Vec<ImageHit>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

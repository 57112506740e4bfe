//! Unsplash photo search provider
//!
//! API Flow:
//! 1. Search: /search/photos?query=...&per_page=N → photos with size variants
//! 2. The `regular` (1080px wide) variant is used for venue galleries
//!
//! Results are cached in Redis for a day; Unsplash demo keys allow only
//! 50 requests an hour.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use super::{ImageHit, ImageProvider};
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
};

const SEARCH_CACHE_TTL: u64 = 86_400; // 1 day

/// Unsplash caps `per_page` at 30
const MAX_PER_PAGE: usize = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    #[serde(default)]
    alt_description: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    #[serde(default)]
    regular: Option<String>,
    #[serde(default)]
    full: Option<String>,
    #[serde(default)]
    small: Option<String>,
}

impl UnsplashPhoto {
    /// Preferred size variant, falling back to whatever is present
    fn into_hit(self) -> Option<ImageHit> {
        let url = self.urls.regular.or(self.urls.full).or(self.urls.small)?;
        Some(ImageHit {
            url,
            description: self.alt_description.or(self.description),
        })
    }
}

fn parse_search_response(body: &str) -> AppResult<Vec<ImageHit>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ExternalApi(format!("Failed to parse Unsplash response: {}", e)))?;

    Ok(response
        .results
        .into_iter()
        .filter_map(UnsplashPhoto::into_hit)
        .collect())
}

#[derive(Clone)]
pub struct UnsplashProvider {
    http_client: HttpClient,
    access_key: String,
    api_url: String,
    cache: Cache,
}

impl UnsplashProvider {
    pub fn new(cache: Cache, access_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn fetch(&self, query: &str, limit: usize) -> AppResult<Vec<ImageHit>> {
        let url = format!("{}/search/photos", self.api_url);
        let per_page = limit.clamp(1, MAX_PER_PAGE).to_string();

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Unsplash API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let hits = parse_search_response(&body)?;

        tracing::info!(
            query = %query,
            results = hits.len(),
            provider = "unsplash",
            "Image search completed"
        );

        Ok(hits)
    }
}

#[async_trait::async_trait]
impl ImageProvider for UnsplashProvider {
    async fn search_images(&self, query: &str, limit: usize) -> AppResult<Vec<ImageHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Image search query cannot be empty".to_string(),
            ));
        }

        let key = CacheKey::ImageSearch {
            query: query.to_string(),
            limit,
        };

        cached!(self.cache, key, SEARCH_CACHE_TTL, self.fetch(query, limit))
    }

    fn name(&self) -> &'static str {
        "unsplash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefers_regular_size() {
        let body = r#"{
            "total": 2,
            "results": [
                {
                    "id": "abc",
                    "alt_description": "Galata tower at sunset",
                    "urls": {
                        "full": "https://images.unsplash.com/photo-1?q=100",
                        "regular": "https://images.unsplash.com/photo-1?w=1080",
                        "small": "https://images.unsplash.com/photo-1?w=400"
                    }
                },
                {
                    "id": "def",
                    "description": "Bosphorus ferry",
                    "urls": { "small": "https://images.unsplash.com/photo-2?w=400" }
                }
            ]
        }"#;

        let hits = parse_search_response(body).unwrap();
        assert_eq!(
            hits,
            vec![
                ImageHit::new(
                    "https://images.unsplash.com/photo-1?w=1080",
                    Some("Galata tower at sunset")
                ),
                ImageHit::new(
                    "https://images.unsplash.com/photo-2?w=400",
                    Some("Bosphorus ferry")
                ),
            ]
        );
    }

    #[test]
    fn test_parse_skips_photos_without_urls() {
        let body = r#"{"results": [{"urls": {}}]}"#;
        assert!(parse_search_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_missing_results_is_empty() {
        assert!(parse_search_response("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_is_external_api_error() {
        let result = parse_search_response("<html>rate limited</html>");
        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}

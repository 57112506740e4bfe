use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tokio_test::assert_ok;

use istanbul_guide_api::{
    create_router,
    db::{InMemoryVenueStore, VenueStore},
    error::AppResult,
    models::{Venue, VenueCategory, VenueStatus},
    services::images::{ImageHit, ImageProvider},
    AppState,
};

const ADMIN_TOKEN: &str = "test-admin-token";

struct StubImages {
    hits: Vec<ImageHit>,
}

#[async_trait::async_trait]
impl ImageProvider for StubImages {
    async fn search_images(&self, _query: &str, limit: usize) -> AppResult<Vec<ImageHit>> {
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn published(category: VenueCategory, name: &str, district: &str, popularity: f64) -> Venue {
    let mut venue = Venue::new(category, name);
    venue.status = VenueStatus::Published;
    venue.district = Some(district.to_string());
    venue.popularity_score = Some(popularity);
    venue
}

fn create_test_server(store: InMemoryVenueStore) -> TestServer {
    let images = StubImages {
        hits: vec![
            ImageHit::new("https://images.example.com/galata-1.jpg?w=1080", Some("Galata Tower")),
            ImageHit::new("https://images.example.com/galata_2.jpg", Some("Galata Tower")),
            ImageHit::new("https://images.example.com/karakoy.jpg", None),
        ],
    };

    let state = Arc::new(AppState {
        store: Arc::new(store),
        images: Arc::new(images),
        admin_token: ADMIN_TOKEN.to_string(),
        max_venue_images: 8,
    });

    TestServer::new(create_router(state)).unwrap()
}

fn admin_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", ADMIN_TOKEN)).unwrap(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(InMemoryVenueStore::new());
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let server = create_test_server(InMemoryVenueStore::new());

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-123"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-123");

    let response = server.get("/health").await;
    let generated = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_dedupe_endpoint() {
    let server = create_test_server(InMemoryVenueStore::new());

    let response = server
        .post("/api/v1/images/dedupe")
        .json(&json!({ "urls": ["a.jpg?x=1", "a.jpg?x=2", "b.jpg", 7, 7] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["urls"], json!(["a.jpg?x=1", "b.jpg", 7]));
    assert_eq!(body["removed"], 2);
}

#[tokio::test]
async fn test_score_endpoint() {
    let server = create_test_server(InMemoryVenueStore::new());

    let response = server
        .post("/api/v1/recommendations/score")
        .json(&json!({
            "source": { "popularityScore": 50 },
            "target": { "popularityScore": 0, "isFeatured": false },
            "relationKind": "popular"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["score"], 70);

    let response = server
        .post("/api/v1/recommendations/score")
        .json(&json!({ "relationKind": "same_district" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["score"], 65);
}

#[tokio::test]
async fn test_list_venues_accepts_plural_and_hides_drafts() {
    let mut draft = Venue::new(VenueCategory::Restaurant, "Secret Kitchen");
    draft.popularity_score = Some(100.0);
    let store = InMemoryVenueStore::with_venues(vec![
        published(VenueCategory::Restaurant, "Nicole", "Beyoğlu", 70.0),
        published(VenueCategory::Restaurant, "Mikla", "Beyoğlu", 90.0),
        draft.clone(),
    ])
    .await;
    let server = create_test_server(store);

    let response = server.get("/api/v1/venues/restaurants").await;
    response.assert_status_ok();
    let venues: Vec<Value> = response.json();
    let names: Vec<_> = venues.iter().map(|v| v["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Mikla", "Nicole"]);

    let response = server
        .get(&format!("/api/v1/venues/restaurant/{}", draft.id))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_category_is_bad_request() {
    let server = create_test_server(InMemoryVenueStore::new());
    let response = server.get("/api/v1/venues/museums").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("museums"));
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let server = create_test_server(InMemoryVenueStore::new());

    let response = server.get("/api/v1/admin/staging").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/v1/admin/staging")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("Bearer wrong"),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = admin_header();
    let response = server.get("/api/v1/admin/staging").add_header(name, value).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_rebuild_then_read_recommendations() {
    let hotel = published(VenueCategory::Hotel, "Pera Palace", "Beyoğlu", 85.0);
    let store = InMemoryVenueStore::with_venues(vec![
        hotel.clone(),
        published(VenueCategory::Restaurant, "Mikla", "Beyoğlu", 90.0),
        published(VenueCategory::Activity, "Galata Tower", "Beyoğlu", 95.0),
        published(VenueCategory::Shopping, "Grand Bazaar", "Fatih", 99.0),
    ])
    .await;
    let server = create_test_server(store);

    let (name, value) = admin_header();
    let response = server
        .post(&format!("/api/v1/admin/venues/hotel/{}/recommendations", hotel.id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["edges_written"], 2);

    let response = server
        .get(&format!("/api/v1/venues/hotels/{}/recommendations", hotel.id))
        .await;
    response.assert_status_ok();
    let edges: Vec<Value> = response.json();
    assert_eq!(edges.len(), 2);
    for edge in &edges {
        assert_eq!(edge["relation_kind"], "same_district");
        assert_eq!(edge["reason"], "Also in Beyoğlu");
        assert!(edge["score"].as_u64().unwrap() <= 100);
    }
}

#[tokio::test]
async fn test_backfill_images_endpoint() {
    let mut tower = published(VenueCategory::Activity, "Galata Tower", "Beyoğlu", 95.0);
    tower.images = vec!["https://cdn.example.com/tower.jpg".to_string()];
    let store = InMemoryVenueStore::with_venues(vec![tower.clone()]).await;
    let server = create_test_server(store.clone());

    let (name, value) = admin_header();
    let response = server
        .post(&format!("/api/v1/admin/venues/activity/{}/images", tower.id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["images_added"], 2);
    assert_eq!(summary["total_images"], 3);

    let stored = assert_ok!(store.get_venue(tower.key()).await).unwrap();
    assert_eq!(
        stored.images,
        vec![
            "https://cdn.example.com/tower.jpg",
            "https://images.example.com/galata-1.jpg?w=1080",
            "https://images.example.com/karakoy.jpg",
        ]
    );
}

#[tokio::test]
async fn test_staging_review_and_publish_flow() {
    let store = InMemoryVenueStore::new();
    let server = create_test_server(store.clone());

    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/staging")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "category": "restaurant",
            "name": "Karaköy Lokantası",
            "district": "Karaköy",
            "payload": {
                "description": "Turkish home cooking",
                "rating": 4.5,
                "review_count": 1200,
                "images": ["https://x.com/lokanta-1.jpg", "https://x.com/lokanta_2.jpg"],
                "unknown_field": true
            }
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let item: Value = response.json();
    let id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["status"], "pending");

    // Publishing before approval is refused
    let response = server
        .post(&format!("/api/v1/admin/staging/{}/publish", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post(&format!("/api/v1/admin/staging/{}/approve", id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "notes": "Verified address" }))
        .await;
    response.assert_status_ok();
    let item: Value = response.json();
    assert_eq!(item["status"], "approved");
    assert_eq!(item["review_notes"], "Verified address");

    let response = server
        .post(&format!("/api/v1/admin/staging/{}/publish", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::CREATED);
    let published: Value = response.json();
    assert_eq!(published["item"]["status"], "published");
    assert_eq!(published["venue"]["slug"], "karakoy-lokantasi");
    assert_eq!(published["venue"]["images"], json!(["https://x.com/lokanta-1.jpg"]));

    let venue_id = published["venue"]["id"].as_str().unwrap();
    let response = server
        .get(&format!("/api/v1/venues/restaurant/{}", venue_id))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/v1/admin/staging?status=published")
        .add_header(name, value)
        .await;
    let items: Vec<Value> = response.json();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_staging_duplicates_endpoint() {
    let store = InMemoryVenueStore::with_venues(vec![published(
        VenueCategory::Shopping,
        "Grand Bazaar",
        "Fatih",
        99.0,
    )])
    .await;
    let server = create_test_server(store);

    let (name, value) = admin_header();
    server
        .post("/api/v1/admin/staging")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "category": "shopping", "name": "grand bazaar" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get("/api/v1/admin/staging/duplicates")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let duplicates: Vec<Value> = response.json();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["matches"], "Grand Bazaar");
}

#[tokio::test]
async fn test_review_actions_accept_empty_body() {
    let server = create_test_server(InMemoryVenueStore::new());

    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/staging")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "category": "hotel", "name": "Ajia" }))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/v1/admin/staging/{}/reject", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "rejected");

    let response = server
        .post(&format!("/api/v1/admin/staging/{}/requeue", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();

    let response = server
        .post(&format!("/api/v1/admin/staging/{}/approve", id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let item: Value = response.json();
    assert_eq!(item["status"], "approved");
    assert!(item["review_notes"].is_null());
}

#[tokio::test]
async fn test_recommendations_of_unknown_or_draft_venue_are_not_found() {
    let draft = Venue::new(VenueCategory::Hotel, "Unfinished Hotel");
    let store = InMemoryVenueStore::with_venues(vec![draft.clone()]).await;
    let server = create_test_server(store);

    let response = server
        .get(&format!("/api/v1/venues/hotel/{}/recommendations", uuid::Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .get(&format!("/api/v1/venues/hotel/{}/recommendations", draft.id))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_publishing_a_colliding_name_gets_a_suffixed_slug() {
    let mut existing = published(VenueCategory::Restaurant, "Çiya Sofrası", "Kadıköy", 88.0);
    existing.slug = "ciya-sofrasi".to_string();
    let store = InMemoryVenueStore::with_venues(vec![existing]).await;
    let server = create_test_server(store);

    let (name, value) = admin_header();
    let response = server
        .post("/api/v1/admin/staging")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "category": "restaurant", "name": "Ciya Sofrasi", "district": "Kadıköy" }))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    server
        .post(&format!("/api/v1/admin/staging/{}/approve", id))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/v1/admin/staging/{}/publish", id))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::CREATED);
    let published: Value = response.json();
    assert_eq!(published["venue"]["slug"], "ciya-sofrasi-2");

    // Already published: a repeated publish is refused and creates nothing
    let response = server
        .post(&format!("/api/v1/admin/staging/{}/publish", id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let venues: Vec<Value> = server.get("/api/v1/venues/restaurants").await.json();
    assert_eq!(venues.len(), 2);
}

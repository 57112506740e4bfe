use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::Query,
    types::Json,
    FromRow, PgPool, Postgres,
};
use uuid::Uuid;

use super::store::{CandidateQuery, VenueStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        RecommendationEdge, StagingItem, StagingPayload, StagingStatus, Venue, VenueCategory,
        VenueKey,
    },
};

/// Creates a PostgreSQL connection pool and applies pending migrations
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

const VENUE_COLUMNS: &str = "id, name, slug, description, district, latitude, longitude, \
     popularity_score, is_featured, status, images, created_at, updated_at";

/// Row shape shared by all four venue tables
#[derive(Debug, FromRow)]
struct VenueRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    district: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    popularity_score: Option<f64>,
    is_featured: bool,
    status: String,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VenueRow {
    fn into_venue(self, category: VenueCategory) -> AppResult<Venue> {
        Ok(Venue {
            id: self.id,
            category,
            name: self.name,
            slug: self.slug,
            description: self.description,
            district: self.district,
            latitude: self.latitude,
            longitude: self.longitude,
            popularity_score: self.popularity_score,
            is_featured: self.is_featured,
            status: self.status.parse().map_err(AppError::Internal)?,
            images: self.images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecommendationRow {
    source_category: String,
    source_id: Uuid,
    target_category: String,
    target_id: Uuid,
    relation_kind: String,
    score: i16,
    reason: String,
    distance_meters: Option<i32>,
    walking_minutes: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecommendationRow> for RecommendationEdge {
    type Error = AppError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        Ok(RecommendationEdge {
            source_category: row.source_category.parse().map_err(AppError::Internal)?,
            source_id: row.source_id,
            target_category: row.target_category.parse().map_err(AppError::Internal)?,
            target_id: row.target_id,
            relation_kind: row.relation_kind.parse().map_err(AppError::Internal)?,
            score: row.score.clamp(0, 100) as u8,
            reason: row.reason,
            distance_meters: row.distance_meters.map(|d| d.max(0) as u32),
            walking_minutes: row.walking_minutes.map(|m| m.max(0) as u32),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StagingRow {
    id: Uuid,
    category: String,
    name: String,
    district: Option<String>,
    payload: Json<StagingPayload>,
    status: String,
    review_notes: Option<String>,
    published_venue_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StagingRow> for StagingItem {
    type Error = AppError;

    fn try_from(row: StagingRow) -> Result<Self, Self::Error> {
        Ok(StagingItem {
            id: row.id,
            category: row.category.parse().map_err(AppError::Internal)?,
            name: row.name,
            district: row.district,
            payload: row.payload.0,
            status: row.status.parse().map_err(AppError::Internal)?,
            review_notes: row.review_notes,
            published_venue_id: row.published_venue_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn insert_venue_sql(category: VenueCategory) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        category.table_name(),
        VENUE_COLUMNS
    )
}

fn bind_venue<'q>(
    query: Query<'q, Postgres, PgArguments>,
    venue: &'q Venue,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(venue.id)
        .bind(&venue.name)
        .bind(&venue.slug)
        .bind(&venue.description)
        .bind(&venue.district)
        .bind(venue.latitude)
        .bind(venue.longitude)
        .bind(venue.popularity_score)
        .bind(venue.is_featured)
        .bind(venue.status.as_str())
        .bind(&venue.images)
        .bind(venue.created_at)
        .bind(venue.updated_at)
}

/// Maps a violated `slug` unique constraint to `Conflict`
fn slug_conflict(error: sqlx::Error, venue: &Venue) -> AppError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
            "Slug {} is already used in {}",
            venue.slug,
            venue.category.label()
        )),
        other => AppError::Database(other),
    }
}

/// Venue store backed by PostgreSQL
///
/// Each category lives in its own table; table names come from
/// `VenueCategory::table_name`, never from user input.
#[derive(Clone)]
pub struct PgVenueStore {
    pool: PgPool,
}

impl PgVenueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VenueStore for PgVenueStore {
    async fn get_venue(&self, key: VenueKey) -> AppResult<Option<Venue>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            VENUE_COLUMNS,
            key.category.table_name()
        );
        let row: Option<VenueRow> = sqlx::query_as(&sql)
            .bind(key.id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_venue(key.category)).transpose()
    }

    async fn list_published(
        &self,
        category: VenueCategory,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Venue>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status = 'published' \
             ORDER BY popularity_score DESC NULLS LAST, name, id LIMIT $1 OFFSET $2",
            VENUE_COLUMNS,
            category.table_name()
        );
        let rows: Vec<VenueRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|r| r.into_venue(category)).collect()
    }

    async fn find_candidates(&self, query: &CandidateQuery) -> AppResult<Vec<Venue>> {
        let sql = format!(
            "SELECT {} FROM {} \
             WHERE status = 'published' \
               AND ($1::text IS NULL OR district = $1) \
               AND (NOT $2 OR is_featured) \
             ORDER BY popularity_score DESC NULLS LAST, name LIMIT $3",
            VENUE_COLUMNS,
            query.category.table_name()
        );
        let rows: Vec<VenueRow> = sqlx::query_as(&sql)
            .bind(query.district.as_deref())
            .bind(query.featured_only)
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|r| r.into_venue(query.category))
            .collect()
    }

    async fn insert_venue(&self, venue: &Venue) -> AppResult<()> {
        let sql = insert_venue_sql(venue.category);
        bind_venue(sqlx::query(&sql), venue)
            .execute(&self.pool)
            .await
            .map_err(|e| slug_conflict(e, venue))?;
        Ok(())
    }

    async fn slug_exists(&self, category: VenueCategory, slug: &str) -> AppResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE slug = $1)",
            category.table_name()
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn update_images(&self, key: VenueKey, images: &[String]) -> AppResult<()> {
        let sql = format!(
            "UPDATE {} SET images = $2, updated_at = now() WHERE id = $1",
            key.category.table_name()
        );
        let result = sqlx::query(&sql)
            .bind(key.id)
            .bind(images)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Venue {}", key)));
        }
        Ok(())
    }

    async fn list_recommendations(&self, source: VenueKey) -> AppResult<Vec<RecommendationEdge>> {
        let rows: Vec<RecommendationRow> = sqlx::query_as(
            r#"
            SELECT source_category, source_id, target_category, target_id, relation_kind,
                   score, reason, distance_meters, walking_minutes, created_at
            FROM venue_recommendations
            WHERE source_category = $1 AND source_id = $2
            ORDER BY score DESC
            "#,
        )
        .bind(source.category.as_str())
        .bind(source.id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RecommendationEdge::try_from).collect()
    }

    async fn replace_recommendations(
        &self,
        source: VenueKey,
        edges: &[RecommendationEdge],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM venue_recommendations WHERE source_category = $1 AND source_id = $2",
        )
        .bind(source.category.as_str())
        .bind(source.id)
        .execute(&mut *tx)
        .await?;

        for edge in edges {
            sqlx::query(
                r#"
                INSERT INTO venue_recommendations
                    (source_category, source_id, target_category, target_id, relation_kind,
                     score, reason, distance_meters, walking_minutes, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(edge.source_category.as_str())
            .bind(edge.source_id)
            .bind(edge.target_category.as_str())
            .bind(edge.target_id)
            .bind(edge.relation_kind.as_str())
            .bind(edge.score as i16)
            .bind(&edge.reason)
            .bind(edge.distance_meters.map(|d| d as i32))
            .bind(edge.walking_minutes.map(|m| m as i32))
            .bind(edge.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_staging(&self, status: Option<StagingStatus>) -> AppResult<Vec<StagingItem>> {
        let rows: Vec<StagingRow> = sqlx::query_as(
            r#"
            SELECT id, category, name, district, payload, status, review_notes,
                   published_venue_id, created_at, updated_at
            FROM staging_venues
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StagingItem::try_from).collect()
    }

    async fn get_staging(&self, id: Uuid) -> AppResult<Option<StagingItem>> {
        let row: Option<StagingRow> = sqlx::query_as(
            r#"
            SELECT id, category, name, district, payload, status, review_notes,
                   published_venue_id, created_at, updated_at
            FROM staging_venues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StagingItem::try_from).transpose()
    }

    async fn insert_staging(&self, item: &StagingItem) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO staging_venues
                (id, category, name, district, payload, status, review_notes,
                 published_venue_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(item.category.as_str())
        .bind(&item.name)
        .bind(&item.district)
        .bind(Json(&item.payload))
        .bind(item.status.as_str())
        .bind(&item.review_notes)
        .bind(item.published_venue_id)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_staging(&self, item: &StagingItem) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE staging_venues
            SET status = $2, review_notes = $3, published_venue_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(item.status.as_str())
        .bind(&item.review_notes)
        .bind(item.published_venue_id)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Staging item {}", item.id)));
        }
        Ok(())
    }

    async fn publish_staging(&self, item: &StagingItem, venue: &Venue) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row lock: a concurrent publish of the same item waits here, then
        // finds it no longer approved.
        let claimed = sqlx::query(
            r#"
            UPDATE staging_venues
            SET status = $2, review_notes = $3, published_venue_id = $4, updated_at = $5
            WHERE id = $1 AND status = 'approved'
            "#,
        )
        .bind(item.id)
        .bind(item.status.as_str())
        .bind(&item.review_notes)
        .bind(item.published_venue_id)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Staging item {} is not approved or no longer exists",
                item.id
            )));
        }

        let sql = insert_venue_sql(venue.category);
        bind_venue(sqlx::query(&sql), venue)
            .execute(&mut *tx)
            .await
            .map_err(|e| slug_conflict(e, venue))?;

        tx.commit().await?;
        Ok(())
    }

    async fn venue_names(&self, category: VenueCategory) -> AppResult<Vec<String>> {
        let sql = format!("SELECT name FROM {}", category.table_name());
        let names: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(names)
    }
}

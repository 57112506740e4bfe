use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::{VenueCategory, VenueKey};

/// Why a target venue is recommended alongside a source venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    SameDistrict,
    Popular,
    Complementary,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::SameDistrict => "same_district",
            RelationKind::Popular => "popular",
            RelationKind::Complementary => "complementary",
        }
    }
}

impl Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same_district" => Ok(RelationKind::SameDistrict),
            "popular" => Ok(RelationKind::Popular),
            "complementary" => Ok(RelationKind::Complementary),
            other => Err(format!("Unknown relation kind: {}", other)),
        }
    }
}

/// A scored recommendation from one venue to another
///
/// Edges are written once per rebuild and never updated in place; a rebuild
/// deletes the source's edges and inserts the new set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationEdge {
    pub source_category: VenueCategory,
    pub source_id: Uuid,
    pub target_category: VenueCategory,
    pub target_id: Uuid,
    pub relation_kind: RelationKind,
    /// Affinity in 0..=100
    pub score: u8,
    pub reason: String,
    /// Great-circle distance, when both venues have coordinates
    pub distance_meters: Option<u32>,
    pub walking_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl RecommendationEdge {
    pub fn source(&self) -> VenueKey {
        VenueKey {
            category: self.source_category,
            id: self.source_id,
        }
    }

    pub fn target(&self) -> VenueKey {
        VenueKey {
            category: self.target_category,
            id: self.target_id,
        }
    }
}

use serde::Deserialize;

use crate::models::{RelationKind, Venue};

const BASE_SCORE: f64 = 50.0;
const TARGET_POPULARITY_WEIGHT: f64 = 0.3;
const TARGET_POPULARITY_CAP: f64 = 30.0;
const SOURCE_POPULARITY_WEIGHT: f64 = 0.2;
const SOURCE_POPULARITY_CAP: f64 = 20.0;
const FEATURED_BONUS: f64 = 10.0;
const MAX_SCORE: f64 = 100.0;

/// The fields of a venue the scorer looks at
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreInput {
    pub popularity_score: Option<f64>,
    pub is_featured: bool,
}

impl From<&Venue> for ScoreInput {
    fn from(venue: &Venue) -> Self {
        Self {
            popularity_score: venue.popularity_score,
            is_featured: venue.is_featured,
        }
    }
}

impl ScoreInput {
    /// Popularity as a usable number; missing, negative or non-finite counts as zero
    fn popularity(&self) -> f64 {
        match self.popularity_score {
            Some(p) if p.is_finite() && p > 0.0 => p,
            _ => 0.0,
        }
    }
}

/// Flat bonus for each kind of relationship
///
/// Complementary pairings (a restaurant near a hotel) are the most actionable
/// cross-sell, so they weigh the most.
pub fn relation_bonus(kind: RelationKind) -> f64 {
    match kind {
        RelationKind::SameDistrict => 15.0,
        RelationKind::Popular => 10.0,
        RelationKind::Complementary => 20.0,
    }
}

/// Affinity score in 0..=100 for recommending `target` alongside `source`
///
/// ```text
/// 50
///   + min(target.popularity * 0.3, 30)
///   + min(source.popularity * 0.2, 20)
///   + relation bonus (15 / 10 / 20)
///   + 10 if the target is featured
/// ```
pub fn score_recommendation(source: &ScoreInput, target: &ScoreInput, kind: RelationKind) -> u8 {
    let mut score = BASE_SCORE;
    score += (target.popularity() * TARGET_POPULARITY_WEIGHT).min(TARGET_POPULARITY_CAP);
    score += (source.popularity() * SOURCE_POPULARITY_WEIGHT).min(SOURCE_POPULARITY_CAP);
    score += relation_bonus(kind);
    if target.is_featured {
        score += FEATURED_BONUS;
    }

    score.round().clamp(0.0, MAX_SCORE) as u8
}

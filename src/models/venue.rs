use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

/// The four kinds of point-of-interest the guide covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueCategory {
    Activity,
    Hotel,
    Restaurant,
    Shopping,
}

impl VenueCategory {
    pub const ALL: [VenueCategory; 4] = [
        VenueCategory::Activity,
        VenueCategory::Hotel,
        VenueCategory::Restaurant,
        VenueCategory::Shopping,
    ];

    /// Backing table for venues of this category
    pub fn table_name(self) -> &'static str {
        match self {
            VenueCategory::Activity => "activities",
            VenueCategory::Hotel => "hotels",
            VenueCategory::Restaurant => "restaurants",
            VenueCategory::Shopping => "shopping_venues",
        }
    }

    /// Categories that make a natural pairing with this one
    ///
    /// Used by the complementary recommendation strategy, e.g. a restaurant
    /// next to a hotel.
    pub fn complements(self) -> &'static [VenueCategory] {
        match self {
            VenueCategory::Hotel => &[VenueCategory::Restaurant, VenueCategory::Activity],
            VenueCategory::Restaurant => &[VenueCategory::Activity, VenueCategory::Shopping],
            VenueCategory::Activity => &[VenueCategory::Restaurant, VenueCategory::Shopping],
            VenueCategory::Shopping => &[VenueCategory::Restaurant, VenueCategory::Activity],
        }
    }

    /// Every category except this one, in declaration order
    pub fn others(self) -> impl Iterator<Item = VenueCategory> {
        Self::ALL.into_iter().filter(move |c| *c != self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VenueCategory::Activity => "activity",
            VenueCategory::Hotel => "hotel",
            VenueCategory::Restaurant => "restaurant",
            VenueCategory::Shopping => "shopping",
        }
    }

    /// Human-friendly plural used in recommendation reasons
    pub fn label(self) -> &'static str {
        match self {
            VenueCategory::Activity => "activities",
            VenueCategory::Hotel => "hotels",
            VenueCategory::Restaurant => "restaurants",
            VenueCategory::Shopping => "shops",
        }
    }
}

impl Display for VenueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VenueCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activity" | "activities" => Ok(VenueCategory::Activity),
            "hotel" | "hotels" => Ok(VenueCategory::Hotel),
            "restaurant" | "restaurants" => Ok(VenueCategory::Restaurant),
            "shopping" | "shop" | "shops" => Ok(VenueCategory::Shopping),
            other => Err(format!("Unknown venue category: {}", other)),
        }
    }
}

/// Publication state of a venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueStatus {
    Draft,
    Published,
    Archived,
}

impl VenueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VenueStatus::Draft => "draft",
            VenueStatus::Published => "published",
            VenueStatus::Archived => "archived",
        }
    }
}

impl FromStr for VenueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(VenueStatus::Draft),
            "published" | "active" => Ok(VenueStatus::Published),
            "archived" => Ok(VenueStatus::Archived),
            other => Err(format!("Unknown venue status: {}", other)),
        }
    }
}

/// A point of interest in one of the guide's categories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Venue {
    pub id: Uuid,
    pub category: VenueCategory,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Neighbourhood label, e.g. "Beyoğlu"
    pub district: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// 0-100 popularity signal from upstream heuristics
    pub popularity_score: Option<f64>,
    pub is_featured: bool,
    pub status: VenueStatus,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    /// Creates a draft venue with a slug derived from its name
    pub fn new(category: VenueCategory, name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category,
            slug: slugify(&name),
            name,
            description: None,
            district: None,
            latitude: None,
            longitude: None,
            popularity_score: None,
            is_featured: false,
            status: VenueStatus::Draft,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == VenueStatus::Published
    }

    /// Coordinates as a (lat, lon) pair when both are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// Key identifying this venue across categories
    pub fn key(&self) -> VenueKey {
        VenueKey {
            category: self.category,
            id: self.id,
        }
    }
}

/// Identifies a venue across all category tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueKey {
    pub category: VenueCategory,
    pub id: Uuid,
}

impl Display for VenueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.id)
    }
}

/// Builds a URL slug: lowercase ASCII alphanumerics separated by single hyphens
///
/// Turkish letters are folded to their closest ASCII form first.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars().flat_map(fold_turkish).flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn fold_turkish(ch: char) -> Option<char> {
    Some(match ch {
        'ç' | 'Ç' => 'c',
        'ğ' | 'Ğ' => 'g',
        'ı' | 'İ' => 'i',
        'ö' | 'Ö' => 'o',
        'ş' | 'Ş' => 's',
        'ü' | 'Ü' => 'u',
        other => other,
    })
}

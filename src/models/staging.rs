use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::VenueCategory;

/// Review state of a staged item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingStatus {
    Pending,
    Approved,
    Rejected,
    Published,
}

impl StagingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StagingStatus::Pending => "pending",
            StagingStatus::Approved => "approved",
            StagingStatus::Rejected => "rejected",
            StagingStatus::Published => "published",
        }
    }

    /// Whether a reviewer may move an item from `self` to `next`
    pub fn can_transition_to(self, next: StagingStatus) -> bool {
        matches!(
            (self, next),
            (StagingStatus::Pending, StagingStatus::Approved)
                | (StagingStatus::Pending, StagingStatus::Rejected)
                | (StagingStatus::Approved, StagingStatus::Published)
                | (StagingStatus::Approved, StagingStatus::Rejected)
                | (StagingStatus::Rejected, StagingStatus::Pending)
        )
    }
}

impl Display for StagingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StagingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StagingStatus::Pending),
            "approved" => Ok(StagingStatus::Approved),
            "rejected" => Ok(StagingStatus::Rejected),
            "published" => Ok(StagingStatus::Published),
            other => Err(format!("Unknown staging status: {}", other)),
        }
    }
}

/// Scraped or generated venue content awaiting review
///
/// Every field is optional; scrapers fill in what they find.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StagingPayload {
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub images: Vec<String>,
    pub source_url: Option<String>,
}

/// An entry in the staging queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StagingItem {
    pub id: Uuid,
    pub category: VenueCategory,
    pub name: String,
    pub district: Option<String>,
    pub payload: StagingPayload,
    pub status: StagingStatus,
    pub review_notes: Option<String>,
    pub published_venue_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StagingItem {
    /// Creates a pending staging item
    pub fn new(category: VenueCategory, name: impl Into<String>, payload: StagingPayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category,
            name: name.into(),
            district: None,
            payload,
            status: StagingStatus::Pending,
            review_notes: None,
            published_venue_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the item to `next`, rejecting transitions the workflow does not allow
    pub fn transition(&mut self, next: StagingStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Cannot move staging item from {} to {}",
                self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> StagingItem {
        StagingItem::new(VenueCategory::Restaurant, "Karaköy Lokantası", StagingPayload::default())
    }

    #[test]
    fn test_pending_can_be_approved_then_published() {
        let mut item = item();
        item.transition(StagingStatus::Approved).unwrap();
        item.transition(StagingStatus::Published).unwrap();
        assert_eq!(item.status, StagingStatus::Published);
    }

    #[test]
    fn test_pending_cannot_be_published_directly() {
        let mut item = item();
        let err = item.transition(StagingStatus::Published).unwrap_err();
        assert!(err.contains("pending"));
        assert_eq!(item.status, StagingStatus::Pending);
    }

    #[test]
    fn test_published_is_terminal() {
        for next in [
            StagingStatus::Pending,
            StagingStatus::Approved,
            StagingStatus::Rejected,
        ] {
            assert!(!StagingStatus::Published.can_transition_to(next));
        }
    }

    #[test]
    fn test_rejected_can_be_requeued() {
        let mut item = item();
        item.transition(StagingStatus::Rejected).unwrap();
        item.transition(StagingStatus::Pending).unwrap();
        assert_eq!(item.status, StagingStatus::Pending);
    }

    #[test]
    fn test_payload_defaults_missing_fields() {
        let payload: StagingPayload =
            serde_json::from_str(r#"{"description": "Meyhane", "rating": 4.6}"#).unwrap();
        assert_eq!(payload.description.as_deref(), Some("Meyhane"));
        assert_eq!(payload.rating, Some(4.6));
        assert!(payload.images.is_empty());
        assert!(payload.source_url.is_none());
    }
}

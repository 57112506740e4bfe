pub mod recommendation;
pub mod staging;
pub mod venue;

pub use recommendation::{RecommendationEdge, RelationKind};
pub use staging::{StagingItem, StagingPayload, StagingStatus};
pub use venue::{slugify, Venue, VenueCategory, VenueKey, VenueStatus};

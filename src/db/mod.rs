pub mod memory;
pub mod postgres;
pub mod redis;
pub mod store;

pub use memory::InMemoryVenueStore;
pub use postgres::{create_pool, PgVenueStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use store::{CandidateQuery, VenueStore};

pub mod geo;
pub mod image_dedup;
pub mod images;
pub mod recommendations;
pub mod scoring;
pub mod staging;

pub use image_dedup::{deduplicate_image_urls, deduplicate_image_values};
pub use scoring::{score_recommendation, ScoreInput};

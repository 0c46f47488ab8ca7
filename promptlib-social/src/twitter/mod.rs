//! Twitter/X ingestion surface.
//!
//! Submodules provide the Apify actor client, the post normalizer that
//! reconciles nested and flattened scraper layouts, video detection, and the
//! typed post model.
pub mod client;
pub mod media;
pub mod normalize;
pub mod types;

pub use client::{ApifyScraper, SearchWindow, search_window};
pub use media::{has_video, video_thumbnail};
pub use normalize::normalize;
pub use types::{Author, MediaObject, MediaRef, NormalizedPost, RawPost};

//! Social network ingestion for the prompt library.
//!
//! Only the Twitter/X pipeline exists: posts arrive through an Apify scraping
//! actor, are normalized into one canonical shape, and are checked for video.
pub mod twitter;

//! Core of the prompt library: turning scraped posts into a ranked,
//! deduplicated and classified collection of prompts.
//!
//! - [`extract`]: heuristic prompt matchers
//! - [`filters`]: admission checks run before a post becomes a record
//! - [`score`] and [`dedup`]: ranking and duplicate resolution
//! - [`merge`]: cumulative merge of raw scraper batches
//! - [`store`] and [`blacklist`]: on-disk state
//! - [`pipeline`] and [`classify`]: the extraction and classification stages
pub mod blacklist;
pub mod classify;
pub mod dedup;
pub mod extract;
pub mod filters;
pub mod merge;
pub mod pipeline;
pub mod score;
pub mod store;

pub use blacklist::Blacklist;
pub use classify::{ClassifyOptions, ClassifyStats, classify_library};
pub use dedup::{deduplicate, normalize_prompt_key};
pub use extract::PromptExtractor;
pub use filters::FilterChain;
pub use merge::merge_batches;
pub use pipeline::{ExtractStats, extract_library};
pub use score::engagement_score;
pub use store::{Library, LibraryStore, PromptRecord, write_json_atomic};

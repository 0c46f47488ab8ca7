//! Common types and utilities shared across promptlib crates.
//!
//! This crate defines the observability bootstrap and the shared error type
//! used throughout the promptlib workspace. It is intentionally lightweight
//! so that every crate, from the HTTP plumbing up to the CLI, can depend on it
//! without pulling in heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`PromptlibError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! Classifying an error at a stage boundary:
//!
//! ```rust
//! use promptlib_common::PromptlibError;
//!
//! let err = PromptlibError::Config("APIFY_TOKEN is not set".into());
//! assert!(err.is_fatal());
//! assert!(!PromptlibError::RateLimited.is_fatal());
//! ```
use std::path::PathBuf;

pub mod observability;

/// Error types used across the pipeline.
///
/// The variants mirror how a stage reacts: configuration problems stop the
/// stage, upstream and rate-limit problems abandon one unit of work, and a
/// missing input file ends the stage without failing the process.
#[derive(thiserror::Error, Debug)]
pub enum PromptlibError {
    /// A required setting or credential is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote collaborator (scraper, classifier) failed or answered with garbage.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The remote collaborator asked us to slow down.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// An input document the stage depends on does not exist yet.
    #[error("Missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PromptlibError {
    /// Whether the error should terminate the process with a non-zero status.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Convenient alias for results that use [`PromptlibError`].
pub type Result<T> = std::result::Result<T, PromptlibError>;

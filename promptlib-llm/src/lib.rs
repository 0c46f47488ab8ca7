//! LLM integration for the prompt library.
//!
//! This crate exposes the [`traits::LlmClient`] interface, the Gemini
//! implementation, and the batch classifier that turns a set of prompts into
//! tags, a quality score and a summary.
//!
//! # Examples
//! ```no_run
//! use promptlib_config::ClassifierConfig;
//! use promptlib_llm::{classifier_client, traits::LlmClient};
//!
//! # fn main() -> promptlib_common::Result<()> {
//! let cfg = ClassifierConfig {
//!     api_key: Some("test-key".into()),
//!     ..ClassifierConfig::default()
//! };
//! let client = classifier_client(&cfg)?;
//! assert_eq!(client.model_name(), "gemini-2.0-flash");
//! # Ok(())
//! # }
//! ```
pub mod classifier;
pub mod gemini;
pub mod traits;

use gemini::GeminiClient;
use promptlib_common::PromptlibError;
use promptlib_config::ClassifierConfig;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Build the classification client from configuration.
///
/// A missing API key is a configuration error; callers treat it as fatal.
pub fn classifier_client(cfg: &ClassifierConfig) -> promptlib_common::Result<GeminiClient> {
    let api_key = cfg.resolved_api_key().ok_or_else(|| {
        PromptlibError::Config("GEMINI_API_KEY is not set (classifier.api_key)".to_string())
    })?;
    let model = if cfg.model.trim().is_empty() {
        DEFAULT_GEMINI_MODEL.to_string()
    } else {
        cfg.model.clone()
    };
    Ok(GeminiClient::new(api_key, model)?.with_base_url(&cfg.base_url))
}

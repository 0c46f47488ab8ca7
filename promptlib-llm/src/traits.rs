use async_trait::async_trait;
use promptlib_common::Result;
use serde::{Deserialize, Serialize};

/// Text answer of one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// A text-generation backend used by the classifier.
///
/// Implementations map a quota refusal to
/// [`PromptlibError::RateLimited`](promptlib_common::PromptlibError::RateLimited)
/// and any other failure to `Upstream`, so batch loops can tell a pause from
/// a skipped batch.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    fn model_name(&self) -> &str;
}

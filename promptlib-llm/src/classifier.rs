//! Batch classification of prompts.
//!
//! One request carries up to a batch of prompts, each truncated and numbered
//! from 1. The model answers with a JSON array of `{id, tags, quality_score,
//! summary}` objects, sometimes wrapped in a Markdown code fence.

use crate::traits::LlmClient;
use promptlib_common::{PromptlibError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category labels offered to the model.
pub const TAXONOMY: &[&str] = &[
    "🎬 Film/Cinematic",
    "🎌 Anime",
    "📺 Ad/Commercial",
    "🎨 Art/Creative",
    "😂 Funny/Meme",
    "🌍 Realistic/Documentary",
    "🎮 Gaming",
    "🎵 Music/MV",
    "💡 Experimental",
    "🔥 Celebrity/IP",
    "🏷️ Other",
];

const TEMPERATURE: f32 = 0.3;
const MAX_OUTPUT_TOKENS: u32 = 4096;
const MAX_QUALITY: u8 = 5;

/// Classification for one prompt, addressed by its 1-based batch position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub id: usize,
    pub tags: Vec<String>,
    pub quality_score: u8,
    pub summary: String,
}

fn instruction() -> String {
    let categories = TAXONOMY
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You classify prompts written for the Seedance AI video generator.\n\n\
         For every prompt return:\n\
         1. tags: the 1-2 best matching categories from the list below\n\
         2. quality_score: 1-5 (5 = very detailed and professional, 1 = too simple)\n\
         3. summary: one sentence describing the video the prompt would produce\n\n\
         Categories:\n{categories}\n\n\
         Use \"🏷️ Other\" when nothing fits. Do not force a category.\n\n\
         Answer with a JSON array only, no other text:\n\
         [\n  {{\"id\": 1, \"tags\": [\"🎌 Anime\", \"😂 Funny/Meme\"], \"quality_score\": 3, \"summary\": \"SpongeBob and Patrick race Usain Bolt\"}}\n]"
    )
}

/// Full request text for one batch: the fixed instruction followed by the
/// numbered prompts, each cut to `max_chars` characters.
pub fn build_batch_prompt<S: AsRef<str>>(prompts: &[S], max_chars: usize) -> String {
    let list: String = prompts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let text: String = p.as_ref().chars().take(max_chars).collect();
            format!("{}. \"\"\"{}\"\"\"\n", i + 1, text)
        })
        .collect();
    format!(
        "{}\n\nClassify the following {} prompts:\n\n{}",
        instruction(),
        prompts.len(),
        list
    )
}

/// Remove a surrounding Markdown code fence, with or without a language label.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the opening fence line (it may carry a `json` label).
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.trim_start_matches("json"),
    };
    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

/// Parse the model's answer into classifications.
///
/// Entries without a usable positive `id` are dropped. `quality_score` is
/// accepted as an integer, float or numeric string and clamped to 0–5.
pub fn parse_classifications(text: &str) -> Result<Vec<Classification>> {
    let body = strip_code_fences(text);
    let entries: Vec<Value> = serde_json::from_str(body).map_err(|e| {
        PromptlibError::Upstream(format!("classification response is not a JSON array: {e}"))
    })?;

    Ok(entries.iter().filter_map(classification_from_value).collect())
}

fn classification_from_value(v: &Value) -> Option<Classification> {
    let obj = v.as_object()?;
    let id = obj.get("id").and_then(as_index)?;
    let tags = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let quality_score = obj.get("quality_score").map(quality).unwrap_or(0);
    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(Classification {
        id,
        tags,
        quality_score,
        summary,
    })
}

fn as_index(v: &Value) -> Option<usize> {
    match v {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|id| *id > 0)
}

fn quality(v: &Value) -> u8 {
    let raw = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    raw.clamp(0.0, f64::from(MAX_QUALITY)) as u8
}

/// Classify one batch of prompts with a single model call.
pub async fn classify_batch<S: AsRef<str>>(
    client: &dyn LlmClient,
    prompts: &[S],
    max_chars: usize,
) -> Result<Vec<Classification>> {
    let request = build_batch_prompt(prompts, max_chars);
    let response = client
        .generate(&request, None, Some(MAX_OUTPUT_TOKENS), Some(TEMPERATURE))
        .await?;
    let parsed = parse_classifications(&response.text)?;
    tracing::debug!(
        batch = prompts.len(),
        returned = parsed.len(),
        tokens = ?response.tokens_used,
        "classifier.batch.parsed"
    );
    Ok(parsed)
}

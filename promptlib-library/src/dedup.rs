//! Duplicate resolution by normalized prompt text.

use crate::store::PromptRecord;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid non-word regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const KEY_MAX_CHARS: usize = 100;

/// Grouping key: lowercase, trimmed, punctuation removed, whitespace runs
/// collapsed, first 100 characters.
///
/// ```
/// use promptlib_library::dedup::normalize_prompt_key;
///
/// assert_eq!(normalize_prompt_key("  A cat,  riding a SKATEBOARD! "), "a cat riding a skateboard");
/// ```
pub fn normalize_prompt_key(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    let stripped = NON_WORD.replace_all(lower.trim(), "");
    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .chars()
        .take(KEY_MAX_CHARS)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub kept: Vec<PromptRecord>,
    pub discarded: usize,
}

/// Keep the highest-scoring record per key (the earliest on ties), ordered
/// by descending score with first-occurrence order between equal scores.
pub fn deduplicate(records: Vec<PromptRecord>) -> DedupOutcome {
    let total = records.len();
    let mut slot_by_key: HashMap<String, usize> = HashMap::with_capacity(total);
    let mut kept: Vec<PromptRecord> = Vec::with_capacity(total);

    for record in records {
        let key = normalize_prompt_key(&record.prompt);
        match slot_by_key.get(&key) {
            Some(&slot) => {
                if record.engagement_score > kept[slot].engagement_score {
                    kept[slot] = record;
                }
            }
            None => {
                slot_by_key.insert(key, kept.len());
                kept.push(record);
            }
        }
    }

    kept.sort_by(|a, b| b.engagement_score.total_cmp(&a.engagement_score));
    let discarded = total - kept.len();
    DedupOutcome { kept, discarded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(prompt: &str, score: f64) -> PromptRecord {
        PromptRecord {
            prompt: prompt.to_string(),
            engagement_score: score,
            ..Default::default()
        }
    }

    #[test]
    fn higher_score_survives() {
        let out = deduplicate(vec![
            rec("a cat riding a skateboard", 10.0),
            rec("A cat riding a skateboard!", 50.0),
        ]);
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.kept[0].engagement_score, 50.0);
        assert_eq!(out.discarded, 1);
    }

    #[test]
    fn ties_keep_first_and_counts_add_up() {
        let input = vec![
            rec("first take", 5.0),
            rec("other prompt", 9.0),
            rec("First take.", 5.0),
            rec("third", 1.0),
        ];
        let n = input.len();
        let out = deduplicate(input);
        assert_eq!(out.kept.len() + out.discarded, n);
        let prompts: Vec<_> = out.kept.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["other prompt", "first take", "third"]);
    }

    #[test]
    fn idempotent() {
        let once = deduplicate(vec![
            rec("x y", 1.0),
            rec("X  Y", 3.0),
            rec("z", 2.0),
            rec("w", 2.0),
        ]);
        let twice = deduplicate(once.kept.clone());
        assert_eq!(twice.kept, once.kept);
        assert_eq!(twice.discarded, 0);
    }

    #[test]
    fn key_truncates_by_characters() {
        let long = "猫".repeat(150);
        assert_eq!(normalize_prompt_key(&long).chars().count(), 100);
        assert_eq!(normalize_prompt_key("\t"), "");
    }
}

//! Heuristic prompt extraction.
//!
//! Post bodies are free text in many languages. A prompt is recovered by an
//! ordered cascade of matchers; the first one that yields a result wins.
//! All length thresholds count Unicode scalar values.

use regex::Regex;
use std::sync::LazyLock;

static LABELED_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)prompt\s*(?:\(.*?\))?\s*[:：]\s*["'“”「『](.+?)["'“”」』]"#)
        .expect("valid labeled quoted regex")
});
static LABELED_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)prompt\s*(?:\(.*?\))?\s*[:：]\s*(.+?)(?:\n\n|https://|$)")
        .expect("valid labeled bare regex")
});
static LABELED_UPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)PROMPT\s*[:：]\s*["'](.+?)["']"#).expect("valid upper-case label regex")
});
static STRAIGHT_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]{15,})""#).expect("valid straight quote regex"));
static CURLY_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"“([^”]{15,})”").expect("valid curly quote regex"));
static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]+\}").expect("valid object span regex"));
static CJK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(【.+)").expect("valid bracket span regex"));
static TRAILING_HASHTAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*#\w+.*$").expect("valid hashtag regex"));
static SHORT_LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*https://t\.co/\S+").expect("valid short link regex"));

const QUOTE_CHARS: &[char] = &['"', '\'', '“', '”', '「', '」', '『', '』'];

const LABELED_MIN_CHARS: usize = 10;
const QUOTED_MIN_CHARS: usize = 15;
const OBJECT_MIN_CHARS: usize = 50;
const CJK_MIN_CHARS: usize = 20;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Drop trailing hashtags and `t.co` links, then surrounding whitespace.
fn strip_noise(s: &str) -> String {
    let s = TRAILING_HASHTAGS.replace(s, "");
    SHORT_LINKS.replace_all(&s, "").trim().to_string()
}

/// One heuristic in the cascade.
pub trait PromptMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// `text` is already pre-cleaned; `lower` is its lowercase form.
    fn find(&self, text: &str, lower: &str) -> Option<String>;
}

/// `Prompt: "…"`, `Prompt (v2)：…`, `PROMPT: '…'`.
pub struct LabeledField;

impl PromptMatcher for LabeledField {
    fn name(&self) -> &'static str {
        "labeled"
    }

    fn find(&self, text: &str, _lower: &str) -> Option<String> {
        [&*LABELED_QUOTED, &*LABELED_BARE, &*LABELED_UPPER]
            .into_iter()
            .filter_map(|re| re.captures(text))
            .filter_map(|caps| caps.get(1))
            .map(|m| {
                strip_noise(m.as_str())
                    .trim_matches(QUOTE_CHARS)
                    .trim()
                    .to_string()
            })
            .find(|p| char_len(p) > LABELED_MIN_CHARS)
    }
}

/// Longest quoted span in a post that names the tool.
pub struct ToolQuoted {
    tool_name: String,
}

impl ToolQuoted {
    pub fn new(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_lowercase(),
        }
    }
}

impl PromptMatcher for ToolQuoted {
    fn name(&self) -> &'static str {
        "tool-quoted"
    }

    fn find(&self, text: &str, lower: &str) -> Option<String> {
        if self.tool_name.is_empty() || !lower.contains(&self.tool_name) {
            return None;
        }
        let spans = |re: &Regex| -> Vec<&str> {
            re.captures_iter(text)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect()
        };
        let mut quoted = spans(&STRAIGHT_QUOTED);
        if quoted.is_empty() {
            quoted = spans(&CURLY_QUOTED);
        }

        // First span wins ties.
        let longest = quoted.into_iter().fold(None::<&str>, |best, s| match best {
            Some(b) if char_len(b) >= char_len(s) => Some(b),
            _ => Some(s),
        })?;
        (char_len(longest) > QUOTED_MIN_CHARS).then(|| longest.trim().to_string())
    }
}

/// A structured JSON-ish prompt (`{"title": …}`).
pub struct EmbeddedObject;

impl PromptMatcher for EmbeddedObject {
    fn name(&self) -> &'static str {
        "embedded-object"
    }

    fn find(&self, text: &str, lower: &str) -> Option<String> {
        if !text.contains('{') || !lower.contains("title") {
            return None;
        }
        let span = OBJECT_SPAN.find(text)?.as_str();
        (char_len(span) > OBJECT_MIN_CHARS).then(|| span.trim().to_string())
    }
}

/// Chinese structured prompts opened by `【`.
pub struct CjkBracket;

impl PromptMatcher for CjkBracket {
    fn name(&self) -> &'static str {
        "cjk-bracket"
    }

    fn find(&self, text: &str, lower: &str) -> Option<String> {
        if !text.contains('【') || !(lower.contains("prompt") || text.contains("文生视频")) {
            return None;
        }
        let span = CJK_SPAN.captures(text)?.get(1)?.as_str();
        let prompt = strip_noise(span);
        (char_len(&prompt) > CJK_MIN_CHARS).then_some(prompt)
    }
}

/// Ordered matcher cascade.
pub struct PromptExtractor {
    matchers: Vec<Box<dyn PromptMatcher>>,
}

impl PromptExtractor {
    pub fn new(tool_name: &str) -> Self {
        Self {
            matchers: vec![
                Box::new(LabeledField),
                Box::new(ToolQuoted::new(tool_name)),
                Box::new(EmbeddedObject),
                Box::new(CjkBracket),
            ],
        }
    }

    /// Recover the prompt from a post body, or `None` when no heuristic fires.
    ///
    /// ```
    /// use promptlib_library::extract::PromptExtractor;
    ///
    /// let ex = PromptExtractor::default();
    /// let got = ex.extract("Prompt: \"a cat riding a skateboard\" #fun https://t.co/abc");
    /// assert_eq!(got.as_deref(), Some("a cat riding a skateboard"));
    /// ```
    pub fn extract(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let cleaned = text.replace("\"\"", "\"");
        let lower = cleaned.to_lowercase();
        self.matchers.iter().find_map(|m| {
            let hit = m.find(&cleaned, &lower);
            if hit.is_some() {
                tracing::trace!(matcher = m.name(), "extract.matched");
            }
            hit
        })
    }
}

impl Default for PromptExtractor {
    fn default() -> Self {
        Self::new("seedance")
    }
}

//! Ordered, short-circuiting admission checks for posts.

use crate::blacklist::Blacklist;
use crate::extract::PromptExtractor;
use promptlib_config::ExtractionConfig;
use promptlib_social::twitter::{NormalizedPost, has_video};
use serde::Serialize;
use std::fmt;

/// Why a post was kept out of the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    AutomatedReply,
    NewsRepost,
    Blacklisted,
    NoVideo,
    NoPrompt,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::AutomatedReply => "automated reply",
            Rejection::NewsRepost => "news repost",
            Rejection::Blacklisted => "blacklisted",
            Rejection::NoVideo => "no video",
            Rejection::NoPrompt => "no prompt",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Post admitted, carrying the extracted prompt.
    Accepted(String),
    Rejected(Rejection),
}

pub struct FilterChain {
    bot_handle: String,
    news_indicators: Vec<String>,
    news_threshold: usize,
    extractor: PromptExtractor,
}

impl FilterChain {
    pub fn new(cfg: &ExtractionConfig) -> Self {
        Self {
            bot_handle: cfg.bot_handle.to_lowercase(),
            news_indicators: cfg.news_indicators.iter().map(|s| s.to_lowercase()).collect(),
            news_threshold: cfg.news_threshold,
            extractor: PromptExtractor::new(&cfg.tool_name),
        }
    }

    pub fn is_automated_reply(&self, post: &NormalizedPost) -> bool {
        !self.bot_handle.is_empty() && post.author.user_name.to_lowercase() == self.bot_handle
    }

    /// At least `news_threshold` boilerplate phrases, matched case-insensitively.
    pub fn is_news_repost(&self, text: &str) -> bool {
        if text.is_empty() || self.news_threshold == 0 {
            return false;
        }
        let lower = text.to_lowercase();
        let hits = self
            .news_indicators
            .iter()
            .filter(|ind| lower.contains(ind.as_str()))
            .count();
        hits >= self.news_threshold
    }

    /// Run every check in order; the first failure decides.
    pub fn evaluate(&self, post: &NormalizedPost, blacklist: &Blacklist) -> Verdict {
        if self.is_automated_reply(post) {
            return Verdict::Rejected(Rejection::AutomatedReply);
        }
        if self.is_news_repost(&post.text) {
            return Verdict::Rejected(Rejection::NewsRepost);
        }
        if blacklist.contains(&post.url) {
            return Verdict::Rejected(Rejection::Blacklisted);
        }
        if !has_video(post) {
            return Verdict::Rejected(Rejection::NoVideo);
        }
        match self.extractor.extract(&post.text) {
            Some(prompt) => Verdict::Accepted(prompt),
            None => Verdict::Rejected(Rejection::NoPrompt),
        }
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlib_social::twitter::{Author, MediaRef};

    const VIDEO: &str = "https://pbs.twimg.com/amplify_video_thumb/1/img/a.jpg";

    fn post(user: &str, text: &str, url: &str, video: bool) -> NormalizedPost {
        NormalizedPost {
            url: url.to_string(),
            text: text.to_string(),
            author: Author {
                user_name: user.to_string(),
                ..Default::default()
            },
            media: if video {
                vec![MediaRef::Link(VIDEO.to_string())]
            } else {
                vec![]
            },
            ..Default::default()
        }
    }

    #[test]
    fn bot_replies_are_rejected_case_insensitively() {
        let chain = FilterChain::default();
        let p = post("Grok", "Prompt: \"a cat riding a skateboard\"", "u", true);
        assert_eq!(
            chain.evaluate(&p, &Blacklist::default()),
            Verdict::Rejected(Rejection::AutomatedReply)
        );
    }

    #[test]
    fn one_news_phrase_is_not_a_repost() {
        let chain = FilterChain::default();
        assert!(!chain.is_news_repost("Chinese company ByteDance released a model"));
        assert!(chain.is_news_repost(
            "Chinese company ByteDance released a model. It is impossible to distinguish it."
        ));
    }

    #[test]
    fn order_is_blacklist_then_video_then_prompt() {
        let chain = FilterChain::default();
        let bl = Blacklist::parse("https://x.com/a/status/1");

        let blocked = post("alice", "no prompt, no video", "https://x.com/a/status/1", false);
        assert_eq!(chain.evaluate(&blocked, &bl), Verdict::Rejected(Rejection::Blacklisted));

        let no_video = post("alice", "Prompt: \"a cat riding a skateboard\"", "v", false);
        assert_eq!(chain.evaluate(&no_video, &bl), Verdict::Rejected(Rejection::NoVideo));

        let no_prompt = post("alice", "just vibes", "w", true);
        assert_eq!(chain.evaluate(&no_prompt, &bl), Verdict::Rejected(Rejection::NoPrompt));

        let ok = post("alice", "Prompt: \"a cat riding a skateboard\"", "x", true);
        assert_eq!(
            chain.evaluate(&ok, &bl),
            Verdict::Accepted("a cat riding a skateboard".to_string())
        );
    }
}

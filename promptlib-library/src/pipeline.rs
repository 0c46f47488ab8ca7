//! Extraction stage: merged posts in, ranked and deduplicated library out.

use crate::blacklist::Blacklist;
use crate::dedup::deduplicate;
use crate::filters::{FilterChain, Rejection, Verdict};
use crate::score::engagement_score;
use crate::store::{Library, LibraryMetadata, PromptRecord};
use chrono::{SecondsFormat, Utc};
use promptlib_social::twitter::{NormalizedPost, video_thumbnail};
use serde::Serialize;
use std::collections::HashMap;

const PREVIEW_CHARS: usize = 200;

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub total_posts: usize,
    pub automated_reply: usize,
    pub news_repost: usize,
    pub blacklisted: usize,
    pub no_video: usize,
    pub no_prompt: usize,
    pub matched: usize,
    pub duplicates_removed: usize,
    pub classifications_carried: usize,
    pub final_count: usize,
}

impl ExtractStats {
    fn reject(&mut self, why: Rejection) {
        match why {
            Rejection::AutomatedReply => self.automated_reply += 1,
            Rejection::NewsRepost => self.news_repost += 1,
            Rejection::Blacklisted => self.blacklisted += 1,
            Rejection::NoVideo => self.no_video += 1,
            Rejection::NoPrompt => self.no_prompt += 1,
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let mut s: String = text.chars().take(PREVIEW_CHARS).collect();
        s.push_str("...");
        s
    } else {
        text.to_string()
    }
}

/// Build the library record for an admitted post.
pub fn build_record(post: &NormalizedPost, prompt: String) -> PromptRecord {
    PromptRecord {
        prompt_length: prompt.chars().count(),
        prompt,
        tweet_url: post.url.clone(),
        author: post.author.user_name.clone(),
        author_name: post.author.name.clone(),
        author_followers: post.author.followers,
        created_at: post.created_at.clone(),
        lang: post.lang.clone(),
        likes: post.like_count,
        retweets: post.retweet_count,
        replies: post.reply_count,
        quotes: post.quote_count,
        bookmarks: post.bookmark_count,
        engagement_score: engagement_score(post),
        video_thumbnail: video_thumbnail(post),
        full_text_preview: preview(&post.text),
        ..Default::default()
    }
}

/// Copy tags, quality and summary from an earlier library by tweet URL, so
/// re-extraction does not send already classified prompts back to the model.
fn carry_classifications(records: &mut [PromptRecord], previous: &Library) -> usize {
    let classified: HashMap<&str, &PromptRecord> = previous
        .prompts
        .iter()
        .filter(|r| !r.is_pending() && !r.tweet_url.is_empty())
        .map(|r| (r.tweet_url.as_str(), r))
        .collect();

    let mut carried = 0;
    for record in records.iter_mut().filter(|r| r.is_pending()) {
        if let Some(old) = classified.get(record.tweet_url.as_str()) {
            record.tags = old.tags.clone();
            record.quality_score = old.quality_score;
            record.summary = old.summary.clone();
            carried += 1;
        }
    }
    carried
}

/// Filter, extract, score and deduplicate `posts` into a fresh library.
pub fn extract_library(
    posts: &[NormalizedPost],
    chain: &FilterChain,
    blacklist: &Blacklist,
    previous: Option<&Library>,
) -> (Library, ExtractStats) {
    let mut stats = ExtractStats {
        total_posts: posts.len(),
        ..Default::default()
    };

    let mut records = Vec::new();
    for post in posts {
        match chain.evaluate(post, blacklist) {
            Verdict::Accepted(prompt) => records.push(build_record(post, prompt)),
            Verdict::Rejected(why) => stats.reject(why),
        }
    }
    stats.matched = records.len();

    let outcome = deduplicate(records);
    stats.duplicates_removed = outcome.discarded;
    let mut prompts = outcome.kept;

    if let Some(prev) = previous {
        stats.classifications_carried = carry_classifications(&mut prompts, prev);
    }
    stats.final_count = prompts.len();

    tracing::info!(
        total = stats.total_posts,
        automated_reply = stats.automated_reply,
        news_repost = stats.news_repost,
        blacklisted = stats.blacklisted,
        no_video = stats.no_video,
        no_prompt = stats.no_prompt,
        matched = stats.matched,
        duplicates = stats.duplicates_removed,
        carried = stats.classifications_carried,
        kept = stats.final_count,
        "extract.done"
    );

    let library = Library {
        metadata: LibraryMetadata {
            total_tweets: posts.len(),
            prompts_extracted: prompts.len(),
            last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ..Default::default()
        },
        prompts,
    };
    (library, stats)
}

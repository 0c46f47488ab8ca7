//! Merge raw scraper batches into the cumulative post file.
//!
//! Identity is the post `id` (string or number), falling back to `url`.
//! Records already in the merged file win over later batches, and batches
//! are read in file-name order, so the first sighting of a post is kept.

use crate::store::read_json;
use chrono::{DateTime, FixedOffset};
use promptlib_common::Result;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub file: String,
    pub records: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Merged posts, newest first.
    pub posts: Vec<Value>,
    pub existing: usize,
    pub added: usize,
    pub batches: Vec<BatchSummary>,
}

/// Identity key of a raw post, if it has one.
pub fn post_identity(post: &Value) -> Option<String> {
    let key = |field: &str| match post.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    key("id").or_else(|| key("url"))
}

/// Parse `Tue Feb 10 22:25:40 +0000 2026` or RFC 3339.
pub fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

fn created_at(post: &Value) -> Option<DateTime<FixedOffset>> {
    post.get("createdAt")
        .and_then(Value::as_str)
        .and_then(parse_created_at)
}

/// Newest first; undated posts after every dated one, in their prior order.
pub fn sort_newest_first(posts: Vec<Value>) -> Vec<Value> {
    let mut keyed: Vec<(Option<DateTime<FixedOffset>>, Value)> =
        posts.into_iter().map(|p| (created_at(&p), p)).collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, p)| p).collect()
}

struct Merger {
    seen: HashSet<String>,
    posts: Vec<Value>,
}

impl Merger {
    /// Returns how many records were new.
    fn absorb(&mut self, batch: Vec<Value>) -> usize {
        let mut added = 0;
        for post in batch {
            let Some(id) = post_identity(&post) else {
                continue;
            };
            if self.seen.insert(id) {
                self.posts.push(post);
                added += 1;
            }
        }
        added
    }
}

/// Merge in memory: `existing` first, then each batch in order.
pub fn merge_posts(existing: Vec<Value>, batches: Vec<Vec<Value>>) -> Vec<Value> {
    let mut merger = Merger {
        seen: HashSet::new(),
        posts: Vec::new(),
    };
    merger.absorb(existing);
    for batch in batches {
        merger.absorb(batch);
    }
    sort_newest_first(merger.posts)
}

fn raw_batch_files(raw_dir: &Path) -> Result<Vec<PathBuf>> {
    if !raw_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(raw_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Load the merged file (if present) and every `raw_dir/*.json` batch.
///
/// Nothing is written; the caller persists [`MergeOutcome::posts`].
pub fn merge_batches(merged_path: &Path, raw_dir: &Path) -> Result<MergeOutcome> {
    let previous: Vec<Value> = if merged_path.exists() {
        read_json(merged_path)?
    } else {
        Vec::new()
    };

    let mut merger = Merger {
        seen: HashSet::new(),
        posts: Vec::new(),
    };
    let existing = merger.absorb(previous);
    tracing::info!(existing, "merge.loaded_existing");

    let mut batches = Vec::new();
    let mut added = 0;
    for file in raw_batch_files(raw_dir)? {
        let batch: Vec<Value> = read_json(&file)?;
        let records = batch.len();
        let new_here = merger.absorb(batch);
        added += new_here;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(file = %name, records, added = new_here, "merge.batch");
        batches.push(BatchSummary {
            file: name,
            records,
            added: new_here,
        });
    }

    let posts = sort_newest_first(merger.posts);
    tracing::info!(total = posts.len(), added, "merge.done");
    Ok(MergeOutcome {
        posts,
        existing,
        added,
        batches,
    })
}

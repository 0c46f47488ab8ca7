//! Post normalization.
//!
//! The scraper emits posts either with nested `author`/`media` values or with
//! flattened `author/<field>` and `media/<n>` keys (CSV exports). The layout
//! is picked per sub-structure by looking at its shape, so a post with a
//! nested author and flattened media still normalizes correctly.

use crate::twitter::types::{Author, MediaObject, MediaRef, NormalizedPost, RawPost};
use serde_json::{Map, Value};

const FLAT_MEDIA_SLOTS: usize = 4;

/// Reads author and media out of one key layout.
trait PostLayout {
    fn author(&self, raw: &RawPost) -> Author;
    fn media(&self, raw: &RawPost) -> Vec<MediaRef>;
}

struct Nested;
struct Flattened;

impl PostLayout for Nested {
    fn author(&self, raw: &RawPost) -> Author {
        let Some(obj) = raw.get("author").and_then(Value::as_object) else {
            return Author::default();
        };
        Author {
            user_name: string_field(obj.get("userName")).unwrap_or_default(),
            name: string_field(obj.get("name")).unwrap_or_default(),
            followers: count(obj.get("followers")),
            is_blue_verified: flag(obj.get("isBlueVerified")),
        }
    }

    fn media(&self, raw: &RawPost) -> Vec<MediaRef> {
        raw.get("media")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(media_ref).collect())
            .unwrap_or_default()
    }
}

impl PostLayout for Flattened {
    fn author(&self, raw: &RawPost) -> Author {
        Author {
            user_name: string_field(raw.get("author/userName")).unwrap_or_default(),
            name: string_field(raw.get("author/name")).unwrap_or_default(),
            followers: count(raw.get("author/followers")),
            is_blue_verified: flag(raw.get("author/isBlueVerified")),
        }
    }

    fn media(&self, raw: &RawPost) -> Vec<MediaRef> {
        (0..FLAT_MEDIA_SLOTS)
            .filter_map(|i| raw.get(&format!("media/{i}")))
            .filter_map(media_ref)
            .collect()
    }
}

fn author_layout(raw: &RawPost) -> &'static dyn PostLayout {
    if raw.get("author").is_some_and(Value::is_object) {
        &Nested
    } else {
        &Flattened
    }
}

fn media_layout(raw: &RawPost) -> &'static dyn PostLayout {
    if raw.get("media").is_some_and(Value::is_array) {
        &Nested
    } else {
        &Flattened
    }
}

/// Normalize a raw scraper record. Never fails; absent or malformed fields
/// fall back to their defaults.
///
/// ```
/// use promptlib_social::twitter::normalize;
/// use serde_json::json;
///
/// let raw = json!({"twitterUrl": "https://x.com/a/status/1", "fullText": "hi", "likeCount": "12"});
/// let post = normalize(raw.as_object().unwrap());
/// assert_eq!(post.id, "https://x.com/a/status/1");
/// assert_eq!(post.url, post.id);
/// assert_eq!(post.like_count, 12);
/// ```
pub fn normalize(raw: &RawPost) -> NormalizedPost {
    let twitter_url = string_field(raw.get("twitterUrl"));

    NormalizedPost {
        id: string_field(raw.get("id"))
            .or_else(|| twitter_url.clone())
            .unwrap_or_default(),
        url: string_field(raw.get("url"))
            .or(twitter_url)
            .unwrap_or_default(),
        text: string_field(raw.get("fullText"))
            .or_else(|| string_field(raw.get("text")))
            .unwrap_or_default(),
        created_at: string_field(raw.get("createdAt")).unwrap_or_default(),
        lang: string_field(raw.get("lang")).unwrap_or_default(),
        like_count: count(raw.get("likeCount")),
        retweet_count: count(raw.get("retweetCount")),
        reply_count: count(raw.get("replyCount")),
        quote_count: count(raw.get("quoteCount")),
        bookmark_count: count(raw.get("bookmarkCount")),
        is_quote: flag(raw.get("isQuote")),
        is_reply: flag(raw.get("isReply")),
        is_retweet: flag(raw.get("isRetweet")),
        author: author_layout(raw).author(raw),
        media: media_layout(raw).media(raw),
    }
}

/// Non-empty string value; numbers are stringified (ids often arrive as numbers).
fn string_field(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn flag(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        _ => false,
    }
}

fn media_ref(v: &Value) -> Option<MediaRef> {
    match v {
        Value::String(s) if !s.is_empty() => Some(MediaRef::Link(s.clone())),
        Value::Object(obj) if !obj.is_empty() => Some(MediaRef::Object(media_object(obj))),
        _ => None,
    }
}

fn media_object(obj: &Map<String, Value>) -> MediaObject {
    let mut extra = obj.clone();
    let mut take = |key: &str| match extra.get(key) {
        Some(Value::String(_)) => extra.remove(key).and_then(|v| v.as_str().map(str::to_string)),
        Some(Value::Null) => {
            extra.remove(key);
            None
        }
        _ => None,
    };
    let kind = take("type");
    let url = take("url");
    let thumbnail = take("thumbnail");
    MediaObject {
        kind,
        url,
        thumbnail,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> RawPost {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn nested_and_flattened_layouts_agree() {
        let nested = obj(json!({
            "id": "1890",
            "url": "https://x.com/alice/status/1890",
            "fullText": "Prompt: \"a cat riding a skateboard\"",
            "createdAt": "Tue Feb 10 22:25:40 +0000 2026",
            "lang": "en",
            "likeCount": 10,
            "retweetCount": 2,
            "isReply": false,
            "author": {"userName": "alice", "name": "Alice", "followers": 300, "isBlueVerified": true},
            "media": ["https://pbs.twimg.com/amplify_video_thumb/1/img/a.jpg"]
        }));
        let flat = obj(json!({
            "id": 1890,
            "url": "https://x.com/alice/status/1890",
            "text": "Prompt: \"a cat riding a skateboard\"",
            "createdAt": "Tue Feb 10 22:25:40 +0000 2026",
            "lang": "en",
            "likeCount": "10",
            "retweetCount": 2.0,
            "isReply": "false",
            "author/userName": "alice",
            "author/name": "Alice",
            "author/followers": "300",
            "author/isBlueVerified": "true",
            "media/0": "https://pbs.twimg.com/amplify_video_thumb/1/img/a.jpg",
            "media/1": ""
        }));
        assert_eq!(normalize(&nested), normalize(&flat));
    }

    #[test]
    fn normalized_output_is_a_fixed_point() {
        let raw = obj(json!({
            "twitterUrl": "https://x.com/bob/status/7",
            "text": "hello",
            "bookmarkCount": 3,
            "author": {"userName": "bob"},
            "media": [{"type": "video", "url": "https://video.twimg.com/v.mp4", "thumbnail": "https://t/x.jpg", "duration": 12}]
        }));
        let once = normalize(&raw);
        let serialized = serde_json::to_value(&once).unwrap();
        let twice = normalize(serialized.as_object().unwrap());
        assert_eq!(once, twice);
        assert_eq!(serialized["author"]["userName"], "bob");
        assert_eq!(serialized["media"][0]["duration"], 12);
    }

    #[test]
    fn malformed_fields_fall_back_to_defaults() {
        let raw = obj(json!({
            "id": null,
            "likeCount": "lots",
            "replyCount": -4,
            "isQuote": "maybe",
            "author": "not-an-object",
            "media": "not-a-list"
        }));
        let post = normalize(&raw);
        assert_eq!(post.id, "");
        assert_eq!(post.like_count, 0);
        assert_eq!(post.reply_count, 0);
        assert!(!post.is_quote);
        assert_eq!(post.author, Author::default());
        assert!(post.media.is_empty());
    }

    #[test]
    fn full_text_wins_over_text() {
        let post = normalize(&obj(json!({"fullText": "long form", "text": "short"})));
        assert_eq!(post.text, "long form");
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A scraped post exactly as the actor returned it. Key layout varies.
pub type RawPost = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    pub user_name: String,
    pub name: String,
    pub followers: u64,
    pub is_blue_verified: bool,
}

/// Structured media entry. Keys other than `type`, `url` and `thumbnail`
/// are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaObject {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Link(String),
    Object(MediaObject),
}

/// Canonical post, serialized in the nested camelCase layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedPost {
    pub id: String,
    pub url: String,
    pub text: String,
    pub created_at: String,
    pub lang: String,
    pub like_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub quote_count: u64,
    pub bookmark_count: u64,
    pub is_quote: bool,
    pub is_reply: bool,
    pub is_retweet: bool,
    pub author: Author,
    pub media: Vec<MediaRef>,
}

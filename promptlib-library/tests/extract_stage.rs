use promptlib_library::merge::merge_batches;
use promptlib_library::store::{Library, PromptRecord, write_json_atomic};
use promptlib_library::{Blacklist, FilterChain, extract_library, normalize_prompt_key};
use promptlib_social::twitter::normalize;
use serde_json::{Value, json};

const THUMB: &str = "https://pbs.twimg.com/amplify_video_thumb/1/img/a.jpg";

fn raw_posts() -> Vec<Value> {
    vec![
        json!({
            "id": "1", "url": "https://x.com/alice/status/1",
            "fullText": "Prompt: \"a cat riding a skateboard\" #fun https://t.co/abc",
            "likeCount": 10, "createdAt": "Tue Feb 10 22:25:40 +0000 2026",
            "author": {"userName": "alice", "name": "Alice", "followers": 5},
            "media": [THUMB]
        }),
        json!({
            "id": "2", "url": "https://x.com/bob/status/2",
            "text": "prompt: A cat riding a skateboard!!",
            "likeCount": 50,
            "author/userName": "bob",
            "media/0": THUMB
        }),
        json!({
            "id": "3", "url": "https://x.com/grok/status/3",
            "text": "Prompt: \"a generated reply from the bot\"",
            "author": {"userName": "grok"}, "media": [THUMB]
        }),
        json!({
            "id": "4", "url": "https://x.com/news/status/4",
            "text": "Chinese company ByteDance released Seedance. Someone tested the new version. Prompt: \"news copy of a prompt\"",
            "author": {"userName": "news"}, "media": [THUMB]
        }),
        json!({
            "id": "5", "url": "https://x.com/carol/status/5",
            "text": "Prompt: \"a photo only post without video\"",
            "author": {"userName": "carol"}, "media": ["https://pbs.twimg.com/media/p.jpg"]
        }),
        json!({
            "id": "6", "url": "https://x.com/dan/status/6",
            "text": "made this with seedance https://t.co/zzz",
            "author": {"userName": "dan"}
        }),
        json!({
            "id": "7", "url": "https://x.com/spam/status/7",
            "text": "Prompt: \"a blacklisted but valid prompt\"",
            "author": {"userName": "spam"}, "media": [THUMB]
        }),
    ]
}

fn normalized() -> Vec<promptlib_social::twitter::NormalizedPost> {
    raw_posts()
        .iter()
        .map(|v| normalize(v.as_object().unwrap()))
        .collect()
}

#[test]
fn extraction_counts_every_rejection_and_dedups() {
    let chain = FilterChain::default();
    let blacklist = Blacklist::parse("https://x.com/spam/status/7\n");
    let (library, stats) = extract_library(&normalized(), &chain, &blacklist, None);

    assert_eq!(stats.total_posts, 7);
    assert_eq!(stats.automated_reply, 1);
    assert_eq!(stats.news_repost, 1);
    assert_eq!(stats.blacklisted, 1);
    assert_eq!(stats.no_video, 1);
    assert_eq!(stats.no_prompt, 1);
    assert_eq!(stats.matched, 2);
    assert_eq!(stats.duplicates_removed, 1);
    assert_eq!(library.prompts.len(), 1);

    let winner = &library.prompts[0];
    assert_eq!(winner.author, "bob");
    assert_eq!(winner.engagement_score, 50.0);
    assert_eq!(winner.video_thumbnail, THUMB);
    assert_eq!(normalize_prompt_key(&winner.prompt), "a cat riding a skateboard");
    assert_eq!(library.metadata.total_tweets, 7);
    assert_eq!(library.metadata.prompts_extracted, 1);
    assert!(!library.metadata.last_updated.is_empty());
}

#[test]
fn previous_classifications_are_carried_by_url() {
    let previous = Library {
        prompts: vec![PromptRecord {
            prompt: "old wording".into(),
            tweet_url: "https://x.com/bob/status/2".into(),
            tags: vec!["😂 Funny/Meme".into()],
            quality_score: 3,
            summary: "A cat skates".into(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let (library, stats) = extract_library(
        &normalized(),
        &FilterChain::default(),
        &Blacklist::default(),
        Some(&previous),
    );
    assert_eq!(stats.classifications_carried, 1);
    let bob = library
        .prompts
        .iter()
        .find(|r| r.author == "bob")
        .expect("bob survives dedup");
    assert_eq!(bob.tags, vec!["😂 Funny/Meme".to_string()]);
    assert_eq!(bob.quality_score, 3);
}

#[test]
fn merge_reads_existing_then_batches_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    let merged = dir.path().join("all_tweets.json");
    let raw = dir.path().join("raw");

    write_json_atomic(
        &merged,
        &vec![json!({"id": "1", "text": "kept", "createdAt": "Mon Feb 09 10:00:00 +0000 2026"})],
    )
    .unwrap();
    write_json_atomic(
        &raw.join("2026-02-10.json"),
        &vec![
            json!({"id": "1", "text": "dropped"}),
            json!({"id": "2", "text": "later batch", "createdAt": "Wed Feb 11 08:00:00 +0000 2026"}),
        ],
    )
    .unwrap();
    write_json_atomic(
        &raw.join("2026-02-09.json"),
        &vec![json!({"id": "2", "text": "earlier batch"}), json!({"url": "https://x.com/u/status/9"})],
    )
    .unwrap();
    std::fs::write(raw.join("notes.txt"), "ignored").unwrap();

    let outcome = merge_batches(&merged, &raw).unwrap();
    assert_eq!(outcome.existing, 1);
    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.batches[0].file, "2026-02-09.json");

    let texts: Vec<_> = outcome.posts.iter().map(|p| p["text"].clone()).collect();
    assert_eq!(texts[0], json!("kept"));
    assert!(outcome.posts.iter().any(|p| p["text"] == "earlier batch"));
    assert!(!outcome.posts.iter().any(|p| p["text"] == "later batch"));

    // Persist and merge again with no new batches: nothing changes.
    write_json_atomic(&merged, &outcome.posts).unwrap();
    let empty_raw = dir.path().join("empty");
    let again = merge_batches(&merged, &empty_raw).unwrap();
    assert_eq!(again.posts, outcome.posts);
    assert_eq!(again.added, 0);
}

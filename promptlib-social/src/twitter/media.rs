use crate::twitter::types::{MediaRef, NormalizedPost};
use regex::Regex;
use std::sync::LazyLock;

const VIDEO_MARKERS: &[&str] = &["video_thumb", "amplify_video", "ext_tw_video"];

static SHORT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://t\.co/\w+").expect("valid short link regex"));

fn is_video_link(link: &str) -> bool {
    VIDEO_MARKERS.iter().any(|m| link.contains(m))
}

/// Whether the post carries a video.
///
/// Any `t.co` short link in the text also counts. The collection query is
/// already video-only, so this fallback is permissive on purpose.
pub fn has_video(post: &NormalizedPost) -> bool {
    let media_hit = post.media.iter().any(|m| match m {
        MediaRef::Link(link) => is_video_link(link),
        MediaRef::Object(obj) => {
            obj.kind.as_deref() == Some("video")
                || obj.url.as_deref().is_some_and(|u| u.contains("video"))
        }
    });
    media_hit || SHORT_LINK.is_match(&post.text)
}

/// Preview image for the post's video, or an empty string.
///
/// Scans media in order: a marked link is returned as is; the first
/// structured entry answers with its thumbnail, else its url.
pub fn video_thumbnail(post: &NormalizedPost) -> String {
    for m in &post.media {
        match m {
            MediaRef::Link(link) if is_video_link(link) => return link.clone(),
            MediaRef::Link(_) => continue,
            MediaRef::Object(obj) => {
                return obj
                    .thumbnail
                    .clone()
                    .or_else(|| obj.url.clone())
                    .unwrap_or_default();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::types::MediaObject;

    fn post_with(media: Vec<MediaRef>, text: &str) -> NormalizedPost {
        NormalizedPost {
            media,
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn marked_links_and_video_objects_count() {
        let link = post_with(
            vec![MediaRef::Link("https://pbs.twimg.com/ext_tw_video_thumb/9/pu/img/x.jpg".into())],
            "",
        );
        assert!(has_video(&link));

        let obj = post_with(
            vec![MediaRef::Object(MediaObject {
                kind: Some("video".into()),
                ..Default::default()
            })],
            "",
        );
        assert!(has_video(&obj));

        let untyped = post_with(
            vec![MediaRef::Object(MediaObject {
                url: Some("https://video.twimg.com/amplify/1/vid/720x1280/clip.mp4".into()),
                ..Default::default()
            })],
            "",
        );
        assert!(has_video(&untyped));

        let untyped_photo = post_with(
            vec![MediaRef::Object(MediaObject {
                url: Some("https://pbs.twimg.com/media/photo.jpg".into()),
                ..Default::default()
            })],
            "",
        );
        assert!(!has_video(&untyped_photo));

        let photo = post_with(
            vec![MediaRef::Link("https://pbs.twimg.com/media/photo.jpg".into())],
            "no links here",
        );
        assert!(!has_video(&photo));
    }

    #[test]
    fn short_link_in_text_is_enough() {
        let post = post_with(vec![], "look at this https://t.co/AbC123");
        assert!(has_video(&post));
    }

    #[test]
    fn thumbnail_prefers_marked_link_then_first_object() {
        let post = post_with(
            vec![
                MediaRef::Link("https://pbs.twimg.com/media/photo.jpg".into()),
                MediaRef::Object(MediaObject {
                    url: Some("https://video.twimg.com/a.mp4".into()),
                    ..Default::default()
                }),
                MediaRef::Link("https://pbs.twimg.com/amplify_video_thumb/2/img/b.jpg".into()),
            ],
            "",
        );
        assert_eq!(video_thumbnail(&post), "https://video.twimg.com/a.mp4");
        assert_eq!(video_thumbnail(&post_with(vec![], "")), "");
    }
}

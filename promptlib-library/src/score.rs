use promptlib_social::twitter::NormalizedPost;

/// Weighted popularity: `likes + 2·retweets + 0.5·replies + 1.5·quotes + bookmarks`.
///
/// The single ranking key for library order and duplicate resolution.
pub fn engagement_score(post: &NormalizedPost) -> f64 {
    post.like_count as f64
        + 2.0 * post.retweet_count as f64
        + 0.5 * post.reply_count as f64
        + 1.5 * post.quote_count as f64
        + post.bookmark_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_each_counter() {
        let post = NormalizedPost {
            like_count: 10,
            retweet_count: 3,
            reply_count: 5,
            quote_count: 2,
            bookmark_count: 4,
            ..Default::default()
        };
        assert_eq!(engagement_score(&post), 10.0 + 6.0 + 2.5 + 3.0 + 4.0);
        assert_eq!(engagement_score(&NormalizedPost::default()), 0.0);
    }
}

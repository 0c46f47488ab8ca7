//! Static renderings of the prompt library.
//!
//! - [`readme`]: Markdown summary for the repository front page
//! - [`gallery`]: self-contained HTML gallery with search and tag filter
//! - [`report`]: short daily text report
//!
//! Every renderer is a pure function of the library; callers drop
//! blacklisted records first with [`without_blacklisted`].

pub mod gallery;
pub mod readme;
pub mod report;

pub use gallery::render_gallery;
pub use readme::render_readme;
pub use report::render_report;

use promptlib_library::{Blacklist, Library};

/// Copy of `library` without records whose tweet URL is blacklisted.
pub fn without_blacklisted(library: &Library, blacklist: &Blacklist) -> Library {
    let mut visible = library.clone();
    visible.prompts.retain(|p| !blacklist.contains(&p.tweet_url));
    let hidden = library.prompts.len() - visible.prompts.len();
    if hidden > 0 {
        tracing::info!(hidden, remaining = visible.prompts.len(), "site.blacklist_filtered");
    }
    visible
}

/// Escape text for HTML element content and quoted attribute values.
pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Tally items, most frequent first; ties keep first-seen order.
pub(crate) fn ranked_counts<'a, I>(items: I) -> Vec<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: Vec<(&'a str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(k, _)| *k == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlib_library::PromptRecord;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn counts_rank_by_frequency_then_first_seen() {
        let ranked = ranked_counts(["ja", "en", "en", "zh", "ja", "ko"]);
        assert_eq!(ranked, vec![("ja", 2), ("en", 2), ("zh", 1), ("ko", 1)]);
    }

    #[test]
    fn blacklisted_records_are_hidden() {
        let lib = Library {
            prompts: vec![
                PromptRecord {
                    tweet_url: "https://x.com/a/status/1".into(),
                    ..Default::default()
                },
                PromptRecord {
                    tweet_url: "https://x.com/b/status/2".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let visible = without_blacklisted(&lib, &Blacklist::parse("https://x.com/a/status/1"));
        assert_eq!(visible.prompts.len(), 1);
        assert_eq!(visible.prompts[0].tweet_url, "https://x.com/b/status/2");
    }
}

use crate::ranked_counts;
use chrono::NaiveDate;
use promptlib_config::SiteConfig;
use promptlib_library::{Library, PromptRecord};
use std::fmt::Write;

const TOP_PROMPTS: usize = 10;
const TOP_LANGUAGES: usize = 5;
const EXCERPT_CHARS: usize = 300;

fn language_summary(prompts: &[PromptRecord]) -> String {
    let langs = prompts.iter().map(|p| {
        if p.lang.is_empty() {
            "unknown"
        } else {
            p.lang.as_str()
        }
    });
    ranked_counts(langs)
        .into_iter()
        .take(TOP_LANGUAGES)
        .map(|(lang, n)| format!("{lang}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_entry(out: &mut String, rank: usize, p: &PromptRecord) {
    let excerpt: String = p.prompt.chars().take(EXCERPT_CHARS).collect();
    let _ = writeln!(out, "### #{rank} ❤️ {} | {}", p.likes, p.tags.join(" "));
    if !p.summary.is_empty() {
        let _ = writeln!(out, "> {}\n", p.summary);
    }
    let _ = writeln!(out, "```\n{excerpt}\n```\n");
    if p.video_thumbnail.is_empty() {
        let _ = writeln!(out, "[View Tweet →]({})\n", p.tweet_url);
    } else {
        let _ = writeln!(out, "[![Video]({})]({})\n", p.video_thumbnail, p.tweet_url);
    }
    out.push_str("---\n\n");
}

/// Markdown front page: stats, tag histogram and the ten top-ranked prompts.
pub fn render_readme(library: &Library, site: &SiteConfig, today: NaiveDate) -> String {
    let prompts = &library.prompts;
    let total = prompts.len();
    let date = today.format("%Y-%m-%d").to_string();
    let mut out = String::new();

    let _ = writeln!(out, "# 🎬 {}\n", site.title);
    out.push_str(
        "> A curated collection of **Seedance AI video prompts** with real video results, collected from Twitter/X.\n\n",
    );
    let _ = writeln!(out, "[![Prompts](https://img.shields.io/badge/prompts-{total}-blue)]()");
    let _ = writeln!(out, "[![Last Updated](https://img.shields.io/badge/updated-{date}-green)]()\n");
    if !site.gallery_url.is_empty() {
        let _ = writeln!(out, "### 👉 [Browse the Interactive Gallery]({})\n", site.gallery_url);
    }

    out.push_str("## 📊 Stats\n\n| Metric | Value |\n|---|---|\n");
    let _ = writeln!(out, "| Total Prompts | **{total}** |");
    let _ = writeln!(out, "| Languages | {} |", language_summary(prompts));
    let _ = writeln!(out, "| Last Updated | {date} |\n");

    out.push_str("## 🏷️ Categories\n\n| Tag | Count |\n|---|---|\n");
    let tags = prompts.iter().flat_map(|p| p.tags.iter().map(String::as_str));
    for (tag, n) in ranked_counts(tags) {
        let _ = writeln!(out, "| {tag} | {n} |");
    }

    out.push_str("\n## 🔥 Top 10 Prompts\n\n");
    for (i, p) in prompts.iter().take(TOP_PROMPTS).enumerate() {
        write_entry(&mut out, i + 1, p);
    }

    out.push_str("## 📥 Data Files\n\n");
    out.push_str("- [`data/prompt_library.json`](data/prompt_library.json): full prompt library (JSON)\n");
    out.push_str("- [`data/all_tweets.json`](data/all_tweets.json): all collected posts\n\n");
    out.push_str("## 🤖 How It Works\n\n");
    out.push_str("1. **Collection**: posts mentioning \"Seedance prompt\" with video are collected through an Apify actor\n");
    out.push_str("2. **Extraction**: prompts are recovered from post text by pattern matching, then deduplicated\n");
    out.push_str("3. **Classification**: each prompt is tagged and scored by Gemini\n");
    out.push_str("4. **Publishing**: this README and the gallery are regenerated on every run\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(prompt: &str, likes: u64, lang: &str, tags: &[&str]) -> PromptRecord {
        PromptRecord {
            prompt: prompt.into(),
            likes,
            lang: lang.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            tweet_url: format!("https://x.com/u/status/{likes}"),
            ..Default::default()
        }
    }

    #[test]
    fn readme_has_stats_histogram_and_top_entries() {
        let mut prompts = vec![
            rec("first", 900, "en", &["🎌 Anime", "😂 Funny/Meme"]),
            rec("second", 500, "ja", &["🎌 Anime"]),
            rec("third", 100, "", &[]),
        ];
        prompts[0].summary = "A fox runs".into();
        prompts[1].video_thumbnail = "https://pbs.twimg.com/t.jpg".into();
        let lib = Library {
            prompts,
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2026, 2, 11).unwrap();
        let md = render_readme(&lib, &SiteConfig::default(), date);

        assert!(md.contains("| Total Prompts | **3** |"));
        assert!(md.contains("| Languages | en: 1, ja: 1, unknown: 1 |"));
        assert!(md.contains("| Last Updated | 2026-02-11 |"));
        assert!(md.contains("| 🎌 Anime | 2 |\n| 😂 Funny/Meme | 1 |"));
        assert!(md.contains("### #1 ❤️ 900 | 🎌 Anime 😂 Funny/Meme"));
        assert!(md.contains("> A fox runs"));
        assert!(md.contains("[![Video](https://pbs.twimg.com/t.jpg)](https://x.com/u/status/500)"));
        assert!(md.contains("[View Tweet →](https://x.com/u/status/100)"));
    }

    #[test]
    fn excerpt_is_capped_and_list_limited() {
        let prompts = (0..12)
            .map(|i| rec(&"p".repeat(400), 1000 - i, "en", &[]))
            .collect();
        let lib = Library {
            prompts,
            ..Default::default()
        };
        let md = render_readme(&lib, &SiteConfig::default(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(md.contains("### #10 "));
        assert!(!md.contains("### #11 "));
        assert!(md.contains(&"p".repeat(300)));
        assert!(!md.contains(&"p".repeat(301)));
    }
}

use chrono::{DateTime, Duration, Utc};
use promptlib_config::SiteConfig;
use promptlib_library::merge::parse_created_at;
use promptlib_library::{Library, PromptRecord};
use std::fmt::Write;

const RECENT_HOURS: i64 = 36;
const TOP_N: usize = 5;
const TAGS_SHOWN: usize = 2;

fn is_recent(record: &PromptRecord, cutoff: DateTime<Utc>) -> bool {
    parse_created_at(&record.created_at).is_some_and(|at| at.with_timezone(&Utc) > cutoff)
}

fn format_likes(likes: u64) -> String {
    if likes >= 1000 {
        format!("{:.1}k", likes as f64 / 1000.0)
    } else {
        likes.to_string()
    }
}

/// Short daily digest: totals, records from the last 36 hours, top five by likes.
pub fn render_report(library: &Library, site: &SiteConfig, now: DateTime<Utc>) -> String {
    let prompts = &library.prompts;
    let cutoff = now - Duration::hours(RECENT_HOURS);
    let recent = prompts.iter().filter(|p| is_recent(p, cutoff)).count();

    let mut top: Vec<&PromptRecord> = prompts.iter().collect();
    top.sort_by(|a, b| b.likes.cmp(&a.likes));
    top.truncate(TOP_N);

    let mut out = String::new();
    let _ = writeln!(out, "📢 **{} daily report** [{}]\n", site.title, now.format("%Y-%m-%d"));
    out.push_str("📊 **Library**\n");
    let _ = writeln!(out, "- Total prompts: {}", prompts.len());
    let _ = writeln!(out, "- New in the last {RECENT_HOURS}h: {recent}\n");

    let _ = writeln!(out, "🏆 **Top {TOP_N} (all time)**");
    for (i, p) in top.iter().enumerate() {
        let summary = if p.summary.is_empty() {
            "No summary"
        } else {
            p.summary.as_str()
        };
        let tags = p
            .tags
            .iter()
            .take(TAGS_SHOWN)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{}. **{summary}**", i + 1);
        let _ = writeln!(
            out,
            "   {tags} | ❤️ {} | [View]({})\n",
            format_likes(p.likes),
            p.tweet_url
        );
    }

    out.push_str("---\n");
    let _ = writeln!(out, "🌐 **Gallery**: {}", site.gallery_url);
    let _ = writeln!(out, "💻 **GitHub**: {}", site.repo_url);
    out
}

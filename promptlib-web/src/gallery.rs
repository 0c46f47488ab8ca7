//! Single-file HTML gallery.
//!
//! The library is embedded as a `<script type="application/json">` block and
//! rendered client side. `</` inside the JSON is written as `<\/` so prompt
//! text can never close the script element.

use crate::escape_html;
use promptlib_common::Result;
use promptlib_config::SiteConfig;
use promptlib_library::{Library, PromptRecord};
use std::collections::BTreeSet;

const STYLE: &str = r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { font-family: Inter, -apple-system, BlinkMacSystemFont, sans-serif; background: #0a0a0f; color: #e0e0e0; min-height: 100vh; }
    .header { background: linear-gradient(135deg, #1a1a2e 0%, #0f3460 100%); padding: 40px 24px 30px; text-align: center; }
    .header h1 { font-size: 2.2rem; font-weight: 700; color: #ff6b6b; margin-bottom: 8px; }
    .header p { color: #8899aa; font-size: 0.95rem; }
    .stats { display: flex; justify-content: center; gap: 30px; margin-top: 20px; flex-wrap: wrap; }
    .stat-num { font-size: 1.8rem; font-weight: 700; color: #e94560; }
    .stat-label { font-size: 0.75rem; color: #667788; text-transform: uppercase; letter-spacing: 1px; }
    .controls { padding: 20px 24px; max-width: 1400px; margin: 0 auto; display: flex; flex-wrap: wrap; gap: 12px; }
    .search-box { flex: 1; min-width: 250px; padding: 10px 16px; background: #1a1a2e; border: 1px solid #2a2a4e; border-radius: 10px; color: #e0e0e0; }
    .tags-bar { display: flex; flex-wrap: wrap; gap: 8px; }
    .tag-btn { padding: 6px 14px; border: 1px solid #2a2a4e; border-radius: 20px; background: transparent; color: #8899aa; cursor: pointer; }
    .tag-btn.active { background: #e94560; border-color: #e94560; color: #fff; }
    .counter { padding: 0 24px; max-width: 1400px; margin: 0 auto; font-size: 0.85rem; color: #556; }
    .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(360px, 1fr)); gap: 20px; padding: 20px 24px; max-width: 1400px; margin: 0 auto; }
    .card { background: #12121f; border: 1px solid #1e1e35; border-radius: 14px; overflow: hidden; }
    .card-thumb { width: 100%; height: 200px; object-fit: cover; display: block; background: #0d0d1a; }
    .card-thumb-placeholder { height: 200px; display: flex; align-items: center; justify-content: center; font-size: 2rem; background: #16213e; }
    .card-body { padding: 16px; }
    .card-tag { font-size: 0.7rem; padding: 3px 8px; margin-right: 6px; background: rgba(233,69,96,0.15); color: #e94560; border-radius: 10px; }
    .card-prompt { font-size: 0.88rem; line-height: 1.5; color: #ccc; margin: 10px 0 12px; white-space: pre-wrap; max-height: 8em; overflow: hidden; cursor: pointer; }
    .card-prompt.expanded { max-height: none; }
    .card-summary { font-size: 0.78rem; color: #889; margin-bottom: 10px; font-style: italic; }
    .card-meta { display: flex; justify-content: space-between; font-size: 0.75rem; color: #667; }
    .card-meta a, .tweet-link { color: #1da1f2; text-decoration: none; }
    .star { color: #ffd93d; font-size: 0.7rem; }
    .star.empty { color: #333; }
    .no-results { text-align: center; padding: 60px 24px; color: #556; }
    @media (max-width: 768px) { .grid { grid-template-columns: 1fr; } }
"#;

const SCRIPT: &str = r#"
const PROMPTS = JSON.parse(document.getElementById('data-prompts').textContent);
const tagsBar = document.getElementById('tagsBar');
let activeTag = 'all';
let query = '';

function esc(s) {
  const d = document.createElement('div');
  d.textContent = s == null ? '' : String(s);
  return d.innerHTML;
}

function fmt(n) {
  n = n || 0;
  return n >= 1000 ? (n / 1000).toFixed(1) + 'K' : String(n);
}

[...new Set(PROMPTS.flatMap(p => p.tags || []))].sort().forEach(tag => {
  const btn = document.createElement('button');
  btn.className = 'tag-btn';
  btn.dataset.tag = tag;
  btn.textContent = tag;
  tagsBar.appendChild(btn);
});

tagsBar.addEventListener('click', e => {
  if (!e.target.classList.contains('tag-btn')) return;
  tagsBar.querySelectorAll('.tag-btn').forEach(b => b.classList.remove('active'));
  e.target.classList.add('active');
  activeTag = e.target.dataset.tag;
  render();
});

document.getElementById('searchInput').addEventListener('input', e => {
  query = e.target.value.toLowerCase();
  render();
});

function card(p) {
  const tags = (p.tags || []).map(t => `<span class="card-tag">${esc(t)}</span>`).join('');
  const stars = Array.from({length: 5}, (_, i) =>
    `<span class="star ${i < (p.quality_score || 0) ? '' : 'empty'}">★</span>`).join('');
  const thumb = p.video_thumbnail
    ? `<a href="${esc(p.tweet_url)}" target="_blank"><img class="card-thumb" src="${esc(p.video_thumbnail)}" alt="Video thumbnail" loading="lazy"></a>`
    : '<div class="card-thumb-placeholder">🎬</div>';
  const summary = p.summary ? `<div class="card-summary">${esc(p.summary)}</div>` : '';
  return `<div class="card">${thumb}<div class="card-body">
    <div>${tags}${stars}</div>
    <div class="card-prompt" onclick="this.classList.toggle('expanded')">${esc(p.prompt)}</div>
    ${summary}
    <div class="card-meta">
      <span>❤️ ${fmt(p.likes)} 🔄 ${fmt(p.retweets)} 📖 ${fmt(p.bookmarks)}</span>
      <a href="https://x.com/${encodeURIComponent(p.author || '')}" target="_blank">@${esc(p.author)}</a>
    </div>
    <a class="tweet-link" href="${esc(p.tweet_url)}" target="_blank">View on X →</a>
  </div></div>`;
}

function render() {
  const shown = PROMPTS.filter(p => {
    const tagOk = activeTag === 'all' || (p.tags || []).includes(activeTag);
    const textOk = !query ||
      (p.prompt || '').toLowerCase().includes(query) ||
      (p.summary || '').toLowerCase().includes(query) ||
      (p.author || '').toLowerCase().includes(query);
    return tagOk && textOk;
  });
  document.getElementById('counter').textContent = `Showing ${shown.length} / ${PROMPTS.length} prompts`;
  document.getElementById('noResults').style.display = shown.length ? 'none' : 'block';
  document.getElementById('grid').innerHTML = shown.map(card).join('');
}

render();
"#;

/// Serialize for embedding inside a `<script>` element.
fn embed_json(prompts: &[PromptRecord]) -> Result<String> {
    Ok(serde_json::to_string(prompts)?.replace("</", "<\\/"))
}

/// Render the gallery page for `library`.
pub fn render_gallery(library: &Library, site: &SiteConfig) -> Result<String> {
    let categories: BTreeSet<&str> = library
        .prompts
        .iter()
        .flat_map(|p| p.tags.iter().map(String::as_str))
        .collect();
    let title = escape_html(&site.title);
    let data = embed_json(&library.prompts)?;

    let mut html = String::with_capacity(data.len() + STYLE.len() + SCRIPT.len() + 2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("  <title>{title}</title>\n  <style>{STYLE}  </style>\n</head>\n<body>\n"));
    html.push_str(&format!(
        r#"<div class="header">
  <h1>🎬 {title}</h1>
  <p>AI video prompt examples with real results, from Twitter/X</p>
  <div class="stats">
    <div class="stat"><div class="stat-num" id="totalCount">{total}</div><div class="stat-label">Prompts</div></div>
    <div class="stat"><div class="stat-num" id="tagCount">{tag_count}</div><div class="stat-label">Categories</div></div>
  </div>
</div>
<div class="controls">
  <input type="text" class="search-box" id="searchInput" placeholder="🔍 Search prompts...">
  <div class="tags-bar" id="tagsBar"><button class="tag-btn active" data-tag="all">All</button></div>
</div>
<div class="counter" id="counter"></div>
<div class="grid" id="grid"></div>
<div class="no-results" id="noResults" style="display:none">No prompts found matching your criteria</div>
"#,
        total = library.prompts.len(),
        tag_count = categories.len(),
    ));
    html.push_str("<script type=\"application/json\" id=\"data-prompts\">");
    html.push_str(&data);
    html.push_str("</script>\n<script>");
    html.push_str(SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    Ok(html)
}

//! Pipeline stages driven by the CLI.
//!
//! Each stage reads its inputs from the data directory, does one unit of
//! work and replaces its outputs with whole-file writes. Stages return the
//! shared error type; [`settle`] decides what a failure means for the process.

use std::path::Path;

use chrono::Utc;
use promptlib_common::{PromptlibError, Result};
use promptlib_config::PromptlibConfig;
use promptlib_library::store::read_json;
use promptlib_library::{
    Blacklist, ClassifyOptions, FilterChain, LibraryStore, classify_library, extract_library,
    merge_batches, write_json_atomic,
};
use promptlib_social::twitter::client::search_window_from_now;
use promptlib_social::twitter::{ApifyScraper, NormalizedPost, normalize};
use serde_json::Value;

/// How a stage failure affects the rest of the run.
///
/// A missing input or an upstream failure ends the stage only. Configuration
/// problems and local I/O or JSON errors stop the process.
pub fn settle(stage: &str, result: Result<()>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(PromptlibError::MissingInput(path)) => {
            tracing::warn!(stage, path = %path.display(), "stage.missing_input");
            eprintln!("{stage}: {} does not exist yet, skipping", path.display());
            Ok(())
        }
        Err(err @ (PromptlibError::Upstream(_) | PromptlibError::RateLimited)) => {
            tracing::warn!(stage, error = %err, "stage.abandoned");
            Ok(())
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!("{stage} stage failed"))),
    }
}

/// Scrape the recent window and store it as `raw/<since>.json`.
pub async fn fetch(cfg: &PromptlibConfig, days: u32, max_items: u32) -> Result<()> {
    let scraper = ApifyScraper::from_config(&cfg.scraper)?;
    let window = search_window_from_now(days);
    let posts = scraper
        .fetch_posts(&window, &cfg.scraper.search_term, max_items)
        .await?;

    let path = cfg.raw_dir().join(format!("{}.json", window.since));
    write_json_atomic(&path, &posts)?;
    tracing::info!(count = posts.len(), path = %path.display(), "fetch.saved");
    Ok(())
}

/// Fold every raw batch into `all_tweets.json`.
pub fn merge(cfg: &PromptlibConfig) -> Result<()> {
    let merged_path = cfg.all_tweets_path();
    let outcome = merge_batches(&merged_path, &cfg.raw_dir())?;
    write_json_atomic(&merged_path, &outcome.posts)?;
    tracing::info!(
        total = outcome.posts.len(),
        existing = outcome.existing,
        added = outcome.added,
        batches = outcome.batches.len(),
        "merge.saved"
    );
    Ok(())
}

fn load_posts(path: &Path) -> Result<Vec<NormalizedPost>> {
    let raw: Vec<Value> = read_json(path)?;
    let skipped = raw.iter().filter(|v| !v.is_object()).count();
    if skipped > 0 {
        tracing::warn!(skipped, "extract.non_object_posts");
    }
    Ok(raw.iter().filter_map(Value::as_object).map(normalize).collect())
}

/// Rebuild the library from the merged posts, keeping prior classifications.
pub fn extract(cfg: &PromptlibConfig) -> Result<()> {
    let posts = load_posts(&cfg.all_tweets_path())?;
    let blacklist = Blacklist::load(&cfg.blacklist_path())?;
    let chain = FilterChain::new(&cfg.extraction);

    let store = LibraryStore::new(cfg.library_path());
    let previous = if store.exists() {
        Some(store.load()?)
    } else {
        None
    };

    let (library, _stats) = extract_library(&posts, &chain, &blacklist, previous.as_ref());
    store.save(&library)
}

/// Classify pending records. A missing credential is fatal.
pub async fn classify(cfg: &PromptlibConfig) -> Result<()> {
    let store = LibraryStore::new(cfg.library_path());
    if !store.exists() {
        return Err(PromptlibError::MissingInput(store.path().to_path_buf()));
    }
    let client = promptlib_llm::classifier_client(&cfg.classifier)?;
    let stats = classify_library(&store, &client, &ClassifyOptions::from(&cfg.classifier)).await?;
    tracing::info!(
        classified = stats.classified,
        failed_batches = stats.failed_batches,
        "classify.saved"
    );
    Ok(())
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, contents)?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "site.written");
    Ok(())
}

/// Render the README and the HTML gallery from the visible library.
pub fn site(cfg: &PromptlibConfig) -> Result<()> {
    let library = LibraryStore::new(cfg.library_path()).load()?;
    let blacklist = Blacklist::load(&cfg.blacklist_path())?;
    let visible = promptlib_web::without_blacklisted(&library, &blacklist);

    let readme = promptlib_web::render_readme(&visible, &cfg.site, Utc::now().date_naive());
    write_output(&cfg.site.readme_path, &readme)?;
    let html = promptlib_web::render_gallery(&visible, &cfg.site)?;
    write_output(&cfg.site.html_path, &html)
}

/// Print the daily report to stdout.
pub fn report(cfg: &PromptlibConfig) -> Result<()> {
    let library = LibraryStore::new(cfg.library_path()).load()?;
    let blacklist = Blacklist::load(&cfg.blacklist_path())?;
    let visible = promptlib_web::without_blacklisted(&library, &blacklist);
    println!("{}", promptlib_web::render_report(&visible, &cfg.site, Utc::now()));
    Ok(())
}

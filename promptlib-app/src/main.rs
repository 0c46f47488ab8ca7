use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use promptlib_common::observability::{LogConfig, LogFormat, init_logging};
use promptlib_config::{PromptlibConfig, PromptlibConfigLoader};
use std::path::PathBuf;

mod stages;

use stages::settle;

#[derive(Parser)]
#[command(name = "promptlib")]
#[command(about = "Collect, extract, classify and publish Seedance video prompts")]
struct Cli {
    /// YAML configuration file; skipped when absent
    #[arg(long, global = true, default_value = "promptlib.yaml", env = "PROMPTLIB_CONFIG")]
    config: PathBuf,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Debug-level logging when RUST_LOG is unset
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct FetchArgs {
    /// Days back from today (UTC) to search
    #[arg(long, default_value_t = 1)]
    days: u32,

    /// Maximum number of posts to request from the scraper
    #[arg(long = "max", default_value_t = 4000)]
    max_items: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage: fetch, merge, extract, classify, site
    Run {
        #[arg(long)]
        skip_fetch: bool,
        #[arg(long)]
        skip_classify: bool,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Scrape recent posts into a raw batch
    Fetch(FetchArgs),
    /// Merge raw batches into the cumulative post file
    Merge,
    /// Rebuild the prompt library from merged posts
    Extract,
    /// Classify pending prompts
    Classify,
    /// Render the README and the HTML gallery
    Site,
    /// Print the daily report
    Report,
}

async fn run_pipeline(
    cfg: &PromptlibConfig,
    skip_fetch: bool,
    skip_classify: bool,
    fetch: FetchArgs,
) -> Result<()> {
    if skip_fetch {
        tracing::info!("pipeline.fetch_skipped");
    } else {
        tracing::info!(step = 1, "pipeline.fetch");
        settle("fetch", stages::fetch(cfg, fetch.days, fetch.max_items).await)?;
    }

    tracing::info!(step = 2, "pipeline.merge");
    settle("merge", stages::merge(cfg))?;

    tracing::info!(step = 3, "pipeline.extract");
    settle("extract", stages::extract(cfg))?;

    if skip_classify {
        tracing::info!("pipeline.classify_skipped");
    } else {
        tracing::info!(step = 4, "pipeline.classify");
        settle("classify", stages::classify(cfg).await)?;
    }

    tracing::info!(step = 5, "pipeline.site");
    settle("site", stages::site(cfg))?;
    tracing::info!("pipeline.done");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(LogConfig {
        format: if cli.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        default_filter: if cli.verbose { "debug" } else { "info" },
        ..LogConfig::default()
    })?;

    // Env wins over the file.
    let cfg = PromptlibConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    tracing::debug!(data_dir = %cfg.data_dir.display(), "config.loaded");

    match cli.command {
        Commands::Run {
            skip_fetch,
            skip_classify,
            fetch,
        } => run_pipeline(&cfg, skip_fetch, skip_classify, fetch).await,
        Commands::Fetch(args) => settle("fetch", stages::fetch(&cfg, args.days, args.max_items).await),
        Commands::Merge => settle("merge", stages::merge(&cfg)),
        Commands::Extract => settle("extract", stages::extract(&cfg)),
        Commands::Classify => settle("classify", stages::classify(&cfg).await),
        Commands::Site => settle("site", stages::site(&cfg)),
        Commands::Report => settle("report", stages::report(&cfg)),
    }
}

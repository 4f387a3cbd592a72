use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lb_watchlist::{ConfigBuilder, FileConfig, ScrapeEngine};

#[derive(Parser)]
#[command(name = "lb-watchlist")]
#[command(about = "Export a Letterboxd watchlist to CSV")]
struct Cli {
    /// Letterboxd user whose watchlist is exported
    user: Option<String>,

    /// Output CSV path (default: data/<user>_watchlist.csv)
    #[arg(short, long, env = "LB_WATCHLIST_OUTPUT")]
    output: Option<PathBuf>,

    /// Site root the watchlist and film paths are appended to
    #[arg(long, env = "LB_WATCHLIST_BASE_URL")]
    base_url: Option<String>,

    /// TOML file with defaults for any of these options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many watchlist pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Fetch each film only once even if it is listed more than once
    #[arg(long, overrides_with = "no_dedupe")]
    dedupe: bool,

    /// Fetch repeated films again, even if the config file sets dedupe
    #[arg(long, overrides_with = "dedupe")]
    no_dedupe: bool,

    /// Increase verbosity (-v debug, -vv trace). Default is info.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // RUST_LOG wins when set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dedupe = match (cli.dedupe, cli.no_dedupe) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let mut builder = ConfigBuilder::new();
    if let Some(path) = &cli.config {
        let file = FileConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        builder = builder.file(file);
    }

    let config = builder
        .user(cli.user)
        .output_path(cli.output)
        .base_url(cli.base_url)
        .max_pages(cli.max_pages)
        .timeout_secs(cli.timeout_secs)
        .user_agent(cli.user_agent)
        .dedupe(dedupe)
        .build()?;

    let output = config.output_path.clone();
    let engine = ScrapeEngine::new(config)?;
    let summary = engine
        .run()
        .await
        .with_context(|| format!("Watchlist export to {} failed", output.display()))?;

    println!(
        "Exported {} of {} films from {} page(s) to {} ({} without poster data)",
        summary.records_written,
        summary.films_found,
        summary.pages,
        output.display(),
        summary.skipped
    );

    Ok(())
}

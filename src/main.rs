// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments (and env vars) using clap
// 2. Set up logging with tracing
// 3. Dispatch to the crawl or report handler
// 4. Exit with proper code (0 = success, 1 = seed user unavailable, 2 = error)
// =============================================================================

mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - validated settings
mod crawl;         // src/crawl/ - recursive follower/subscription traversal
mod error;         // src/error.rs - CrawlError
mod graph;         // src/graph/ - Neo4j and in-memory graph stores
mod report;        // src/report.rs - end-of-run console output
mod vk;            // src/vk/ - VK API client

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CrawlArgs, ReportArgs};
use config::{ApiSettings, GraphSettings};
use crawl::{CrawlReport, TraverseOptions, Traverser};
use graph::{GraphStore, MemoryStore, Neo4jStore};
use report::RunReport;
use vk::VkClient;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            tracing::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = crawl/report finished
//   Ok(1) = seed user could not be fetched
//   Err   = configuration, connection or output error
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
        Commands::Report(args) => handle_report(args).await,
    }
}

// RUST_LOG wins when set; otherwise --log-level. Logs go to stderr so that
// `--json` output on stdout can be piped.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let api = ApiSettings::from_args(&args.api, args.page_size)
        .context("invalid VK API settings")?;
    let options = TraverseOptions::from(&args);
    let fetcher = VkClient::new(api).context("failed to build HTTP client")?;

    let store: Box<dyn GraphStore> = if args.dry_run {
        tracing::info!("dry run: graph is kept in memory");
        Box::new(MemoryStore::new())
    } else {
        Box::new(connect(&args.graph).await?)
    };

    let outcome: CrawlReport = Traverser::new(&fetcher, &*store, options)
        .crawl(&args.seed)
        .await;

    let Some(seed) = outcome.seed.as_ref() else {
        tracing::error!(seed = %args.seed, "seed user unavailable");
        return Ok(1);
    };

    let summary = store
        .summary(args.output.top)
        .await
        .context("failed to query graph summary")?;

    report::print_report(
        &RunReport {
            seed: Some(seed),
            stats: Some(&outcome.stats),
            summary: &summary,
        },
        args.output.json,
    )?;

    Ok(0)
}

// Handles the 'report' subcommand
async fn handle_report(args: ReportArgs) -> Result<i32> {
    let store = connect(&args.graph).await?;
    let summary = store
        .summary(args.output.top)
        .await
        .context("failed to query graph summary")?;

    report::print_report(
        &RunReport {
            seed: None,
            stats: None,
            summary: &summary,
        },
        args.output.json,
    )?;

    Ok(0)
}

async fn connect(args: &cli::GraphArgs) -> Result<Neo4jStore> {
    let settings = GraphSettings::from(args);
    Neo4jStore::connect(&settings)
        .await
        .with_context(|| format!("failed to connect to Neo4j at {}", settings.uri))
}

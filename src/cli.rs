// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl:  fetch a seed user from VK, walk followers/subscriptions, write Neo4j
// - report: print the summary of a graph that was already crawled
//
// Every connection setting can also come from an environment variable
// (clap's `env` feature), so `VK_ACCESS_TOKEN=... vk-graph crawl 1` works.
// =============================================================================

use clap::{Args, Parser, Subcommand};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "vk-graph",
    version = "0.1.0",
    about = "Crawl VK followers and group subscriptions into a Neo4j graph",
    long_about = "vk-graph starts from a seed VK user, recursively fetches followers up to a \
                  fixed depth plus group subscriptions, and mirrors everything into Neo4j \
                  as User/Group nodes with FOLLOW/SUBSCRIBE relationships."
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a seed user and write everything found into the graph
    ///
    /// Example: vk-graph crawl 172531131 --max-depth 1
    Crawl(CrawlArgs),

    /// Print totals and top users/groups from an existing graph
    ///
    /// Example: vk-graph report --json
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Seed user: numeric VK id or screen name (e.g. 1 or "durov")
    pub seed: String,

    /// How many follower levels to expand below the seed (seed is depth 0)
    #[arg(long, default_value_t = 2)]
    pub max_depth: u32,

    /// How many followers / subscriptions to request per call (one page only)
    #[arg(long, default_value_t = 200)]
    pub page_size: u32,

    /// Pause between written entities, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Also crawl the group subscriptions of every follower, not just the seed's
    #[arg(long)]
    pub follower_subscriptions: bool,

    /// Keep the graph in memory instead of writing to Neo4j
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub api: ApiArgs,

    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// VK API connection settings
#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// VK access token
    #[arg(long, env = "VK_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// VK API version sent as the `v` parameter
    #[arg(long, env = "VK_API_VERSION", default_value = "5.131")]
    pub api_version: String,

    /// Base URL of the VK API
    #[arg(long, env = "VK_API_BASE", default_value = "https://api.vk.com/")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

/// Neo4j connection settings
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    #[arg(long, env = "NEO4J_URI", default_value = "bolt://localhost:7687")]
    pub neo4j_uri: String,

    #[arg(long, env = "NEO4J_USER", default_value = "neo4j")]
    pub neo4j_user: String,

    #[arg(long, env = "NEO4J_PASSWORD", default_value = "neo4j", hide_env_values = true)]
    pub neo4j_password: String,

    /// Database name (the server default is used when omitted)
    #[arg(long, env = "NEO4J_DATABASE")]
    pub neo4j_db: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// How many entries the top-users / top-groups lists hold
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

pub mod plan;
pub mod schema;
pub mod serve;

use crate::config::Config;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG: &str = "tripwright.yaml";

#[derive(Parser)]
#[command(name = "tripwright")]
#[command(
    author,
    version,
    about = "Multi-specialist travel planner driven by an LLM and web search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Plan one trip and print the result
    Plan(PlanArgs),

    /// Run the HTTP planning service
    Serve(ServeArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Clone)]
pub struct PlanArgs {
    /// Path to config file (defaults to ./tripwright.yaml when present)
    #[arg(short, long, env = "TRIPWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where to go
    #[arg(short, long)]
    pub destination: String,

    /// First day of the trip (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: String,

    /// Last day of the trip (YYYY-MM-DD), strictly after the start date
    #[arg(long)]
    pub end_date: String,

    /// budget, mid-range or luxury
    #[arg(long, default_value = "mid-range")]
    pub budget: String,

    /// ISO currency code for all amounts
    #[arg(long, default_value = "USD")]
    pub currency: String,

    /// Number of travellers
    #[arg(long, default_value_t = 1)]
    pub group_size: i64,

    /// Comma-separated interests
    #[arg(long, default_value = "")]
    pub interests: String,

    /// Dietary requirements
    #[arg(long, default_value = "")]
    pub dietary: String,

    /// Mobility notes
    #[arg(long, default_value = "")]
    pub mobility: String,

    /// relaxed, moderate or active
    #[arg(long, default_value = "moderate")]
    pub activity_level: String,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Plan without a model or web search (deterministic drafts)
    #[arg(long)]
    pub offline: bool,

    /// Override the iteration ceiling
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

#[derive(Parser, Clone)]
pub struct ServeArgs {
    /// Path to config file (defaults to ./tripwright.yaml when present)
    #[arg(short, long, env = "TRIPWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address (host:port)
    #[arg(long)]
    pub bind: Option<String>,

    /// Serve plans without a model or web search
    #[arg(long)]
    pub offline: bool,
}

/// Load config if it exists, otherwise use defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Config::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading config from {}", DEFAULT_CONFIG);
            Config::load(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            info!("No config found, using defaults");
            Config::default()
        }
    };
    Ok(config)
}

/// Switch to the deterministic reasoner and turn search off
pub fn make_offline(config: &mut Config) {
    config.model.provider = crate::config::ModelProvider::Offline;
    config.lookup.provider = crate::config::LookupProvider::None;
}

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod lookup;
mod output;
mod parser;
mod plan;
mod provider;
mod request;
mod server;
mod specialist;
mod status;
mod workflow;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - debug with --verbose, otherwise RUST_LOG or warnings only
    let filter = if cli.verbose {
        EnvFilter::new("tripwright=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tripwright=warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan(args) => cli::plan::execute(args).await,
        Commands::Serve(args) => cli::serve::execute(args).await,
        Commands::Schema => cli::schema::execute(),
    }
}

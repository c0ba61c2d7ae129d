use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands};

mod cli;
mod fetch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lumen=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    match app.cmd {
        Commands::Fetch(args) => fetch::run(args).await,
    }
}

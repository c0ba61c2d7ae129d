use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lumen_data::Priority;

#[derive(Clone, Debug, Parser)]
#[command(name = "lumen", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "f", name = "fetch", about = "Fetch a remote image and write its bytes")]
    Fetch(FetchArgs),
}

#[derive(Clone, Debug, Args)]
pub struct FetchArgs {
    /// URL to fetch
    pub url: String,

    /// Extra request header, `Name: value`. May be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Output file; stdout when absent
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// User agent sent when no `User-Agent` header is given
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds, body included
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    #[arg(long, value_enum, default_value_t = PriorityArg::Normal)]
    pub priority: PriorityArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Normal,
    High,
    Immediate,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::High => Priority::High,
            PriorityArg::Immediate => Priority::Immediate,
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

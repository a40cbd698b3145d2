//! chatfs inspection binary.
//!
//! Builds the chat tree from a JSON account snapshot and runs one
//! filesystem-style command against it.
//!
//! Usage:
//!   chatfs --snapshot account.json ls
//!   chatfs --snapshot account.json ls lounge
//!   chatfs --snapshot account.json cat lounge/general
//!   chatfs --snapshot account.json --template '{{username}}' --template '{{content}}' cat lounge/general
//!   chatfs --snapshot account.json --config chatfs.rhai stat lounge/general
//!   chatfs --snapshot account.json post lounge/general "hello"

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// Browse a chat account as a filesystem.
#[derive(Parser, Debug)]
#[command(name = "chatfs")]
#[command(about = "Browse a chat account snapshot as a filesystem")]
struct Args {
    /// Account snapshot (JSON) to serve
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Rhai configuration script
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Column template; repeat for more columns. Replaces configured templates.
    #[arg(short, long = "template")]
    templates: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory (default: the root)
    Ls { path: Option<String> },
    /// Print a channel's rendered rows
    Cat { path: String },
    /// Show a node's attributes
    Stat { path: String },
    /// Post a message to a channel
    Post { path: String, text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = commands::load_config(args.config.as_deref(), args.templates)?;
    let fs = commands::open(&args.snapshot, &config).await?;

    let mut out = std::io::stdout().lock();
    match args.command {
        Command::Ls { path } => commands::ls(&fs, path.as_deref().unwrap_or(""), &mut out).await,
        Command::Cat { path } => commands::cat(&fs, &path, &mut out).await,
        Command::Stat { path } => commands::stat(&fs, &path, &mut out).await,
        Command::Post { path, text } => commands::post(&fs, &path, &text, &mut out).await,
    }
}

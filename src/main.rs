mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use habitat::config::HabitatConfig;

#[derive(Parser)]
#[command(name = "habitat", version, about = "Local persona habitat with append-only memory streams")]
struct Cli {
    /// Config file (defaults to ~/.habitat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Append a note to a memory stream
    Append {
        /// Tag the note
        #[arg(long)]
        tag: Option<String>,
        /// Stream to write to
        #[arg(long, value_enum, default_value_t = cli::StreamName::Root)]
        stream: cli::StreamName,
        /// Note text
        #[arg(required = true, num_args = 1..)]
        note: Vec<String>,
    },
    /// Show the last N entries of a stream
    Tail {
        #[arg(default_value_t = cli::tail::DEFAULT_TAIL as i64, allow_negative_numbers = true)]
        n: i64,
        #[arg(long, value_enum, default_value_t = cli::StreamName::Root)]
        stream: cli::StreamName,
    },
    /// Search the root stream by note text and/or tag
    Search {
        /// Case-insensitive text to look for
        query: Option<String>,
        /// Exact tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Print the profile plus recent entries as JSON
    Snapshot,
    /// Print a one-line liveness record as JSON
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => HabitatConfig::load_from(path)?,
        None => HabitatConfig::load()?,
    };

    // Log to stderr so stdout stays clean for JSON output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => habitat::server::serve(config).await?,
        Command::Append { tag, stream, note } => {
            cli::append::append(&config, stream, tag.as_deref(), &note)?
        }
        Command::Tail { n, stream } => cli::tail::tail(&config, stream, n)?,
        Command::Search { query, tag } => {
            cli::search::search(&config, query.as_deref(), tag.as_deref())?
        }
        Command::Snapshot => cli::snapshot::snapshot(&config)?,
        Command::Probe => cli::probe(&config)?,
    }

    Ok(())
}

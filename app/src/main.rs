#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    CommandStrategy, ExtractInput, ExtractStrategy, InitStrategy, ServeInput, ServeStrategy,
    VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formpilot")]
#[command(about = "Insurance application forms from company memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to listen on, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Extract a canonical form from a memory JSON file and print it
    Extract {
        /// Memory JSON file, `-` for stdin
        file: PathBuf,

        /// Use key-path extraction instead of the reasoning engine
        #[arg(long)]
        offline: bool,

        /// Apply display defaults (empty strings, false) before printing
        #[arg(long)]
        display: bool,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => ServeStrategy.execute(ServeInput { bind }).await,
        Commands::Extract {
            file,
            offline,
            display,
        } => {
            ExtractStrategy
                .execute(ExtractInput {
                    file,
                    offline,
                    display,
                })
                .await
        }
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}

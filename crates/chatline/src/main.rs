//! chatline - replay recorded agent event streams in a terminal message view.

mod replay;
mod terminal;

use std::path::PathBuf;

use anyhow::Context;
use chatline_tui_core::ViewConfig;
use chatline_util::log::{self, LogConfig};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chatline")]
#[command(author, version, about = "Terminal message view for coding agents", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Theme name, overrides the config file
    #[arg(long, global = true)]
    theme: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a newline-delimited JSON event stream
    Replay {
        /// Event stream file
        file: PathBuf,
        /// Print the transcript and exit instead of opening the viewer
        #[arg(long)]
        dump: bool,
        /// Transcript width for --dump
        #[arg(long, default_value_t = 100)]
        width: u16,
        /// Apply every event at once instead of one per tick
        #[arg(long)]
        instant: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ViewConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }

    log::init(LogConfig {
        level: config.log_level,
        include_location: false,
        file: config.log_file.clone(),
    })
    .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Replay {
            file,
            dump,
            width,
            instant,
        } => {
            let events = replay::load_events(&file)?;
            tracing::info!(file = %file.display(), events = events.len(), "Loaded event stream");
            if dump {
                println!("{}", replay::transcript(&config, events, width));
                Ok(())
            } else {
                replay::run(&config, events, instant).await
            }
        }
    }
}

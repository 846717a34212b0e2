mod commands;
mod render;
mod utils;

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use todosync_core::vault::ListMode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "todosync")]
#[command(about = "Sync the todos in your notes with a remote calendar")]
struct Cli {
    /// Include lines that would otherwise be skipped while being edited
    #[arg(long, global = true)]
    manual: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile once: push local changes, pull remote ones
    Sync,
    /// Show what `sync` would do, without changing anything
    Status,
    /// List open todos from the calendar
    List {
        /// YAML query file, or a note with ```todosync blocks
        #[arg(short, long)]
        query: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Mark a todo done on both sides
    Done { block_id: String },
    /// Delete a todo's line and its calendar event
    Delete { block_id: String },
    /// Keep reconciling until interrupted
    Watch,
    /// Show the config file location
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mode = if cli.manual {
        ListMode::Manual
    } else {
        ListMode::Auto
    };

    match cli.command {
        Commands::Sync => commands::sync::run(mode).await,
        Commands::Status => commands::status::run(mode).await,
        Commands::List { query, json } => commands::list::run(mode, query, json).await,
        Commands::Done { block_id } => commands::done::run(&block_id).await,
        Commands::Delete { block_id } => commands::delete::run(&block_id).await,
        Commands::Watch => commands::watch::run(mode).await,
        Commands::Config => commands::config::run(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TODOSYNC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "todosync=debug,info"
        } else {
            "todosync=info,warn"
        })
    });

    let format = env::var("TODOSYNC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

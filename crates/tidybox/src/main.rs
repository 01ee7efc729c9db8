//! tidybox - route new downloads to the right folder

use clap::{Parser, Subcommand};
use tracing::error;

mod app;
mod commands;

use commands::{
    drives_command, history_command, init_command, ls_command, mkdir_command, mv_command,
    recents_command, rm_command, status_command, watch_command,
};

/// tidybox - sort your inbox without leaving the terminal
#[derive(Parser)]
#[command(name = "tidybox")]
#[command(about = "◆ Sandboxed inbox organizer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write default config and create the data directory
    Init,
    /// Show configuration, allowed folders and history size
    Status,
    /// List mounted drives
    Drives,
    /// List a folder
    Ls { path: String },
    /// Create a folder and allow it as a destination
    Mkdir { parent: String, name: String },
    /// Move files into a folder
    Mv {
        #[arg(required = true)]
        sources: Vec<String>,
        /// Destination folder
        #[arg(short, long)]
        to: String,
    },
    /// Send files to the trash
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Show or clear the operation history
    History {
        /// Number of entries to show, newest first
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Wipe history (recent destinations are kept)
        #[arg(long)]
        clear: bool,
    },
    /// List recent destinations
    Recents,
    /// Watch the inbox and sort new files as they arrive
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let (label, result) = match cli.command {
        Commands::Init => ("Init", init_command().await),
        Commands::Status => ("Status", status_command().await),
        Commands::Drives => ("Drives", drives_command().await),
        Commands::Ls { path } => ("List", ls_command(path).await),
        Commands::Mkdir { parent, name } => ("Mkdir", mkdir_command(parent, name).await),
        Commands::Mv { sources, to } => ("Move", mv_command(sources, to).await),
        Commands::Rm { paths } => ("Delete", rm_command(paths).await),
        Commands::History { limit, clear } => ("History", history_command(limit, clear).await),
        Commands::Recents => ("Recents", recents_command().await),
        Commands::Watch => ("Watch", watch_command().await),
    };

    if let Err(e) = result {
        error!("{} failed: {:#}", label, e);
        std::process::exit(1);
    }
}

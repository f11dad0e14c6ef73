//! Reelsmith CLI: compose, inspect, and render declarative timelines.
//!
//! Usage:
//!   reelsmith compose <REQUEST>     Turn an auto-edit request into a timeline
//!   reelsmith validate <TIMELINE>   Check a timeline's invariants
//!   reelsmith plan <TIMELINE>       Print the encoder command without running it
//!   reelsmith render <TIMELINE>     Render a timeline to video
//!   reelsmith probe <FILE>          Show a media file's duration and streams
//!   reelsmith check                 Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelsmith_common::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelsmith",
    about = "Declarative timeline compiler for narrated still-image video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a timeline from an auto-edit request
    Compose {
        /// Path to the request JSON
        request: PathBuf,

        /// Write the timeline here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Use narration file lengths as scene durations
        #[arg(long)]
        probe_audio: bool,
    },

    /// Validate a timeline file
    Validate {
        /// Path to the timeline JSON
        path: PathBuf,
    },

    /// Compile a timeline and print the encoder command line
    Plan {
        /// Path to the timeline JSON
        path: PathBuf,

        /// Output file name used in the printed command
        #[arg(short, long, default_value = "output.mp4")]
        output: String,

        /// Print only the filter graph
        #[arg(long)]
        graph_only: bool,
    },

    /// Render a timeline to video
    Render {
        /// Path to the timeline JSON
        path: PathBuf,

        /// Output file name, written under the configured output directory
        #[arg(short, long, default_value = "output.mp4")]
        output: String,

        /// Override the output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Film grain strength (0 disables)
        #[arg(long)]
        grain: Option<u32>,
    },

    /// Show a media file's duration and streams
    Probe {
        /// Path to the media file
        path: PathBuf,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    logging.json |= cli.json_logs;
    reelsmith_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Compose {
            request,
            output,
            probe_audio,
        } => commands::compose::run(&config, request, output, probe_audio),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Plan {
            path,
            output,
            graph_only,
        } => commands::plan::run(&config, path, output, graph_only),
        Commands::Render {
            path,
            output,
            output_dir,
            grain,
        } => commands::render::run(config, path, output, output_dir, grain).await,
        Commands::Probe { path } => commands::probe::run(&config, path),
        Commands::Check => commands::check::run(&config),
    }
}

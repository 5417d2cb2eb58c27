//! melodify - headless player for branching MIDI songs
//!
//! Subcommands:
//! - `melodify inspect <song>` - Print the branch tree of a song
//! - `melodify play <song>` - Play a round from a script or an autoplayer
//! - `melodify config` - Print the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use melodify_conf::MelodifyConfig;

mod commands;
mod script;

#[derive(Parser)]
#[command(name = "melodify")]
#[command(about = "Branching rhythm game engine, headless")]
#[command(version)]
struct Cli {
    /// Config file to use in place of ./melodify.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding midi/ and json/ branch data
    #[arg(long, global = true)]
    branch_dir: Option<PathBuf>,

    /// Log filter directive (e.g. "debug", "melodify=trace")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the branch tree reachable from a song's first branch
    Inspect {
        /// First branch of the song (defaults to gameplay.first_branch)
        song: Option<String>,

        /// How many generations of successors to show
        #[arg(short, long, default_value = "3")]
        depth: u32,
    },

    /// Play one round without a display
    Play {
        /// First branch of the song (defaults to gameplay.first_branch)
        song: Option<String>,

        /// Input script: lines of "<beat> <tones...>"
        #[arg(short, long, conflicts_with = "autoplay")]
        script: Option<PathBuf>,

        /// Hit every note, steering towards one side at each choice
        #[arg(short, long, value_enum)]
        autoplay: Option<script::Side>,

        /// Print a JSON snapshot after every eventful tick
        #[arg(long)]
        json: bool,

        /// Override gameplay.bpm for this round
        #[arg(long)]
        bpm: Option<f64>,

        /// Stop after this many ticks even if the round is still going
        #[arg(long, default_value = "1000000")]
        max_ticks: u64,
    },

    /// Show the effective configuration and where it came from
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = MelodifyConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = cli.branch_dir {
        config.paths.branch_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.telemetry.log_level = level;
    }

    let filter = tracing_subscriber::EnvFilter::try_new(&config.telemetry.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { song, depth } => {
            let song = song.unwrap_or_else(|| config.gameplay.first_branch.clone());
            commands::inspect(&config, &song, depth)?;
        }
        Commands::Play {
            song,
            script,
            autoplay,
            json,
            bpm,
            max_ticks,
        } => {
            if let Some(bpm) = bpm {
                config.gameplay.bpm = bpm;
                config
                    .gameplay
                    .validate()
                    .context("Invalid --bpm")?;
            }
            let song = song.unwrap_or_else(|| config.gameplay.first_branch.clone());
            let input = match (script, autoplay) {
                (Some(path), _) => script::Input::Script(script::Script::load(&path)?),
                (None, Some(side)) => script::Input::Autoplay(side),
                (None, None) => script::Input::Autoplay(script::Side::Left),
            };
            commands::play(&config, &song, input, json, max_ticks)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}

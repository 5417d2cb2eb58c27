//! Subcommand implementations

use anyhow::{Context, Result};
use tracing::info;

use melodify::session::time_to_beats;
use melodify::{Branch, DirSource, Game, SessionState, Songbook};
use melodify_conf::{ConfigSources, MelodifyConfig};

use crate::script::Input;

/// Fixed tick length for headless play: 60 ticks per second.
const TICK_MS: f64 = 1000.0 / 60.0;

fn source(config: &MelodifyConfig) -> DirSource {
    DirSource::new(&config.paths.branch_dir)
}

/// Print the branch tree of `song` down to `depth` generations.
pub fn inspect(config: &MelodifyConfig, song: &str, depth: u32) -> Result<()> {
    let book = Songbook::load(&source(config), song)
        .with_context(|| format!("Failed to load song '{}'", song))?;

    println!(
        "{} ({} melodies: {})",
        song,
        book.len(),
        book.names().join(", ")
    );
    let root = book.root_branch(config.gameplay.lead_in_beats)?;
    print_branch(&book, &root, depth, 0);
    Ok(())
}

fn print_branch(book: &Songbook, branch: &Branch, depth: u32, indent: usize) {
    let colour = branch.colour();
    println!(
        "{:indent$}{} [{:.2} - {:.2}] {} notes, tracks {}, colour ({}, {}, {})",
        "",
        branch.key(),
        branch.start_time(),
        branch.end_time(),
        branch.decoded().len(),
        branch.melody().track_count(),
        colour.0,
        colour.1,
        colour.2,
        indent = indent * 2
    );
    if depth == 0 {
        return;
    }
    match book.candidates(branch) {
        Some(pair) => {
            for next in pair.iter() {
                print_branch(book, next, depth - 1, indent + 1);
            }
        }
        None => println!("{:indent$}(end of piece)", "", indent = (indent + 1) * 2),
    }
}

/// Play one round headless and report how it went.
pub fn play(
    config: &MelodifyConfig,
    song: &str,
    input: Input,
    json: bool,
    max_ticks: u64,
) -> Result<()> {
    let mut game = Game::new(source(config), config.gameplay.clone())?;
    game.start(song)
        .with_context(|| format!("Failed to start song '{}'", song))?;

    for _ in 0..max_ticks {
        let Some(session) = game.session() else {
            break;
        };
        if !session.is_playing() {
            break;
        }
        let beat = session.time() + time_to_beats(TICK_MS, session.config().bpm);
        let held = input.held(session, beat);

        let report = game.tick(TICK_MS, &held)?;
        let eventful = report.hits > 0
            || report.misses > 0
            || report.switched_to.is_some()
            || report.ended.is_some();

        if let Some(key) = &report.switched_to {
            if !json {
                println!("beat {:>7.2}  -> {}", beat, key);
            }
        }
        if json && eventful {
            if let Some(session) = game.session() {
                println!("{}", serde_json::to_string(&session.snapshot())?);
            }
        }
    }

    let Some(session) = game.session() else {
        return Ok(());
    };
    match session.state() {
        SessionState::GameOver(end) => {
            info!(score = end.score, "round finished");
            if !json {
                println!(
                    "score {} ({:?}) at beat {:.2}, health {}/{}",
                    end.score,
                    end.reason,
                    end.at,
                    session.health(),
                    session.max_health()
                );
            }
        }
        SessionState::Playing => {
            println!(
                "stopped after {} ticks at beat {:.2}, score {}",
                max_ticks,
                session.time(),
                session.score()
            );
        }
    }
    Ok(())
}

/// Print the effective configuration, then where it came from.
pub fn show_config(config: &MelodifyConfig, sources: &ConfigSources) {
    print!("{}", config.to_toml());
    println!();
    if sources.files.is_empty() {
        println!("# No config files found, using defaults");
    }
    for path in &sources.files {
        println!("# Loaded: {}", path.display());
    }
    for var in &sources.env_overrides {
        println!("# Env override: {}", var);
    }
}

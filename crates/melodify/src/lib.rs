//! Branching rhythm engine.
//!
//! A song is a tree of short MIDI melodies ("branches"). While one branch
//! plays, both possible continuations are already on the timeline; hitting a
//! note that only one of them has commits the song to that continuation.
//!
//! The engine is tick-driven and single-threaded. Song data is loaded and
//! decoded up front by [`Songbook::load`]; after that, [`Session::tick`]
//! cannot fail.
//!
//! ```no_run
//! use melodify::{DirSource, Game, HeldTones};
//! use melodify_conf::GameplayConfig;
//!
//! # fn main() -> melodify::Result<()> {
//! let mut game = Game::new(DirSource::new("branches"), GameplayConfig::default())?;
//! game.start("a")?;
//! let report = game.tick(16.7, &HeldTones::none())?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

pub mod branch;
pub mod colour;
pub mod decode;
pub mod game;
pub mod input;
pub mod judge;
pub mod leaderboard;
pub mod note;
pub mod progress;
pub mod session;
pub mod snapshot;
pub mod songbook;
pub mod source;
pub mod timeline;
pub mod tone;

pub use branch::{Branch, BranchKey, Candidates, Melody, ROOT_ID};
pub use colour::{branch_colour, Rgb};
pub use decode::{decode, decode_smf, MidiError, NoteEvent, PerformanceEvent};
pub use game::Game;
pub use input::HeldTones;
pub use judge::{judge, Judgement};
pub use leaderboard::Leaderboard;
pub use note::{DecodedNote, Note};
pub use progress::{ProgressTracker, Segment};
pub use session::{EndReason, Feedback, RoundEnd, Session, SessionState, TickReport};
pub use snapshot::Snapshot;
pub use songbook::Songbook;
pub use source::{BranchSource, DirSource, MemorySource};
pub use timeline::Timeline;
pub use tone::{Tone, ToneMap};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Performance data or metadata for a branch is missing or unreadable.
    #[error("failed to load branch {name:?}: {reason}")]
    DataLoad { name: String, reason: String },

    #[error("invalid gameplay settings: {0}")]
    Config(#[from] melodify_conf::ConfigError),

    #[error("no round has been started")]
    NoSession,
}

pub type Result<T> = std::result::Result<T, Error>;

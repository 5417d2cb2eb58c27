//! Song selection, rounds and the leaderboard, tied together.

use std::sync::Arc;
use tracing::info;

use melodify_conf::GameplayConfig;

use crate::input::HeldTones;
use crate::leaderboard::Leaderboard;
use crate::session::{Session, TickReport};
use crate::songbook::Songbook;
use crate::source::BranchSource;
use crate::{Error, Result};

/// Owns a branch source and plays rounds from it.
///
/// A failed [`Game::start`] leaves no round in progress; the previous round,
/// if any, is discarded either way.
pub struct Game<S> {
    source: S,
    config: GameplayConfig,
    leaderboard: Leaderboard,
    session: Option<Session>,
    last_song: Option<String>,
    recorded: bool,
}

impl<S: BranchSource> Game<S> {
    pub fn new(source: S, config: GameplayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            leaderboard: Leaderboard::new(),
            session: None,
            last_song: None,
            recorded: false,
        })
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    /// Load `song` and begin a fresh round at its first branch.
    pub fn start(&mut self, song: &str) -> Result<&Session> {
        self.session = None;
        self.recorded = false;
        self.last_song = Some(song.to_string());

        let songbook = Arc::new(Songbook::load(&self.source, song)?);
        let session = Session::new(songbook, self.config.clone())?;
        Ok(self.session.insert(session))
    }

    /// Start the configured first branch.
    pub fn start_default(&mut self) -> Result<&Session> {
        let song = self.config.first_branch.clone();
        self.start(&song)
    }

    /// Play the last started song again from the top.
    pub fn restart(&mut self) -> Result<&Session> {
        let song = self.last_song.clone().ok_or(Error::NoSession)?;
        self.start(&song)
    }

    /// Advance the current round. A round that ends here has its score
    /// added to the leaderboard, once.
    pub fn tick(&mut self, elapsed_ms: f64, held: &HeldTones) -> Result<TickReport> {
        let session = self.session.as_mut().ok_or(Error::NoSession)?;
        let report = session.tick(elapsed_ms, held);

        if let Some(end) = report.ended {
            if !self.recorded {
                self.recorded = true;
                let rank = self.leaderboard.record(end.score);
                info!(score = end.score, rank, "score recorded");
            }
        }
        Ok(report)
    }
}

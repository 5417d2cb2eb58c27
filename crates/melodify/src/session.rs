//! One round of play: score, health, the active branch and its queued
//! successors, advanced one tick at a time.
//!
//! A tick never fails. Everything that can go wrong with song data went
//! wrong in [`Songbook::load`] before the session existed.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use melodify_conf::GameplayConfig;

use crate::branch::{Branch, BranchKey, Candidates};
use crate::colour::Rgb;
use crate::input::HeldTones;
use crate::judge::judge;
use crate::note::Note;
use crate::progress::ProgressTracker;
use crate::songbook::Songbook;
use crate::timeline::Timeline;
use crate::tone::{Tone, ToneMap};
use crate::Result;

/// Convert wall-clock milliseconds to beats at `bpm`.
pub fn time_to_beats(ms: f64, bpm: f64) -> f64 {
    ms / 1000.0 / 60.0 * bpm
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    #[default]
    None,
    Hit,
    Miss,
}

/// A highlight that counts down one frame per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub kind: Feedback,
    pub frames: u32,
}

impl Flash {
    pub fn set(&mut self, kind: Feedback, frames: u32) {
        *self = if frames == 0 {
            Flash::default()
        } else {
            Flash { kind, frames }
        };
    }

    pub fn decay(&mut self) {
        self.frames = self.frames.saturating_sub(1);
        if self.frames == 0 {
            self.kind = Feedback::None;
        }
    }

    pub fn is_lit(&self) -> bool {
        self.frames > 0
    }
}

/// Cosmetic marker left where a note was hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GhostMarker {
    pub tone: Tone,
    /// Beat time of the note that was hit.
    pub time: f64,
    pub colour: Rgb,
    pub frames_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    HealthExhausted,
    PieceExhausted,
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundEnd {
    pub score: u64,
    pub reason: EndReason,
    /// Beat time at which the round ended.
    pub at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Playing,
    GameOver(RoundEnd),
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub misses: usize,
    pub hits: usize,
    pub switched_to: Option<BranchKey>,
    pub ended: Option<RoundEnd>,
}

/// Identity of a placed note, for remembering which candidate notes were
/// already played before the candidate became active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NoteId {
    branch: BranchKey,
    time: u64,
    tone: Tone,
}

impl NoteId {
    fn of(note: &Note) -> Self {
        Self {
            branch: note.branch.clone(),
            time: note.time.to_bits(),
            tone: note.tone,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: GameplayConfig,
    songbook: Arc<Songbook>,
    state: SessionState,
    time: f64,
    health: u32,
    score: u64,
    active: Branch,
    queued: Option<Candidates>,
    timeline: Timeline,
    consumed: HashSet<NoteId>,
    feedback: ToneMap<Flash>,
    flash: Flash,
    ghosts: Vec<GhostMarker>,
    progress: ProgressTracker,
    held: HeldTones,
}

impl Session {
    /// Start a round at the song's root branch, placed `lead_in_beats` in.
    pub fn new(songbook: Arc<Songbook>, config: GameplayConfig) -> Result<Self> {
        config.validate()?;
        let active = songbook.root_branch(config.lead_in_beats)?;
        let queued = songbook.candidates(&active);
        let timeline = Timeline::assemble(&active, queued.as_ref());
        let progress = ProgressTracker::new(0.0, active.colour());

        info!(
            song = songbook.root_name(),
            notes = timeline.len(),
            bpm = config.bpm,
            "round started"
        );

        Ok(Self {
            health: config.max_health,
            config,
            songbook,
            state: SessionState::Playing,
            time: 0.0,
            score: 0,
            active,
            queued,
            timeline,
            consumed: HashSet::new(),
            feedback: ToneMap::default(),
            flash: Flash::default(),
            ghosts: Vec::new(),
            progress,
            held: HeldTones::none(),
        })
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn songbook(&self) -> &Arc<Songbook> {
        &self.songbook
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    /// Current beat.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.config.max_health
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn active(&self) -> &Branch {
        &self.active
    }

    pub fn queued(&self) -> Option<&Candidates> {
        self.queued.as_ref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn feedback(&self) -> &ToneMap<Flash> {
        &self.feedback
    }

    pub fn flash(&self) -> Flash {
        self.flash
    }

    pub fn ghosts(&self) -> &[GhostMarker] {
        &self.ghosts
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn held(&self) -> &HeldTones {
        &self.held
    }

    /// Estimated song length: the furthest end among the active branch and
    /// its queued successors. Grows as the song unfolds.
    pub fn total_estimate(&self) -> f64 {
        let queued_end = self.queued.as_ref().map_or(0.0, Candidates::end_time);
        self.active.end_time().max(queued_end)
    }

    /// Change tempo mid-round. Non-positive or non-finite values are ignored.
    pub fn set_bpm(&mut self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            debug!(from = self.config.bpm, to = bpm, "tempo change");
            self.config.bpm = bpm;
        } else {
            warn!(bpm, "ignoring invalid tempo");
        }
    }

    /// Advance the round by `elapsed_ms` with `held` as the key state.
    /// Does nothing once the round is over.
    pub fn tick(&mut self, elapsed_ms: f64, held: &HeldTones) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_playing() {
            return report;
        }
        self.held = held.clone();

        if self.health == 0 {
            report.ended = Some(self.end(EndReason::HealthExhausted));
            return report;
        }

        self.time += time_to_beats(elapsed_ms.max(0.0), self.config.bpm);
        self.flash.decay();

        let judgement = judge(
            &mut self.timeline,
            self.time,
            self.config.forgiveness,
            self.active.key(),
            held,
        );
        report.misses = judgement.expired.len();
        report.hits = judgement.hits.len();

        for note in &judgement.expired {
            self.miss(note);
        }
        for note in &judgement.hits {
            self.hit(note);
        }

        if let Some(key) = judgement.switch_to {
            if self.commit(&key) {
                report.switched_to = Some(key);
            }
        } else if self.timeline.is_empty() {
            report.switched_to = self.continue_unchosen();
        }

        for (_, flash) in self.feedback.iter_mut() {
            flash.decay();
        }
        for ghost in &mut self.ghosts {
            ghost.frames_left = ghost.frames_left.saturating_sub(1);
        }
        self.ghosts.retain(|g| g.frames_left > 0);

        debug_assert_eq!(
            self.queued.is_some(),
            self.active.successor_name().is_some(),
            "queued candidates out of step with successor"
        );
        debug_assert!(self.health <= self.config.max_health);

        if self.timeline.is_empty() && (self.queued.is_none() || self.should_continue_unchosen()) {
            // nothing left, or a loop of melodies without notes
            report.ended = Some(self.end(EndReason::PieceExhausted));
        }

        trace!(
            beat = self.time,
            score = self.score,
            health = self.health,
            notes = self.timeline.len(),
            "tick"
        );
        report
    }

    fn miss(&mut self, note: &Note) {
        self.health = self.health.saturating_sub(1);
        self.feedback[note.tone].set(Feedback::Miss, self.config.key_flash_frames);
        self.flash.set(Feedback::Miss, self.config.key_flash_frames);
        self.remember(note);
        debug!(tone = %note.tone, time = note.time, health = self.health, "miss");
    }

    fn hit(&mut self, note: &Note) {
        self.score += self.config.score_increment;
        self.feedback[note.tone].set(Feedback::Hit, self.config.key_flash_frames);
        self.flash.set(Feedback::Hit, self.config.key_flash_frames);
        if self.config.ghost_fade_frames > 0 {
            self.ghosts.push(GhostMarker {
                tone: note.tone,
                time: note.time,
                colour: note.colour,
                frames_left: self.config.ghost_fade_frames,
            });
        }
        self.remember(note);
    }

    fn remember(&mut self, note: &Note) {
        if note.branch != *self.active.key() {
            self.consumed.insert(NoteId::of(note));
        }
    }

    /// With nothing left to play, the left candidate takes over: straight
    /// away when its notes were used up without a choice, or once its end is
    /// reached when the pair has no notes at all. Follows at most one pass
    /// through the songbook, so a cycle of empty melodies cannot spin.
    fn continue_unchosen(&mut self) -> Option<BranchKey> {
        let mut switched = None;
        for _ in 0..=self.songbook.len() {
            if !self.should_continue_unchosen() {
                break;
            }
            let Some(left) = self.queued.as_ref().map(|pair| pair.left.key().clone()) else {
                break;
            };
            debug!(branch = %left, "no branch chosen, continuing left");
            if !self.commit(&left) {
                break;
            }
            switched = Some(left);
        }
        switched
    }

    fn should_continue_unchosen(&self) -> bool {
        let Some(pair) = self.queued.as_ref() else {
            return false;
        };
        let has_notes = pair.iter().any(|b| !b.decoded().is_empty());
        self.timeline.is_empty() && (has_notes || self.time >= pair.end_time())
    }

    /// Make the queued candidate `key` active and queue its successors.
    fn commit(&mut self, key: &BranchKey) -> bool {
        let Some(Candidates { left, right }) = self.queued.take() else {
            return false;
        };
        let next = if left.key() == key {
            left
        } else if right.key() == key {
            right
        } else {
            warn!(branch = %key, "switch target is not queued");
            self.queued = Some(Candidates { left, right });
            return false;
        };

        self.progress.switch(self.time, next.colour());
        self.queued = self.songbook.candidates(&next);

        let consumed = std::mem::take(&mut self.consumed);
        let mut timeline = Timeline::assemble(&next, self.queued.as_ref());
        timeline.retain(|n| !consumed.contains(&NoteId::of(n)));

        info!(
            from = %self.active.key(),
            to = %next.key(),
            beat = self.time,
            "branch switch"
        );
        self.timeline = timeline;
        self.active = next;
        true
    }

    fn end(&mut self, reason: EndReason) -> RoundEnd {
        let end = RoundEnd {
            score: self.score,
            reason,
            at: self.time,
        };
        self.feedback = ToneMap::default();
        self.flash = Flash::default();
        self.ghosts.clear();
        self.state = SessionState::GameOver(end);
        info!(score = end.score, reason = ?end.reason, beat = end.at, "round over");
        end
    }
}

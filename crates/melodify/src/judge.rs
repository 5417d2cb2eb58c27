//! Per-tick hit and miss classification, and the branch selection rule.

use crate::branch::BranchKey;
use crate::input::HeldTones;
use crate::note::Note;
use crate::timeline::Timeline;

/// Outcome of judging one tick. Every note in `expired` and `hits` has been
/// removed from the timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Judgement {
    pub expired: Vec<Note>,
    pub hits: Vec<Note>,
    /// Branch the player committed to, if the tick picked one.
    pub switch_to: Option<BranchKey>,
}

impl Judgement {
    pub fn is_quiet(&self) -> bool {
        self.expired.is_empty() && self.hits.is_empty()
    }
}

/// Judge the timeline at `beat_time`.
///
/// Expiry runs first, so a note is never both missed and hit. A hit on a
/// note outside the active branch selects that note's branch only when no
/// other hit note shares its tone; otherwise the choice is left for a later
/// tick.
pub fn judge(
    timeline: &mut Timeline,
    beat_time: f64,
    forgiveness: f64,
    active: &BranchKey,
    held: &HeldTones,
) -> Judgement {
    let expired = timeline.drain_expired(beat_time, forgiveness);
    let hits = timeline.take_hits(beat_time, forgiveness, held);
    let switch_to = select_branch(&hits, active);
    Judgement {
        expired,
        hits,
        switch_to,
    }
}

/// Branch of the last hit note, in timeline order, that belongs to a
/// non-active branch and whose tone is unique among `hits`. Each qualifying
/// note commits in turn, so a later one overrides an earlier one.
pub fn select_branch(hits: &[Note], active: &BranchKey) -> Option<BranchKey> {
    hits.iter()
        .filter(|note| note.branch != *active)
        .filter(|note| hits.iter().filter(|other| other.tone == note.tone).count() == 1)
        .last()
        .map(|note| note.branch.clone())
}

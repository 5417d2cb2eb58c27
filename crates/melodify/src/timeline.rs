//! The playable note set: the active branch plus both queued candidates.

use crate::branch::{Branch, Candidates};
use crate::input::HeldTones;
use crate::note::Note;

/// Time-sorted notes that can still be hit.
///
/// Built from scratch whenever the active branch changes; between rebuilds
/// notes are only ever removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    notes: Vec<Note>,
}

impl Timeline {
    /// Active notes, then left, then right, stably sorted by time.
    pub fn assemble(active: &Branch, queued: Option<&Candidates>) -> Self {
        let mut notes = active.notes();
        if let Some(pair) = queued {
            notes.extend(pair.left.notes());
            notes.extend(pair.right.notes());
        }
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn retain(&mut self, keep: impl FnMut(&Note) -> bool) {
        self.notes.retain(keep);
    }

    /// Remove and return every note that fell out of the window behind
    /// `beat_time`.
    pub fn drain_expired(&mut self, beat_time: f64, forgiveness: f64) -> Vec<Note> {
        self.take_where(|n| n.is_expired(beat_time, forgiveness))
    }

    /// Remove and return every hittable note whose tone is held.
    pub fn take_hits(&mut self, beat_time: f64, forgiveness: f64, held: &HeldTones) -> Vec<Note> {
        self.take_where(|n| held.is_held(n.tone) && n.is_hittable(beat_time, forgiveness))
    }

    /// Notes from `from` up to `from + ahead`, in time order.
    pub fn visible(&self, from: f64, ahead: f64) -> impl Iterator<Item = &Note> {
        let end = from + ahead;
        self.notes.iter().filter(move |n| n.time >= from && n.time <= end)
    }

    fn take_where(&mut self, mut pred: impl FnMut(&Note) -> bool) -> Vec<Note> {
        let (taken, kept): (Vec<Note>, Vec<Note>) =
            std::mem::take(&mut self.notes).into_iter().partition(|n| pred(n));
        self.notes = kept;
        taken
    }
}

use serde::Serialize;

use crate::branch::BranchKey;
use crate::colour::Rgb;
use crate::tone::Tone;

/// A note as decoded from a branch's performance data, relative to the
/// start of that branch. Times are in beats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedNote {
    pub time: f64,
    /// How long the note sounds. Informational; hit logic only uses `time`.
    pub duration: f64,
    pub tone: Tone,
}

impl DecodedNote {
    pub fn end(&self) -> f64 {
        self.time + self.duration
    }
}

/// A playable note placed on the song timeline.
///
/// `branch` identifies the owning branch; it is compared, never followed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub time: f64,
    pub duration: f64,
    pub tone: Tone,
    pub branch: BranchKey,
    pub colour: Rgb,
}

impl Note {
    /// Within `forgiveness` beats of `beat_time`, exclusive at both edges.
    pub fn is_hittable(&self, beat_time: f64, forgiveness: f64) -> bool {
        let min_time = beat_time - forgiveness;
        let max_time = beat_time + forgiveness;
        min_time < self.time && self.time < max_time
    }

    /// Too far behind the cursor to be hit any more.
    pub fn is_expired(&self, beat_time: f64, forgiveness: f64) -> bool {
        self.time < beat_time - forgiveness
    }

    pub fn with_offset(&self, offset: f64) -> Note {
        Note {
            time: self.time + offset,
            ..self.clone()
        }
    }
}

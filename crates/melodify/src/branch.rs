//! Branches: named melodic segments placed at a start offset.
//!
//! A song is a binary tree of branches. Every branch that has a successor
//! offers two candidates, left and right, built from the same successor
//! melody but different tracks of its MIDI file.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::colour::{branch_colour, Rgb};
use crate::note::{DecodedNote, Note};

/// Id of the first branch of a song. It plays track 0 of its melody.
pub const ROOT_ID: u64 = 0;

/// Identity of a branch instance in the song tree.
///
/// The root is id 0 and its successors are 1 and 2; below that, the
/// successors of `id` are `id * 2 - 1` and `id * 2`. `depth` counts
/// generations from the root. The scheme maps id 1 to (1, 2) as well, so
/// `depth` is what keeps a branch distinct from its own left successor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BranchKey {
    pub name: Arc<str>,
    pub id: u64,
    pub depth: u32,
}

impl BranchKey {
    pub fn root(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            id: ROOT_ID,
            depth: 0,
        }
    }

    /// Keys of the (left, right) successors, both instances of `name`.
    ///
    /// Ids wrap on overflow; keys stay distinct from the parent through
    /// `depth` and from each other through the low bit.
    pub fn successors(&self, name: &Arc<str>) -> (BranchKey, BranchKey) {
        let (left, right) = if self.depth == 0 {
            (1, 2)
        } else {
            let right = self.id.wrapping_mul(2);
            (right.wrapping_sub(1), right)
        };
        let depth = self.depth + 1;
        (
            BranchKey {
                name: Arc::clone(name),
                id: left,
                depth,
            },
            BranchKey {
                name: Arc::clone(name),
                id: right,
                depth,
            },
        )
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.name, self.id, self.depth)
    }
}

/// Decoded content of one melody file, shared by every branch instance
/// that plays it.
#[derive(Debug, Clone, PartialEq)]
pub struct Melody {
    name: Arc<str>,
    tracks: Vec<Vec<DecodedNote>>,
    successor: Option<Arc<str>>,
}

impl Melody {
    /// `tracks` may not be empty; an empty list is replaced by one empty track.
    pub fn new(name: &str, mut tracks: Vec<Vec<DecodedNote>>, successor: Option<&str>) -> Self {
        if tracks.is_empty() {
            tracks.push(Vec::new());
        }
        Self {
            name: Arc::from(name),
            tracks,
            successor: successor.map(Arc::from),
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn successor(&self) -> Option<&Arc<str>> {
        self.successor.as_ref()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Notes of the track a branch with this id plays.
    pub fn track_for(&self, id: u64) -> &[DecodedNote] {
        &self.tracks[(id % self.tracks.len() as u64) as usize]
    }
}

/// An immutable branch instance: a melody at a start offset.
#[derive(Debug, Clone)]
pub struct Branch {
    key: BranchKey,
    start_time: f64,
    melody: Arc<Melody>,
}

impl Branch {
    pub fn new(key: BranchKey, start_time: f64, melody: Arc<Melody>) -> Self {
        debug_assert_eq!(key.name, melody.name, "branch key names a different melody");
        Self {
            key,
            start_time,
            melody,
        }
    }

    pub fn key(&self) -> &BranchKey {
        &self.key
    }

    pub fn id(&self) -> u64 {
        self.key.id
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn melody(&self) -> &Arc<Melody> {
        &self.melody
    }

    pub fn successor_name(&self) -> Option<&Arc<str>> {
        self.melody.successor()
    }

    pub fn colour(&self) -> Rgb {
        branch_colour(self.key.id, &self.key.name)
    }

    /// Decoded notes relative to this branch's start, in decode order.
    pub fn decoded(&self) -> &[DecodedNote] {
        self.melody.track_for(self.key.id)
    }

    /// Length from start to the last note's end; 0 with no notes.
    pub fn duration(&self) -> f64 {
        self.decoded().iter().map(DecodedNote::end).fold(0.0, f64::max)
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// Notes placed at this branch's start offset, sorted by time.
    ///
    /// Recomputed on every call from the shared decoded notes, so the same
    /// melody can be placed at many offsets without interference.
    pub fn notes(&self) -> Vec<Note> {
        let colour = self.colour();
        let mut notes: Vec<Note> = self
            .decoded()
            .iter()
            .map(|n| Note {
                time: n.time + self.start_time,
                duration: n.duration,
                tone: n.tone,
                branch: self.key.clone(),
                colour,
            })
            .collect();
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        notes
    }
}

/// The two queued successors of the active branch.
///
/// "Nothing queued" is `Option::<Candidates>::None`; there is no way to
/// queue just one.
#[derive(Debug, Clone)]
pub struct Candidates {
    pub left: Branch,
    pub right: Branch,
}

impl Candidates {
    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        [&self.left, &self.right].into_iter()
    }

    pub fn find(&self, key: &BranchKey) -> Option<&Branch> {
        self.iter().find(|b| b.key() == key)
    }

    pub fn end_time(&self) -> f64 {
        self.left.end_time().max(self.right.end_time())
    }
}

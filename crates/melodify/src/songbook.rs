//! Every melody a song can reach, loaded up front.
//!
//! Loading follows successor names from the root until the set closes, so
//! building a branch during play never touches the source again.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::branch::{Branch, BranchKey, Candidates, Melody};
use crate::source::BranchSource;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Songbook {
    root: Arc<str>,
    melodies: HashMap<Arc<str>, Arc<Melody>>,
}

impl Songbook {
    /// Load `root` and everything reachable from it through successor names.
    /// Cycles are fine; each melody is loaded once.
    pub fn load<S: BranchSource + ?Sized>(source: &S, root: &str) -> Result<Self> {
        let mut melodies: HashMap<Arc<str>, Arc<Melody>> = HashMap::new();
        let mut pending: VecDeque<String> = VecDeque::from([root.to_string()]);

        while let Some(name) = pending.pop_front() {
            if melodies.contains_key(name.as_str()) {
                continue;
            }
            let melody = source.load(&name)?;
            if let Some(next) = melody.successor() {
                if !melodies.contains_key(next) {
                    pending.push_back(next.to_string());
                }
            }
            debug!(name = %name, tracks = melody.track_count(), "songbook entry");
            melodies.insert(Arc::clone(melody.name()), Arc::new(melody));
        }

        info!(root, melodies = melodies.len(), "loaded song");
        Ok(Self {
            root: Arc::from(root),
            melodies,
        })
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.melodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.melodies.is_empty()
    }

    pub fn melody(&self, name: &str) -> Option<&Arc<Melody>> {
        self.melodies.get(name)
    }

    /// Melody names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.melodies.keys().map(|n| &**n).collect();
        names.sort_unstable();
        names
    }

    /// Build the branch `key` starting at `start_time`.
    pub fn branch(&self, key: BranchKey, start_time: f64) -> Result<Branch> {
        let melody = self
            .melodies
            .get(&key.name)
            .ok_or_else(|| Error::DataLoad {
                name: key.name.to_string(),
                reason: "melody is not part of this song".to_string(),
            })?;
        Ok(Branch::new(key, start_time, Arc::clone(melody)))
    }

    /// The first branch of the song.
    pub fn root_branch(&self, start_time: f64) -> Result<Branch> {
        self.branch(BranchKey::root(&self.root), start_time)
    }

    /// Left and right successors of `branch`, both starting where it ends.
    /// `None` at the end of the piece.
    pub fn candidates(&self, branch: &Branch) -> Option<Candidates> {
        let next = branch.successor_name()?;
        let Some(melody) = self.melodies.get(next) else {
            // load() closes over successors, so this only happens with a
            // branch from some other songbook
            warn!(branch = %branch.key(), next = %next, "successor not in songbook");
            return None;
        };
        let (left, right) = branch.key().successors(melody.name());
        let start = branch.end_time();
        Some(Candidates {
            left: Branch::new(left, start, Arc::clone(melody)),
            right: Branch::new(right, start, Arc::clone(melody)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::DecodedNote;
    use crate::source::MemorySource;
    use crate::tone::Tone;
    use pretty_assertions::assert_eq;

    fn note(time: f64, tone: Tone) -> DecodedNote {
        DecodedNote {
            time,
            duration: 1.0,
            tone,
        }
    }

    #[test]
    fn loads_successor_closure() {
        let source = MemorySource::new()
            .with("a", vec![vec![note(0.0, Tone::C)]], Some("b"))
            .with("b", vec![vec![note(0.0, Tone::D)]], Some("c"))
            .with("c", vec![vec![note(0.0, Tone::E)]], None)
            .with("unused", vec![], None);

        let book = Songbook::load(&source, "a").unwrap();
        assert_eq!(book.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cycles_terminate() {
        let source = MemorySource::new()
            .with("verse", vec![vec![note(0.0, Tone::C)]], Some("chorus"))
            .with("chorus", vec![vec![note(0.0, Tone::G)]], Some("verse"));

        let book = Songbook::load(&source, "verse").unwrap();
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn missing_successor_fails_the_load() {
        let source = MemorySource::new().with("a", vec![vec![note(0.0, Tone::C)]], Some("ghost"));
        let err = Songbook::load(&source, "a").unwrap_err();
        assert!(matches!(err, Error::DataLoad { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn candidates_start_at_parent_end() {
        let source = MemorySource::new()
            .with("a", vec![vec![note(0.0, Tone::C), note(2.0, Tone::D)]], Some("b"))
            .with("b", vec![vec![note(0.0, Tone::E)], vec![note(0.5, Tone::F)]], None);
        let book = Songbook::load(&source, "a").unwrap();

        let root = book.root_branch(4.0).unwrap();
        assert_eq!(root.end_time(), 7.0);

        let pair = book.candidates(&root).unwrap();
        assert_eq!((pair.left.id(), pair.right.id()), (1, 2));
        assert_eq!(pair.left.start_time(), 7.0);
        assert_eq!(pair.right.start_time(), 7.0);
        // ids pick different tracks
        assert_eq!(pair.left.notes()[0].tone, Tone::F);
        assert_eq!(pair.right.notes()[0].tone, Tone::E);
        assert_ne!(pair.left.key(), root.key());

        assert!(book.candidates(&pair.left).is_none());
    }

    #[test]
    fn unknown_branch_is_a_data_load_error() {
        let source = MemorySource::new().with("a", vec![vec![]], None);
        let book = Songbook::load(&source, "a").unwrap();
        assert!(book.branch(BranchKey::root("zzz"), 0.0).is_err());
    }
}

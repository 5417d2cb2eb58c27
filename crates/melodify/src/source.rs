//! Where branch melodies come from.
//!
//! A branch library on disk looks like:
//!
//! ```text
//! branches/
//!   midi/<name>.mid    one track per variant; a branch plays track `id % tracks`
//!   json/<name>.json   {"next_branch": "<name>"} or null at the end of a piece
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::branch::Melody;
use crate::decode::decode_smf;
use crate::note::DecodedNote;
use crate::{Error, Result};

/// Anything that can produce a decoded melody by name.
pub trait BranchSource {
    /// Load and decode `name`. Missing or malformed data is
    /// [`Error::DataLoad`].
    fn load(&self, name: &str) -> Result<Melody>;
}

/// Per-melody metadata file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchMetadata {
    #[serde(default)]
    pub next_branch: Option<String>,
}

/// A metadata file is normally an object, but a bare `"None"` (or `null`)
/// marks the end of a piece too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MetadataFile {
    Object(BranchMetadata),
    Bare(Option<String>),
}

impl BranchMetadata {
    /// Parse a metadata file in either form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        Ok(match serde_json::from_str(text)? {
            MetadataFile::Object(meta) => meta,
            MetadataFile::Bare(next_branch) => BranchMetadata { next_branch },
        })
    }

    /// Successor name; `null`, empty, and the literal `"None"` all mean the
    /// piece ends here.
    pub fn successor(&self) -> Option<&str> {
        self.next_branch
            .as_deref()
            .filter(|name| !name.is_empty() && *name != "None")
    }
}

/// Branch library rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn midi_path(&self, name: &str) -> PathBuf {
        self.root.join("midi").join(format!("{}.mid", name))
    }

    pub fn metadata_path(&self, name: &str) -> PathBuf {
        self.root.join("json").join(format!("{}.json", name))
    }
}

fn data_load(name: &str, reason: impl ToString) -> Error {
    Error::DataLoad {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

impl BranchSource for DirSource {
    fn load(&self, name: &str) -> Result<Melody> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(data_load(name, "not a valid branch name"));
        }

        let midi_path = self.midi_path(name);
        let bytes = std::fs::read(&midi_path)
            .map_err(|e| data_load(name, format!("{}: {}", midi_path.display(), e)))?;
        let tracks = decode_smf(&bytes)
            .map_err(|e| data_load(name, format!("{}: {}", midi_path.display(), e)))?;

        let meta_path = self.metadata_path(name);
        let meta_text = std::fs::read_to_string(&meta_path)
            .map_err(|e| data_load(name, format!("{}: {}", meta_path.display(), e)))?;
        let metadata = BranchMetadata::from_json(&meta_text)
            .map_err(|e| data_load(name, format!("{}: {}", meta_path.display(), e)))?;

        debug!(
            name,
            tracks = tracks.len(),
            next = metadata.successor().unwrap_or("-"),
            "loaded branch data"
        );

        Ok(Melody::new(name, tracks, metadata.successor()))
    }
}

/// In-memory branch library, for tests and generated songs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    melodies: HashMap<String, (Vec<Vec<DecodedNote>>, Option<String>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a melody with the given tracks and successor. Replaces any
    /// earlier melody of the same name.
    pub fn insert(
        &mut self,
        name: &str,
        tracks: Vec<Vec<DecodedNote>>,
        next: Option<&str>,
    ) -> &mut Self {
        self.melodies
            .insert(name.to_string(), (tracks, next.map(str::to_string)));
        self
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, name: &str, tracks: Vec<Vec<DecodedNote>>, next: Option<&str>) -> Self {
        self.insert(name, tracks, next);
        self
    }
}

impl BranchSource for MemorySource {
    fn load(&self, name: &str) -> Result<Melody> {
        let (tracks, next) = self
            .melodies
            .get(name)
            .ok_or_else(|| data_load(name, "no such melody"))?;
        Ok(Melody::new(name, tracks.clone(), next.as_deref()))
    }
}

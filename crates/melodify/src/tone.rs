//! The twelve pitch classes of one octave and where they sit on the keyboard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// A pitch class. Octave information is discarded on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tone {
    C,
    CS,
    D,
    DS,
    E,
    F,
    FS,
    G,
    GS,
    A,
    AS,
    B,
}

impl Tone {
    pub const ALL: [Tone; 12] = [
        Tone::C,
        Tone::CS,
        Tone::D,
        Tone::DS,
        Tone::E,
        Tone::F,
        Tone::FS,
        Tone::G,
        Tone::GS,
        Tone::A,
        Tone::AS,
        Tone::B,
    ];

    /// Pitch class of a MIDI key number. Works for any integer, so
    /// `from_midi(n) == from_midi(n + 12)` everywhere.
    pub fn from_midi(key: i32) -> Tone {
        Self::ALL[key.rem_euclid(12) as usize]
    }

    /// MIDI key number of this tone in the given octave (C4 = 60).
    pub fn midi_number(self, octave: i32) -> i32 {
        12 * (octave + 1) + self.index() as i32
    }

    /// Position in `Tone::ALL`, 0 for C through 11 for B.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Identifier used in data files and logs ("C", "CS", ...).
    pub fn name(self) -> &'static str {
        match self {
            Tone::C => "C",
            Tone::CS => "CS",
            Tone::D => "D",
            Tone::DS => "DS",
            Tone::E => "E",
            Tone::F => "F",
            Tone::FS => "FS",
            Tone::G => "G",
            Tone::GS => "GS",
            Tone::A => "A",
            Tone::AS => "AS",
            Tone::B => "B",
        }
    }

    /// Frequency in Hz of this tone in octave 3. Informational only.
    pub fn freq(self) -> f64 {
        match self {
            Tone::C => 130.81,
            Tone::CS => 138.59,
            Tone::D => 146.83,
            Tone::DS => 155.56,
            Tone::E => 164.81,
            Tone::F => 174.61,
            Tone::FS => 185.0,
            Tone::G => 196.0,
            Tone::GS => 207.65,
            Tone::A => 220.0,
            Tone::AS => 233.08,
            Tone::B => 246.94,
        }
    }

    pub fn is_black(self) -> bool {
        matches!(self, Tone::CS | Tone::DS | Tone::FS | Tone::GS | Tone::AS)
    }

    pub fn white_keys() -> [Tone; 7] {
        [Tone::C, Tone::D, Tone::E, Tone::F, Tone::G, Tone::A, Tone::B]
    }

    pub fn black_keys() -> [Tone; 5] {
        [Tone::CS, Tone::DS, Tone::FS, Tone::GS, Tone::AS]
    }

    /// Lane centres in units of one white key.
    ///
    /// The visible keyboard runs C..B plus a trailing C, so C owns two lanes.
    /// Black keys sit on the boundary between their neighbours.
    pub fn lane_positions(self) -> &'static [f64] {
        match self {
            Tone::C => &[0.5, 7.5],
            Tone::CS => &[1.0],
            Tone::D => &[1.5],
            Tone::DS => &[2.0],
            Tone::E => &[2.5],
            Tone::F => &[3.5],
            Tone::FS => &[4.0],
            Tone::G => &[4.5],
            Tone::GS => &[5.0],
            Tone::A => &[5.5],
            Tone::AS => &[6.0],
            Tone::B => &[6.5],
        }
    }

    /// Pixel x-coordinates of this tone's lanes for keys `width_scale` wide.
    pub fn to_x(self, width_scale: u32) -> Vec<u32> {
        let half = width_scale / 2;
        let white = |k: u32| width_scale * k + half;
        let black = |k: u32| width_scale * k + width_scale;
        match self {
            Tone::C => vec![white(0), white(7)],
            Tone::CS => vec![black(0)],
            Tone::D => vec![white(1)],
            Tone::DS => vec![black(1)],
            Tone::E => vec![white(2)],
            Tone::F => vec![white(3)],
            Tone::FS => vec![black(3)],
            Tone::G => vec![white(4)],
            Tone::GS => vec![black(4)],
            Tone::A => vec![white(5)],
            Tone::AS => vec![black(5)],
            Tone::B => vec![white(6)],
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognised tone identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tone: {0:?}")]
pub struct ParseToneError(pub String);

impl FromStr for Tone {
    type Err = ParseToneError;

    /// Accepts the identifiers from [`Tone::name`] and sharp spellings like "C#".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('#', "S");
        Tone::ALL
            .into_iter()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| ParseToneError(s.to_string()))
    }
}

/// One value per tone, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ToneMap<T>([T; 12]);

impl<T: Copy> ToneMap<T> {
    pub fn filled(value: T) -> Self {
        Self([value; 12])
    }
}

impl<T> ToneMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Tone, &T)> {
        Tone::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Tone, &mut T)> {
        Tone::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<Tone> for ToneMap<T> {
    type Output = T;

    fn index(&self, tone: Tone) -> &T {
        &self.0[tone.index()]
    }
}

impl<T> IndexMut<Tone> for ToneMap<T> {
    fn index_mut(&mut self, tone: Tone) -> &mut T {
        &mut self.0[tone.index()]
    }
}

//! Held-key state for the 12 tones.
//!
//! Keyboards and MIDI controllers report edges (press, release); the engine
//! wants a level snapshot per tick. `HeldTones` collapses one into the other.
//! Octaves are folded, so C3 and C4 both hold `Tone::C`.

use midly::live::LiveEvent;
use midly::MidiMessage;
use serde::Serialize;
use tracing::trace;

use crate::tone::{Tone, ToneMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeldTones(ToneMap<bool>);

impl HeldTones {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing held. Same as `new`, reads better at call sites.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn press(&mut self, tone: Tone) {
        self.0[tone] = true;
    }

    pub fn release(&mut self, tone: Tone) {
        self.0[tone] = false;
    }

    pub fn release_all(&mut self) {
        for (_, held) in self.0.iter_mut() {
            *held = false;
        }
    }

    pub fn is_held(&self, tone: Tone) -> bool {
        self.0[tone]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|(_, held)| *held)
    }

    pub fn iter(&self) -> impl Iterator<Item = Tone> + '_ {
        self.0.iter().filter(|(_, held)| **held).map(|(tone, _)| tone)
    }

    /// Apply one live MIDI message. Note-on with velocity above zero holds
    /// the tone; note-off or velocity zero releases it. Anything else,
    /// including bytes that do not parse, is ignored.
    pub fn apply_midi(&mut self, bytes: &[u8]) {
        let event = match LiveEvent::parse(bytes) {
            Ok(event) => event,
            Err(e) => {
                trace!(?bytes, error = %e, "ignoring unparseable MIDI input");
                return;
            }
        };

        if let LiveEvent::Midi { message, .. } = event {
            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    self.press(Tone::from_midi(key.as_int() as i32));
                }
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    self.release(Tone::from_midi(key.as_int() as i32));
                }
                _ => {}
            }
        }
    }
}

impl FromIterator<Tone> for HeldTones {
    fn from_iter<I: IntoIterator<Item = Tone>>(iter: I) -> Self {
        let mut held = HeldTones::new();
        for tone in iter {
            held.press(tone);
        }
        held
    }
}

//! Performance data → timed notes.
//!
//! A branch's MIDI track is reduced to note-on/note-off events per pitch
//! class, then paired into [`DecodedNote`]s measured in beats.

use midly::{MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::debug;

use crate::note::DecodedNote;
use crate::tone::{Tone, ToneMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    On,
    Off,
}

/// One note event with its delta from the previous event, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceEvent {
    pub delta_ticks: u32,
    pub kind: NoteEvent,
    pub key: u8,
}

impl PerformanceEvent {
    pub fn on(delta_ticks: u32, key: u8) -> Self {
        Self {
            delta_ticks,
            kind: NoteEvent::On,
            key,
        }
    }

    pub fn off(delta_ticks: u32, key: u8) -> Self {
        Self {
            delta_ticks,
            kind: NoteEvent::Off,
            key,
        }
    }
}

/// Why a MIDI file could not be turned into branch tracks.
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI parse error: {0}")]
    Parse(#[from] midly::Error),

    #[error("SMPTE timecode timing is not supported")]
    Timecode,

    #[error("ticks per beat must be non-zero")]
    ZeroTicksPerBeat,

    #[error("MIDI file has no tracks")]
    NoTracks,
}

/// Pair note-on/note-off events into notes.
///
/// Each tone is treated as monophonic: a second note-on while one is sounding
/// is ignored. A note-off with nothing sounding is repaired by assuming the
/// note began at tick 0, which recovers notes held over from before the track
/// started. The result is in completion order, not sorted.
pub fn decode(events: &[PerformanceEvent], ticks_per_beat: u16) -> Vec<DecodedNote> {
    debug_assert!(ticks_per_beat > 0, "ticks_per_beat must be non-zero");
    let tpb = ticks_per_beat.max(1) as f64;

    let mut open: ToneMap<Option<u64>> = ToneMap::filled(None);
    let mut notes = Vec::new();
    let mut now: u64 = 0;

    for event in events {
        now += event.delta_ticks as u64;
        let tone = Tone::from_midi(event.key as i32);

        match event.kind {
            NoteEvent::On => {
                if open[tone].is_none() {
                    open[tone] = Some(now);
                }
            }
            NoteEvent::Off => {
                let start = match open[tone].take() {
                    Some(start) => start,
                    None => {
                        debug!(%tone, tick = now, "note-off without note-on, assuming start at tick 0");
                        0
                    }
                };
                notes.push(DecodedNote {
                    time: start as f64 / tpb,
                    duration: (now - start) as f64 / tpb,
                    tone,
                });
            }
        }
    }

    notes
}

/// Reduce one SMF track to note events.
///
/// Deltas of everything that is not a note event are carried into the next
/// note event so absolute timing survives. A note-on with velocity 0 is a
/// note-off.
pub fn events_from_track(track: &[TrackEvent<'_>]) -> Vec<PerformanceEvent> {
    let mut events = Vec::new();
    let mut pending_delta: u32 = 0;

    for event in track {
        pending_delta = pending_delta.saturating_add(event.delta.as_int());

        let (kind, key) = match event.kind {
            TrackEventKind::Midi { message, .. } => match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => (NoteEvent::On, key),
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    (NoteEvent::Off, key)
                }
                _ => continue,
            },
            _ => continue,
        };

        events.push(PerformanceEvent {
            delta_ticks: pending_delta,
            kind,
            key: key.as_int(),
        });
        pending_delta = 0;
    }

    events
}

/// Parse a Standard MIDI File and decode every track.
///
/// Track `i` of the result holds the notes of track `i` of the file.
pub fn decode_smf(bytes: &[u8]) -> Result<Vec<Vec<DecodedNote>>, MidiError> {
    let smf = Smf::parse(bytes)?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(_, _) => return Err(MidiError::Timecode),
    };
    if ticks_per_beat == 0 {
        return Err(MidiError::ZeroTicksPerBeat);
    }
    if smf.tracks.is_empty() {
        return Err(MidiError::NoTracks);
    }

    Ok(smf
        .tracks
        .iter()
        .map(|track| decode(&events_from_track(track), ticks_per_beat))
        .collect())
}

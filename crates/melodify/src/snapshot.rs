//! Read-only view of a session for whatever draws it.

use serde::Serialize;

use crate::branch::BranchKey;
use crate::colour::Rgb;
use crate::progress::{ProgressTracker, Segment};
use crate::session::{Feedback, Flash, RoundEnd, Session, SessionState};
use crate::tone::Tone;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleNote {
    pub time: f64,
    pub tone: Tone,
    pub colour: Rgb,
    pub branch_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToneFeedback {
    pub tone: Tone,
    pub kind: Feedback,
    pub frames: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ghost {
    pub tone: Tone,
    pub time: f64,
    pub colour: Rgb,
    /// 1.0 when fresh, falling towards 0.0.
    pub fade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StateView {
    Playing,
    GameOver { end: RoundEnd },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: StateView,
    pub beat: f64,
    pub bpm: f64,
    pub score: u64,
    pub health: u32,
    pub max_health: u32,
    pub active: BranchKey,
    pub notes: Vec<VisibleNote>,
    pub feedback: Vec<ToneFeedback>,
    pub held: Vec<Tone>,
    pub flash: Flash,
    pub segments: Vec<Segment>,
    pub marker_colour: Rgb,
    pub progress: f64,
    pub total_estimate: f64,
    pub ghosts: Vec<Ghost>,
}

impl Session {
    pub fn snapshot(&self) -> Snapshot {
        let config = self.config();
        let beat = self.time();
        let total = self.total_estimate();
        let fade_frames = config.ghost_fade_frames.max(1) as f64;

        Snapshot {
            state: match self.state() {
                SessionState::Playing => StateView::Playing,
                SessionState::GameOver(end) => StateView::GameOver { end },
            },
            beat,
            bpm: config.bpm,
            score: self.score(),
            health: self.health(),
            max_health: self.max_health(),
            active: self.active().key().clone(),
            notes: self
                .timeline()
                .visible(beat - config.forgiveness, config.visible_beats + config.forgiveness)
                .map(|n| VisibleNote {
                    time: n.time,
                    tone: n.tone,
                    colour: n.colour,
                    branch_id: n.branch.id,
                })
                .collect(),
            feedback: self
                .feedback()
                .iter()
                .filter(|(_, flash)| flash.is_lit())
                .map(|(tone, flash)| ToneFeedback {
                    tone,
                    kind: flash.kind,
                    frames: flash.frames,
                })
                .collect(),
            held: self.held().iter().collect(),
            flash: self.flash(),
            segments: self.progress().segments().to_vec(),
            marker_colour: self.progress().marker_colour(beat, config.marker_fade_beats),
            progress: ProgressTracker::ratio(beat, total),
            total_estimate: total,
            ghosts: self
                .ghosts()
                .iter()
                .map(|g| Ghost {
                    tone: g.tone,
                    time: g.time,
                    colour: g.colour,
                    fade: g.frames_left as f64 / fade_frames,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HeldTones;
    use crate::note::DecodedNote;
    use crate::songbook::Songbook;
    use crate::source::MemorySource;
    use melodify_conf::GameplayConfig;
    use std::sync::Arc;

    fn session() -> Session {
        let notes = vec![
            DecodedNote { time: 1.0, duration: 0.5, tone: Tone::C },
            DecodedNote { time: 2.0, duration: 0.5, tone: Tone::E },
            DecodedNote { time: 30.0, duration: 0.5, tone: Tone::G },
        ];
        let source = MemorySource::new().with("a", vec![notes], None);
        let book = Arc::new(Songbook::load(&source, "a").unwrap());
        let config = GameplayConfig {
            bpm: 60.0,
            lead_in_beats: 0.0,
            ..GameplayConfig::default()
        };
        Session::new(book, config).unwrap()
    }

    #[test]
    fn only_nearby_notes_are_visible() {
        let s = session();
        let snap = s.snapshot();
        let tones: Vec<Tone> = snap.notes.iter().map(|n| n.tone).collect();
        assert_eq!(tones, vec![Tone::C, Tone::E]);
        assert_eq!(snap.state, StateView::Playing);
        assert_eq!(snap.segments.len(), 1);
        assert_eq!(snap.health, snap.max_health);
    }

    #[test]
    fn hit_shows_feedback_and_ghost() {
        let mut s = session();
        let held: HeldTones = [Tone::C].into_iter().collect();
        s.tick(1000.0, &held);
        let snap = s.snapshot();

        assert_eq!(snap.score, 10);
        assert_eq!(snap.held, vec![Tone::C]);
        assert_eq!(snap.feedback.len(), 1);
        assert_eq!(snap.feedback[0].kind, Feedback::Hit);
        assert_eq!(snap.ghosts.len(), 1);
        assert!(snap.ghosts[0].fade > 0.9 && snap.ghosts[0].fade < 1.0);
    }

    #[test]
    fn serializes_to_json() {
        let s = session();
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["state"]["state"], "playing");
        assert_eq!(json["notes"][0]["tone"], "C");
        assert_eq!(json["segments"][0]["end"], serde_json::Value::Null);
    }
}

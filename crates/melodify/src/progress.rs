//! Progress bar bookkeeping: which branch coloured which stretch of the song.

use serde::Serialize;

use crate::colour::Rgb;

/// A stretch of the song played under one branch. `end` is `None` for the
/// segment currently being played.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: f64,
    pub end: Option<f64>,
    pub colour: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTracker {
    segments: Vec<Segment>,
    old_colour: Rgb,
    fade_start: Option<f64>,
}

impl ProgressTracker {
    /// One open segment from `start`.
    pub fn new(start: f64, colour: Rgb) -> Self {
        Self {
            segments: vec![Segment {
                start,
                end: None,
                colour,
            }],
            old_colour: colour,
            fade_start: None,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn current_colour(&self) -> Rgb {
        self.segments.last().map_or(self.old_colour, |s| s.colour)
    }

    /// Close the open segment at `at` and open one in `colour`.
    pub fn switch(&mut self, at: f64, colour: Rgb) {
        let previous = self.current_colour();
        if let Some(open) = self.segments.last_mut() {
            open.end = Some(at);
        }
        self.segments.push(Segment {
            start: at,
            end: None,
            colour,
        });
        self.old_colour = previous;
        self.fade_start = Some(at);
    }

    /// Marker colour at `beat_time`, blending from the previous branch
    /// colour to the current one over `fade_beats`.
    pub fn marker_colour(&self, beat_time: f64, fade_beats: f64) -> Rgb {
        let current = self.current_colour();
        match self.fade_start {
            Some(start) if fade_beats > 0.0 => {
                let t = (beat_time - start) / fade_beats;
                self.old_colour.lerp(current, t)
            }
            _ => current,
        }
    }

    /// Fraction of `total` covered at `beat_time`, clamped to `[0, 1]`.
    pub fn ratio(beat_time: f64, total: f64) -> f64 {
        if total <= 0.0 {
            return 0.0;
        }
        (beat_time / total).clamp(0.0, 1.0)
    }
}

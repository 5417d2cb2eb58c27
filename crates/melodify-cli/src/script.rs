//! Where a headless round gets its key presses from.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::Path;

use melodify::{HeldTones, Session, Tone};

/// Which candidate an autoplayer steers towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Left,
    Right,
}

/// Timed key states. Each entry holds its tones from its beat until the
/// next entry.
///
/// ```text
/// # beat  tones
/// 0.9     C
/// 1.2
/// 2.4     E G
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    entries: Vec<(f64, Vec<Tone>)>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Bad script {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: Vec<(f64, Vec<Tone>)> = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }
            let mut words = line.split_whitespace();
            let beat: f64 = match words.next().map(str::parse::<f64>) {
                Some(Ok(beat)) => beat,
                _ => bail!("line {}: expected a beat number", lineno + 1),
            };
            if let Some((last, _)) = entries.last() {
                if beat < *last {
                    bail!("line {}: beat {} goes backwards", lineno + 1, beat);
                }
            }
            let tones = words
                .map(|w| {
                    w.parse::<Tone>()
                        .with_context(|| format!("line {}: unknown tone {:?}", lineno + 1, w))
                })
                .collect::<Result<Vec<_>>>()?;
            entries.push((beat, tones));
        }
        Ok(Self { entries })
    }

    /// Key state at `beat`.
    pub fn held_at(&self, beat: f64) -> HeldTones {
        self.entries
            .iter()
            .take_while(|(at, _)| *at <= beat)
            .last()
            .map(|(_, tones)| tones.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Drop a trailing comment. A comment starts at a `#` that opens the line
/// or follows whitespace, so sharps like `D#` survive.
fn strip_comment(line: &str) -> &str {
    let mut prev_is_space = true;
    for (i, c) in line.char_indices() {
        if c == '#' && prev_is_space {
            return &line[..i];
        }
        prev_is_space = c.is_whitespace();
    }
    line
}

pub enum Input {
    Script(Script),
    Autoplay(Side),
}

impl Input {
    /// Keys to hold for the tick that will land on `beat`.
    pub fn held(&self, session: &Session, beat: f64) -> HeldTones {
        match self {
            Input::Script(script) => script.held_at(beat),
            Input::Autoplay(side) => autoplay(session, beat, *side),
        }
    }
}

/// Hold every note that will be hittable at `beat`, from the active branch
/// or the candidate on `side`.
pub fn autoplay(session: &Session, beat: f64, side: Side) -> HeldTones {
    let wanted = session.queued().map(|pair| match side {
        Side::Left => pair.left.key(),
        Side::Right => pair.right.key(),
    });
    let forgiveness = session.config().forgiveness;
    session
        .timeline()
        .notes()
        .iter()
        .filter(|n| n.is_hittable(beat, forgiveness))
        .filter(|n| &n.branch == session.active().key() || Some(&n.branch) == wanted)
        .map(|n| n.tone)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_entries_and_comments() {
        let script = Script::parse("# warm up\n0.9 C\n1.2\n\n2.4 E G # chord\n").unwrap();
        assert_eq!(
            script.entries,
            vec![
                (0.9, vec![Tone::C]),
                (1.2, vec![]),
                (2.4, vec![Tone::E, Tone::G]),
            ]
        );
    }

    #[test]
    fn held_follows_latest_entry() {
        let script = Script::parse("1 C\n2\n3 D#").unwrap();
        assert!(script.held_at(0.5).is_empty());
        assert!(script.held_at(1.5).is_held(Tone::C));
        assert!(script.held_at(2.0).is_empty());
        assert!(script.held_at(9.0).is_held(Tone::DS));
    }

    #[test]
    fn sharps_are_not_comments() {
        let script = Script::parse("1 D# F#  # both sharps\n#2 C\n").unwrap();
        assert_eq!(script.entries, vec![(1.0, vec![Tone::DS, Tone::FS])]);
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(Script::parse("C 1").is_err());
        assert!(Script::parse("1 H").is_err());
        assert!(Script::parse("2 C\n1 D").is_err());
    }
}

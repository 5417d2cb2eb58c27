//! Whole rounds played against a branch library on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use melodify::session::time_to_beats;
use melodify::{
    BranchKey, BranchSource, DirSource, EndReason, Error, Game, HeldTones, Session, SessionState,
    Songbook, Tone,
};
use melodify_conf::GameplayConfig;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const PPQ: u16 = 480;
const TICK_MS: f64 = 50.0;

/// Format-1 SMF, one track per entry. Notes are (beat, length, key).
fn smf(tracks: &[&[(f64, f64, u8)]]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&PPQ.to_be_bytes());

    for notes in tracks {
        // (tick, status, key); offs sort before ons at the same tick
        let mut events: Vec<(u32, u8, u8)> = Vec::new();
        for &(beat, len, key) in *notes {
            let on = (beat * PPQ as f64) as u32;
            let off = ((beat + len) * PPQ as f64) as u32;
            events.push((on, 0x90, key));
            events.push((off, 0x80, key));
        }
        events.sort_by_key(|&(tick, status, _)| (tick, status));

        let mut data = Vec::new();
        let mut last = 0;
        for (tick, status, key) in events {
            write_vlq(&mut data, tick - last);
            last = tick;
            let vel = if status == 0x90 { 100 } else { 0 };
            data.extend_from_slice(&[status, key, vel]);
        }
        data.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&data);
    }
    buf
}

fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    buf.extend_from_slice(&bytes);
}

fn write_branch(root: &Path, name: &str, tracks: &[&[(f64, f64, u8)]], next: Option<&str>) {
    fs::create_dir_all(root.join("midi")).unwrap();
    fs::create_dir_all(root.join("json")).unwrap();
    fs::write(root.join("midi").join(format!("{name}.mid")), smf(tracks)).unwrap();
    let meta = serde_json::json!({ "next_branch": next.unwrap_or("None") });
    fs::write(root.join("json").join(format!("{name}.json")), meta.to_string()).unwrap();
}

/// a -> b -> c, where b and c each offer two different tracks.
///
/// a: C at 0, 1, 2 (ends 2.5)
/// b: track 0 E,F / track 1 G,A at 0 and 1 (placed at 2.5, ends 4.0)
/// c: track 0 C,D / track 1 D,C at 0 and 1 (placed at 4.0, ends 5.5)
fn library() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_branch(root, "a", &[&[(0.0, 0.5, 60), (1.0, 0.5, 60), (2.0, 0.5, 60)]], Some("b"));
    write_branch(
        root,
        "b",
        &[&[(0.0, 0.5, 64), (1.0, 0.5, 65)], &[(0.0, 0.5, 67), (1.0, 0.5, 69)]],
        Some("c"),
    );
    write_branch(
        root,
        "c",
        &[&[(0.0, 0.5, 60), (1.0, 0.5, 62)], &[(0.0, 0.5, 62), (1.0, 0.5, 60)]],
        None,
    );
    write_branch(root, "solo", &[&[(1.0, 0.5, 60), (2.0, 0.5, 62), (3.0, 0.5, 64)]], None);
    write_branch(
        root,
        "long",
        &[&[
            (0.0, 0.5, 60),
            (1.0, 0.5, 62),
            (2.0, 0.5, 64),
            (3.0, 0.5, 65),
            (4.0, 0.5, 67),
            (5.0, 0.5, 69),
            (6.0, 0.5, 71),
            (7.0, 0.5, 72),
        ]],
        None,
    );
    // y's two tracks open on the same E, then differ
    write_branch(root, "x", &[&[(0.0, 0.5, 60)]], Some("y"));
    write_branch(
        root,
        "y",
        &[&[(0.0, 0.5, 64), (1.0, 0.5, 67)], &[(0.0, 0.5, 64), (1.0, 0.5, 69)]],
        None,
    );
    dir
}

fn config() -> GameplayConfig {
    GameplayConfig {
        bpm: 60.0,
        forgiveness: 0.25,
        max_health: 5,
        lead_in_beats: 0.0,
        ..GameplayConfig::default()
    }
}

fn session(dir: &TempDir, song: &str) -> Session {
    let book = Songbook::load(&DirSource::new(dir.path()), song).unwrap();
    Session::new(Arc::new(book), config()).unwrap()
}

/// Tick until the round ends, choosing held tones with `policy`, which sees
/// the session and the beat the coming tick will land on.
fn play(
    session: &mut Session,
    mut policy: impl FnMut(&Session, f64) -> HeldTones,
    max_ticks: usize,
) -> Vec<(u64, u32)> {
    let mut trace = Vec::new();
    for _ in 0..max_ticks {
        if !session.is_playing() {
            break;
        }
        let next = session.time() + time_to_beats(TICK_MS, session.config().bpm);
        let held = policy(session, next);
        session.tick(TICK_MS, &held);
        trace.push((session.score(), session.health()));
    }
    trace
}

/// Holds every hittable note of the active branch, and of the preferred
/// candidate.
fn perfect(prefer_right: bool) -> impl FnMut(&Session, f64) -> HeldTones {
    move |s, beat| {
        let wanted = s.queued().map(|pair| {
            if prefer_right {
                pair.right.key().clone()
            } else {
                pair.left.key().clone()
            }
        });
        s.timeline()
            .notes()
            .iter()
            .filter(|n| n.is_hittable(beat, s.config().forgiveness))
            .filter(|n| &n.branch == s.active().key() || Some(&n.branch) == wanted.as_ref())
            .map(|n| n.tone)
            .collect()
    }
}

fn nothing(_: &Session, _: f64) -> HeldTones {
    HeldTones::none()
}

fn game_over(session: &Session) -> (u64, EndReason) {
    match session.state() {
        SessionState::GameOver(end) => (end.score, end.reason),
        SessionState::Playing => panic!("round still playing"),
    }
}

#[test]
fn score_and_health_are_monotonic() {
    let dir = library();
    let mut s = session(&dir, "a");
    let mut i = 0usize;
    let trace = play(
        &mut s,
        |_, _| {
            i += 1;
            [Tone::ALL[(i * 5) % 12], Tone::ALL[(i * 7) % 12]].into_iter().collect()
        },
        1000,
    );

    assert!(!s.is_playing());
    for pair in trace.windows(2) {
        assert!(pair[1].0 >= pair[0].0, "score went down: {:?}", pair);
        assert!(pair[1].1 <= pair[0].1, "health went up: {:?}", pair);
    }
}

#[test]
fn ignoring_a_branch_costs_one_health_per_note() {
    let dir = library();
    let mut s = session(&dir, "solo");
    play(&mut s, nothing, 1000);

    assert_eq!(s.health(), 5 - 3);
    assert_eq!(game_over(&s), (0, EndReason::PieceExhausted));
}

#[test]
fn five_misses_end_the_round_with_the_earlier_score() {
    let dir = library();
    let mut s = session(&dir, "long");
    let mut hit_two = perfect(false);
    play(
        &mut s,
        |s, beat| if beat < 1.5 { hit_two(s, beat) } else { HeldTones::none() },
        1000,
    );

    assert_eq!(game_over(&s), (20, EndReason::HealthExhausted));
    assert_eq!(s.health(), 0);
    // the last note was never reached
    assert_eq!(s.timeline().len(), 1);
    assert!(s.snapshot().ghosts.is_empty());
}

#[test]
fn clean_play_ends_at_full_health() {
    let dir = library();
    let mut s = session(&dir, "solo");
    play(&mut s, perfect(false), 1000);

    assert_eq!(s.health(), 5);
    assert_eq!(game_over(&s), (30, EndReason::PieceExhausted));
}

#[test]
fn choosing_right_twice_walks_the_tree() {
    let dir = library();
    let mut s = session(&dir, "a");
    assert_eq!(s.progress().segments().len(), 1);
    assert_eq!(s.progress().segments()[0].end, None);

    let mut switches = Vec::new();
    for _ in 0..1000 {
        if !s.is_playing() {
            break;
        }
        let next = s.time() + time_to_beats(TICK_MS, s.config().bpm);
        let held = perfect(true)(&s, next);
        if let Some(key) = s.tick(TICK_MS, &held).switched_to {
            switches.push(key);
        }
    }

    let path: Vec<(String, u64, u32)> = switches
        .iter()
        .map(|k| (k.name.to_string(), k.id, k.depth))
        .collect();
    assert_eq!(path, vec![("b".to_string(), 2, 1), ("c".to_string(), 4, 2)]);

    let segments = s.progress().segments();
    assert_eq!(segments.len(), switches.len() + 1);
    assert!(segments[..segments.len() - 1].iter().all(|seg| seg.end.is_some()));
    assert_eq!(segments.last().and_then(|seg| seg.end), None);

    // 3 notes of a, 2 of b, 2 of c
    assert_eq!(game_over(&s), (70, EndReason::PieceExhausted));
    assert_eq!(s.health(), 5);
}

#[test]
fn shared_opening_note_defers_the_choice() {
    let dir = library();
    let mut s = session(&dir, "x");
    let e: HeldTones = [Tone::E].into_iter().collect();
    let a: HeldTones = [Tone::A].into_iter().collect();
    let c: HeldTones = [Tone::C].into_iter().collect();

    s.tick(0.0, &c);
    // both candidates have E at 0.5
    let report = s.tick(500.0, &e);
    assert_eq!(report.hits, 2);
    assert_eq!(report.switched_to, None);
    assert_eq!(s.active().name(), "x");

    // A at 1.5 only exists on the left (odd id plays track 1)
    let report = s.tick(1000.0, &a);
    assert_eq!(report.switched_to.map(|k| k.id), Some(1));
    assert_eq!(s.active().name(), "y");
}

#[test]
fn placement_only_shifts_note_times() {
    let dir = library();
    let book = Songbook::load(&DirSource::new(dir.path()), "a").unwrap();
    let early = book.branch(BranchKey::root("b"), 1.0).unwrap();
    let late = book.branch(BranchKey::root("b"), 7.5).unwrap();

    let (early, late) = (early.notes(), late.notes());
    assert_eq!(early.len(), late.len());
    for (e, l) in early.iter().zip(&late) {
        assert_eq!(l.time - e.time, 6.5);
        assert_eq!(l.duration, e.duration);
        assert_eq!(l.tone, e.tone);
    }
}

#[test]
fn missing_song_does_not_start() {
    let dir = library();
    let mut game = Game::new(DirSource::new(dir.path()), config()).unwrap();

    let err = game.start("nope").unwrap_err();
    assert!(matches!(err, Error::DataLoad { ref name, .. } if name == "nope"));
    assert!(game.session().is_none());
    assert!(matches!(
        game.tick(TICK_MS, &HeldTones::none()),
        Err(Error::NoSession)
    ));
}

#[test]
fn dangling_successor_fails_at_load() {
    let dir = library();
    write_branch(dir.path(), "broken", &[&[(0.0, 1.0, 60)]], Some("absent"));
    let source = DirSource::new(dir.path());

    assert!(source.load("broken").is_ok());
    assert!(Songbook::load(&source, "broken").is_err());
}

#[test]
fn game_records_each_round() {
    let dir = library();
    let mut game = Game::new(DirSource::new(dir.path()), config()).unwrap();

    game.start("solo").unwrap();
    while game.session().is_some_and(Session::is_playing) {
        game.tick(TICK_MS, &HeldTones::none()).unwrap();
    }
    game.restart().unwrap();
    while game.session().is_some_and(Session::is_playing) {
        let s = game.session().unwrap();
        let next = s.time() + time_to_beats(TICK_MS, s.config().bpm);
        let held = perfect(false)(s, next);
        game.tick(TICK_MS, &held).unwrap();
    }

    assert_eq!(game.leaderboard().scores(), &[30, 0]);
    assert_eq!(game.leaderboard().best(), Some(30));
}

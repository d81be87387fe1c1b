/// End-to-end editing sessions: decode, arrange, play, scrub and trim
/// against simulated resources.
use std::sync::Arc;

use parking_lot::Mutex;
use playback::*;
use timeline::{format_time, parse_time_input, ElementId, ElementPatch, MediaKind, TimeWindow};

fn config(max_time: f64) -> EngineConfig {
    EngineConfig {
        max_time,
        ..EngineConfig::default()
    }
}

fn clip(name: &str) -> DecodedMedia {
    DecodedMedia {
        kind: MediaKind::Video,
        src: format!("blob:{name}"),
        filename: name.to_string(),
        natural_width: 1280,
        natural_height: 720,
    }
}

fn add_clip(
    session: &mut EditorSession,
    name: &str,
    window: TimeWindow,
) -> (ElementId, Arc<Mutex<SimulatedResource>>) {
    let res = Arc::new(Mutex::new(SimulatedResource::new(name)));
    let id = session.on_media_decoded(clip(name), Some(Box::new(res.clone())));
    session.update_element(
        id,
        &ElementPatch {
            start_time: Some(window.start),
            end_time: Some(window.end),
            ..ElementPatch::default()
        },
    );
    (id, res)
}

#[test]
fn test_play_jumps_to_next_element() {
    let mut session = EditorSession::new(config(30.0));
    let (a, a_res) = add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    let (b, b_res) = add_clip(&mut session, "b.mp4", TimeWindow::new(15.0, 25.0));

    session.seek(12.0);
    assert!(session.visible_elements().is_empty());

    assert!(session.toggle_play());
    assert_eq!(session.clock().current_time(), 15.0);
    assert!(session.clock().is_playing());

    // Only B is on screen and running
    assert_eq!(session.driver().state(a), Some(SyncState::Hidden));
    assert_eq!(session.driver().state(b), Some(SyncState::VisiblePlaying));
    assert!(!a_res.lock().visible);
    assert!(b_res.lock().playing);
}

#[test]
fn test_end_trim_before_start_is_rejected() {
    let mut session = EditorSession::new(config(60.0));
    let (id, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(2.0, 8.0));
    let before = session.registry().clone();

    assert!(session.begin_trim(id, TrimEdge::End));
    // 10 / 600 * 60 = 1.0
    assert!(!session.move_trim(10.0, 600.0));
    session.end_trim();

    assert_eq!(session.registry(), &before);
    assert_eq!(session.element(id).unwrap().window, TimeWindow::new(2.0, 8.0));
}

#[test]
fn test_start_update_past_end_extends_window() {
    let mut session = EditorSession::default();
    let (id, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(2.0, 8.0));

    let updated = session
        .update_element(id, &ElementPatch::start_time(9.0))
        .unwrap();
    assert_eq!(updated.window, TimeWindow::new(9.0, 10.0));
}

#[test]
fn test_start_trim_crossing_end_leaves_registry_unchanged() {
    let mut session = EditorSession::default();
    let (id, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(2.0, 8.0));
    let before = session.registry().clone();

    session.begin_trim(id, TrimEdge::Start);
    assert!(!session.move_trim(900.0, 1000.0));
    assert_eq!(session.registry(), &before);
}

#[test]
fn test_play_with_nothing_ahead_changes_nothing() {
    let mut session = EditorSession::new(config(30.0));
    add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    session.seek(20.0);

    assert!(!session.toggle_play());
    assert_eq!(session.clock().current_time(), 20.0);
    assert!(!session.clock().is_playing());
    assert_eq!(session.tick(), TickOutcome::Idle);
    assert_eq!(session.clock().current_time(), 20.0);
}

#[test]
fn test_window_end_is_exclusive() {
    let mut session = EditorSession::default();
    let (id, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(2.0, 8.0));

    session.seek(2.0);
    assert_eq!(session.snapshot().visible, vec![id]);
    session.seek(8.0);
    assert!(session.snapshot().visible.is_empty());
}

#[test]
fn test_playback_runs_through_window_and_stops() {
    let mut session = EditorSession::default();
    let (id, res) = add_clip(&mut session, "a.mp4", TimeWindow::new(1.0, 3.0));
    session.seek(1.0);
    assert!(session.toggle_play());

    let mut ticks = 0;
    loop {
        // The resource keeps pace with the clock, so no seeks are needed
        res.lock().advance(0.1);
        if session.tick() != TickOutcome::Advanced {
            break;
        }
        ticks += 1;
        assert_eq!(res.lock().log.seeks, vec![0.0]);
        assert!(ticks < 100);
    }

    assert_eq!(ticks, 19);
    assert_eq!(session.clock().current_time(), 2.9);
    assert!(!session.clock().is_playing());
    assert_eq!(session.driver().state(id), Some(SyncState::VisiblePaused));
    assert!(!res.lock().playing);
}

#[test]
fn test_playback_hands_off_between_adjacent_elements() {
    let mut session = EditorSession::new(config(30.0));
    let (a, a_res) = add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    let (b, b_res) = add_clip(&mut session, "b.mp4", TimeWindow::new(10.0, 20.0));
    session.seek(9.8);
    assert!(session.toggle_play());
    assert_eq!(session.clock().current_time(), 9.8);

    for expected in [9.9, 10.0, 10.1] {
        a_res.lock().advance(0.1);
        b_res.lock().advance(0.1);
        assert_eq!(session.tick(), TickOutcome::Advanced);
        assert_eq!(session.clock().current_time(), expected);
    }

    // 10.0 belongs to B alone, and the clock never stopped on the seam
    assert!(session.clock().is_playing());
    assert_eq!(session.snapshot().visible, vec![b]);
    assert_eq!(session.driver().state(a), Some(SyncState::Hidden));
    assert_eq!(session.driver().state(b), Some(SyncState::VisiblePlaying));
    assert!(!a_res.lock().visible);
    assert!(!a_res.lock().playing);
    assert!(b_res.lock().playing);
}

#[test]
fn test_scrub_repositions_resources() {
    let mut session = EditorSession::new(config(30.0));
    let (_, a_res) = add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    let (_, b_res) = add_clip(&mut session, "b.mp4", TimeWindow::new(15.0, 25.0));

    // 600 / 1000 * 30 = 18
    assert_eq!(session.scrub(600.0, 1000.0), Some(18.0));
    assert!(!a_res.lock().visible);
    let b = b_res.lock();
    assert!(b.visible);
    assert_eq!(b.position, 3.0);

    drop(b);
    // Scrubbing back before B's window rewinds it for the next entry
    session.scrub(100.0, 1000.0);
    assert_eq!(b_res.lock().position, 0.0);
    assert!(a_res.lock().visible);
}

#[test]
fn test_click_element_selects_and_pauses() {
    let mut session = EditorSession::new(config(30.0));
    let (a, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    let (b, _) = add_clip(&mut session, "b.mp4", TimeWindow::new(15.0, 25.0));
    assert_eq!(session.registry().selected(), Some(b));

    session.seek(4.0);
    session.toggle_play();
    assert!(session.click_element(a));
    assert_eq!(session.registry().selected(), Some(a));
    assert_eq!(session.clock().current_time(), 0.0);
    assert!(!session.clock().is_playing());
}

#[test]
fn test_refused_play_keeps_intent_and_retries() {
    let mut session = EditorSession::default();
    let res = Arc::new(Mutex::new(SimulatedResource::new("blocked")));
    res.lock().refuse_play = true;
    session.on_media_decoded(clip("blocked.mp4"), Some(Box::new(res.clone())));

    assert!(session.toggle_play());
    session.tick();
    session.tick();
    assert!(session.clock().is_playing());
    let r = res.lock();
    assert!(!r.playing);
    assert_eq!(r.log.plays, 3);
}

#[test]
fn test_late_resource_starts_when_ready() {
    let mut session = EditorSession::default();
    let res = Arc::new(Mutex::new(SimulatedResource::loading("slow")));
    let id = session.on_media_decoded(clip("slow.mp4"), Some(Box::new(res.clone())));

    session.toggle_play();
    assert!(session.driver().has_pending_play(id));
    res.lock().ready = ReadyState::HaveEnoughData;
    assert!(session.resource_ready(id));
    assert!(res.lock().playing);
}

#[test]
fn test_manual_entry_rejects_and_clamps() {
    let mut session = EditorSession::default();
    let (id, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(2.0, 8.0));

    assert_eq!(
        session.set_start_text(id, "2.5"),
        TimeEntry::Rejected {
            display: "00:02.0".to_string()
        }
    );
    assert_eq!(
        session.set_end_text(id, "00:01.0"),
        TimeEntry::Accepted(2.1)
    );
    assert_eq!(session.element(id).unwrap().window, TimeWindow::new(2.0, 2.1));
}

#[test]
fn test_registry_invariant_holds_after_arbitrary_updates() {
    let mut session = EditorSession::default();
    let (id, _) = add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    let values = [-3.0, 0.0, 0.5, 4.0, 9.9, 10.0, 30.0, f64::NAN, 59.9];

    for &start in &values {
        for &end in &values {
            session.update_element(
                id,
                &ElementPatch {
                    start_time: Some(start),
                    end_time: Some(end),
                    ..ElementPatch::default()
                },
            );
            let w = session.element(id).unwrap().window;
            assert!(0.0 <= w.start && w.start < w.end, "{w:?}");
        }
    }
}

#[test]
fn test_clock_stays_in_range_under_any_input() {
    let mut session = EditorSession::new(config(5.0));
    add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 100.0));

    for t in [-10.0, 2.5, 99.0, f64::INFINITY, f64::NAN] {
        session.seek(t);
        let now = session.clock().current_time();
        assert!((0.0..=5.0).contains(&now));
    }
    session.seek(0.0);
    session.toggle_play();
    for _ in 0..200 {
        session.tick();
        let now = session.clock().current_time();
        assert!((0.0..=5.0).contains(&now));
    }
}

#[test]
fn test_format_parse_round_trip() {
    for tenths in 0..=600 {
        let t = tenths as f64 / 10.0;
        assert_eq!(parse_time_input(&format_time(t)).unwrap(), t);
    }
}

#[test]
fn test_removing_everything_resets_session() {
    let mut session = EditorSession::default();
    let (a, a_res) = add_clip(&mut session, "a.mp4", TimeWindow::new(0.0, 10.0));
    let (b, _) = add_clip(&mut session, "b.mp4", TimeWindow::new(0.0, 10.0));
    session.seek(5.0);
    session.toggle_play();

    session.remove_element(a);
    assert!(!a_res.lock().playing);
    assert!(session.clock().is_playing());

    session.remove_element(b);
    assert_eq!(session.clock().current_time(), 0.0);
    assert!(!session.clock().is_playing());
    assert!(!session.driver().is_attached(a));
    assert!(!session.driver().is_attached(b));
}

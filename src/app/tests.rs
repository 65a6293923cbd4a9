use super::*;
use crate::catalog::{Album, CatalogError, Song};
use crate::engine::{MediaEngine, Notification};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Attach,
    Detach,
    Load(String),
    Clear,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
}

#[derive(Default)]
struct EngineLog {
    calls: Vec<Call>,
    source: Option<String>,
    listener: Option<Sender<Notification>>,
}

/// In-memory engine. The log is shared so tests can inspect it after the
/// controller is gone.
struct FakeEngine {
    source: Option<String>,
    log: Rc<RefCell<EngineLog>>,
}

impl FakeEngine {
    fn new() -> (Self, Rc<RefCell<EngineLog>>) {
        let log = Rc::new(RefCell::new(EngineLog::default()));
        (
            Self {
                source: None,
                log: log.clone(),
            },
            log,
        )
    }
}

fn emit(log: &Rc<RefCell<EngineLog>>, n: Notification) -> bool {
    log.borrow()
        .listener
        .as_ref()
        .map(|tx| tx.send(n).is_ok())
        .unwrap_or(false)
}

fn count(log: &Rc<RefCell<EngineLog>>, f: impl Fn(&Call) -> bool) -> usize {
    log.borrow().calls.iter().filter(|c| f(c)).count()
}

impl MediaEngine for FakeEngine {
    fn load(&mut self, src: &str) {
        self.source = Some(src.to_string());
        let mut log = self.log.borrow_mut();
        log.source = Some(src.to_string());
        log.calls.push(Call::Load(src.to_string()));
    }

    fn clear(&mut self) {
        self.source = None;
        let mut log = self.log.borrow_mut();
        log.source = None;
        log.calls.push(Call::Clear);
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn play(&mut self) {
        self.log.borrow_mut().calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.log.borrow_mut().calls.push(Call::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.log.borrow_mut().calls.push(Call::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        self.log.borrow_mut().calls.push(Call::SetVolume(volume));
    }

    fn attach(&mut self, listener: Sender<Notification>) {
        let mut log = self.log.borrow_mut();
        log.listener = Some(listener);
        log.calls.push(Call::Attach);
    }

    fn detach(&mut self) {
        let mut log = self.log.borrow_mut();
        log.listener = None;
        log.calls.push(Call::Detach);
    }
}

fn song(title: &str, duration: f64) -> Song {
    Song {
        title: title.into(),
        duration,
        audio_src: format!("/music/{}.mp3", title.to_ascii_lowercase()),
    }
}

fn album(songs: Vec<Song>) -> Album {
    Album {
        slug: "test-album".into(),
        title: "Test Album".into(),
        artist: "Test Artist".into(),
        album_cover: "/covers/test.png".into(),
        release_info: "2024 Test Records".into(),
        songs,
    }
}

fn two_songs() -> Album {
    album(vec![song("A", 180.0), song("B", 200.0)])
}

fn three_songs() -> Album {
    album(vec![song("A", 180.0), song("B", 200.0), song("C", 95.0)])
}

fn controller(a: Album) -> (PlaybackController<FakeEngine>, Rc<RefCell<EngineLog>>) {
    let (engine, log) = FakeEngine::new();
    let c = PlaybackController::new(a, engine, 0.5).unwrap();
    (c, log)
}

#[test]
fn format_time_renders_minutes_and_padded_seconds() {
    assert_eq!(format_time(f64::NAN), "-:--");
    assert_eq!(format_time(65.0), "1:05");
    assert_eq!(format_time(5.0), "0:05");
    assert_eq!(format_time(600.0), "10:00");
    assert_eq!(format_time(0.0), "0:00");
    assert_eq!(format_time(59.999), "0:59");
}

#[test]
fn format_time_has_no_hours_field() {
    assert_eq!(format_time(3600.0), "60:00");
    assert_eq!(format_time(3725.0), "62:05");
}

#[test]
fn format_time_placeholder_for_non_finite_or_negative() {
    assert_eq!(format_time(f64::INFINITY), "-:--");
    assert_eq!(format_time(-1.0), "-:--");
}

#[test]
fn new_attaches_loads_first_song_and_seeds_state() {
    let (c, log) = controller(two_songs());

    assert_eq!(
        log.borrow().calls,
        vec![
            Call::Attach,
            Call::Load("/music/a.mp3".into()),
            Call::SetVolume(0.5)
        ]
    );
    assert_eq!(c.engine().source(), Some("/music/a.mp3"));

    let s = c.state();
    assert_eq!(s.current, 0);
    assert_eq!(s.current_time, 0.0);
    assert_eq!(s.duration, 180.0);
    assert_eq!(s.volume, 0.5);
    assert_eq!(s.status, PlaybackStatus::Paused);
    assert_eq!(s.hovered, None);
    assert_eq!(c.current_song().title, "A");
}

#[test]
fn new_rejects_album_without_songs() {
    let (engine, log) = FakeEngine::new();
    let err = PlaybackController::new(album(vec![]), engine, 0.5).err().unwrap();
    assert!(matches!(err, CatalogError::EmptyAlbum(_)));
    assert!(log.borrow().calls.is_empty());
}

#[test]
fn select_song_loads_once_and_is_idempotent() {
    let (mut c, log) = controller(two_songs());

    c.select_song(1);
    assert_eq!(c.state().current, 1);
    assert_eq!(c.state().duration, 200.0);
    assert_eq!(c.engine().source(), Some("/music/b.mp3"));
    assert_eq!(c.state().status, PlaybackStatus::Paused);

    c.select_song(1);
    assert_eq!(count(&log, |call| matches!(call, Call::Load(_))), 2);
}

#[test]
fn select_song_outside_album_is_ignored() {
    let (mut c, log) = controller(two_songs());
    c.select_song(5);
    assert_eq!(c.state().current, 0);
    assert_eq!(count(&log, |call| matches!(call, Call::Load(_))), 1);
}

#[test]
fn play_and_pause_flip_status() {
    let (mut c, log) = controller(two_songs());
    c.play();
    assert!(c.state().is_playing());
    c.pause();
    assert!(!c.state().is_playing());
    assert_eq!(count(&log, |call| *call == Call::Play), 1);
    assert_eq!(count(&log, |call| *call == Call::Pause), 1);
}

#[test]
fn activating_current_row_while_playing_pauses_without_reload() {
    let (mut c, log) = controller(two_songs());
    c.play();

    c.on_row_activate(0);
    assert_eq!(c.state().status, PlaybackStatus::Paused);
    assert_eq!(c.state().current, 0);
    assert_eq!(c.engine().source(), Some("/music/a.mp3"));
    assert_eq!(count(&log, |call| matches!(call, Call::Load(_))), 1);
}

#[test]
fn activating_current_row_while_paused_resumes_without_reload() {
    let (mut c, log) = controller(two_songs());
    c.on_row_activate(0);
    assert!(c.state().is_playing());
    assert_eq!(count(&log, |call| matches!(call, Call::Load(_))), 1);
}

#[test]
fn activating_other_row_while_playing_switches_and_plays() {
    let (mut c, _log) = controller(two_songs());
    c.play();

    c.on_row_activate(1);
    assert_eq!(c.engine().source(), Some("/music/b.mp3"));
    assert_eq!(c.state().current, 1);
    assert_eq!(c.state().status, PlaybackStatus::Playing);
}

#[test]
fn toggle_play_follows_current_row() {
    let (mut c, _log) = controller(two_songs());
    c.select_song(1);
    c.toggle_play();
    assert!(c.state().is_playing());
    assert_eq!(c.state().current, 1);
    c.toggle_play();
    assert!(!c.state().is_playing());
}

#[test]
fn previous_at_first_song_is_clamped_and_replays() {
    let (mut c, log) = controller(three_songs());
    c.previous();
    assert_eq!(c.state().current, 0);
    assert!(c.state().is_playing());
    assert_eq!(count(&log, |call| matches!(call, Call::Load(_))), 1);
}

#[test]
fn next_at_last_song_is_clamped_and_replays() {
    let (mut c, _log) = controller(three_songs());
    c.select_song(2);
    c.next();
    assert_eq!(c.state().current, 2);
    assert!(c.state().is_playing());
}

#[test]
fn previous_and_next_move_by_one() {
    let (mut c, _log) = controller(three_songs());
    c.next();
    c.next();
    assert_eq!(c.state().current, 2);
    c.previous();
    assert_eq!(c.state().current, 1);
    assert_eq!(c.engine().source(), Some("/music/b.mp3"));
}

#[test]
fn seek_is_optimistic() {
    let (mut c, log) = controller(two_songs());
    c.select_song(1);

    c.seek(0.5);
    assert_eq!(c.state().current_time, 100.0);
    assert_eq!(log.borrow().calls.last(), Some(&Call::Seek(100.0)));
}

#[test]
fn seek_clamps_fraction() {
    let (mut c, _log) = controller(two_songs());
    c.seek(1.5);
    assert_eq!(c.state().current_time, 180.0);
    c.seek(-0.2);
    assert_eq!(c.state().current_time, 0.0);
}

#[test]
fn seek_with_unknown_duration_is_ignored() {
    let (mut c, log) = controller(two_songs());
    c.handle_notification(Notification::DurationChange(f64::NAN));

    c.seek(0.5);
    assert_eq!(c.state().current_time, 0.0);
    assert_eq!(count(&log, |call| matches!(call, Call::Seek(_))), 0);
}

#[test]
fn seek_by_moves_relative_and_stays_inside_song() {
    let (mut c, _log) = controller(two_songs());
    c.seek_by(30.0);
    assert_eq!(c.state().current_time, 30.0);
    c.seek_by(-45.0);
    assert_eq!(c.state().current_time, 0.0);
    c.seek_by(1000.0);
    assert_eq!(c.state().current_time, 180.0);
}

#[test]
fn set_volume_mirrors_and_clamps() {
    let (mut c, log) = controller(two_songs());
    c.set_volume(0.8);
    assert_eq!(c.state().volume, 0.8);
    assert_eq!(log.borrow().calls.last(), Some(&Call::SetVolume(0.8)));

    c.set_volume(1.7);
    assert_eq!(c.state().volume, 1.0);
    c.change_volume(-0.25);
    assert_eq!(c.state().volume, 0.75);
}

#[test]
fn pump_applies_engine_notifications() {
    let (mut c, log) = controller(two_songs());

    assert!(emit(&log, Notification::DurationChange(181.5)));
    assert!(emit(&log, Notification::TimeUpdate(12.25)));
    assert!(emit(&log, Notification::VolumeChange(0.4)));
    assert_eq!(c.pump(), 3);

    let s = c.state();
    assert_eq!(s.duration, 181.5);
    assert_eq!(s.current_time, 12.25);
    assert_eq!(s.volume, 0.4);
    assert_eq!(c.pump(), 0);
}

#[test]
fn notifications_commute() {
    let (mut a, _la) = controller(two_songs());
    let (mut b, _lb) = controller(two_songs());
    let ns = [
        Notification::TimeUpdate(175.0),
        Notification::DurationChange(170.0),
        Notification::VolumeChange(0.9),
    ];

    for n in ns {
        a.handle_notification(n);
    }
    for n in ns.iter().rev() {
        b.handle_notification(*n);
    }
    assert_eq!(a.state(), b.state());
    assert_eq!(a.state().current_time, 170.0);
    assert_eq!(a.state().duration, 170.0);
}

#[test]
fn shorter_duration_pulls_current_time_back() {
    let (mut c, _log) = controller(two_songs());
    c.handle_notification(Notification::TimeUpdate(175.0));
    c.handle_notification(Notification::DurationChange(170.0));
    assert_eq!(c.state().current_time, 170.0);

    // Unknown duration leaves the playhead alone.
    c.handle_notification(Notification::DurationChange(f64::NAN));
    assert_eq!(c.state().current_time, 170.0);
}

#[test]
fn time_update_is_clamped_to_known_duration() {
    let (mut c, _log) = controller(two_songs());
    c.handle_notification(Notification::TimeUpdate(500.0));
    assert_eq!(c.state().current_time, 180.0);

    c.handle_notification(Notification::DurationChange(f64::NAN));
    c.handle_notification(Notification::TimeUpdate(500.0));
    assert_eq!(c.state().current_time, 500.0);
}

#[test]
fn status_is_not_derived_from_engine_notifications() {
    let (mut c, log) = controller(two_songs());
    c.play();
    emit(&log, Notification::TimeUpdate(180.0));
    c.pump();
    // End of track: still playing, no auto-advance.
    assert!(c.state().is_playing());
    assert_eq!(c.state().current, 0);
}

#[test]
fn teardown_detaches_and_clears_exactly_once() {
    let (mut c, log) = controller(two_songs());
    c.teardown();
    c.teardown();

    assert_eq!(c.engine().source(), None);
    assert!(log.borrow().listener.is_none());
    assert_eq!(count(&log, |call| *call == Call::Detach), 1);
    assert_eq!(count(&log, |call| *call == Call::Clear), 1);

    drop(c);
    assert_eq!(count(&log, |call| *call == Call::Detach), 1);
}

#[test]
fn notifications_after_teardown_are_never_observed() {
    let (mut c, log) = controller(two_songs());
    let before = c.state().clone();

    c.teardown();
    assert!(!emit(&log, Notification::TimeUpdate(42.0)));
    c.handle_notification(Notification::VolumeChange(0.1));
    assert_eq!(c.pump(), 0);
    assert_eq!(c.state(), &before);
}

#[test]
fn drop_tears_down() {
    let (c, log) = controller(two_songs());
    drop(c);
    assert!(log.borrow().listener.is_none());
    assert_eq!(log.borrow().source, None);
    assert_eq!(count(&log, |call| *call == Call::Clear), 1);
}

#[test]
fn hover_is_bounded_to_the_album() {
    let (mut c, _log) = controller(three_songs());
    c.hover(Some(2));
    assert_eq!(c.state().hovered, Some(2));
    c.hover(Some(3));
    assert_eq!(c.state().hovered, None);

    c.hover_by(1);
    assert_eq!(c.state().hovered, Some(1));
    c.hover_by(10);
    assert_eq!(c.state().hovered, Some(2));
    c.hover_by(-10);
    assert_eq!(c.state().hovered, Some(0));
}

#[test]
fn subscribers_receive_snapshots_on_change_only() {
    let (mut c, _log) = controller(two_songs());
    let rx = c.subscribe();

    c.play();
    let snap = rx.try_recv().unwrap();
    assert!(snap.is_playing());

    // Already playing: nothing to publish.
    c.play();
    assert!(rx.try_recv().is_err());

    c.handle_notification(Notification::DurationChange(f64::NAN));
    assert!(rx.try_recv().unwrap().duration.is_nan());
    c.handle_notification(Notification::DurationChange(f64::NAN));
    assert!(rx.try_recv().is_err());
}

#[test]
fn revision_only_moves_on_effective_updates() {
    let a = two_songs();
    let mut store = StateStore::new(PlaybackState::new(&a, 0.5));
    assert_eq!(store.revision(), 0);

    assert!(!store.update(|s| s.volume = 0.5));
    assert_eq!(store.revision(), 0);

    assert!(store.update(|s| s.volume = 0.7));
    assert!(store.update(|s| s.current_time = 1.0));
    assert_eq!(store.revision(), 2);

    assert!(!store.update(|s| s.current_time = 1.0));
    assert_eq!(store.revision(), 2);
}

#[test]
fn controller_revision_tracks_state_changes() {
    let (mut c, _log) = controller(two_songs());
    let start = c.revision();

    c.pause();
    assert_eq!(c.revision(), start);

    c.play();
    assert_eq!(c.revision(), start + 1);
}

#[test]
fn store_prunes_dropped_subscribers() {
    let a = two_songs();
    let mut store = StateStore::new(PlaybackState::new(&a, 0.5));
    let kept = store.subscribe();
    drop(store.subscribe());

    assert!(store.update(|s| s.current_time = 3.0));
    assert!(!store.update(|s| s.current_time = 3.0));
    assert_eq!(kept.try_recv().unwrap().current_time, 3.0);
}

#[test]
fn progress_is_zero_when_duration_unknown() {
    let a = two_songs();
    let mut s = PlaybackState::new(&a, 0.5);
    s.current_time = 90.0;
    assert_eq!(s.progress(), 0.5);
    s.duration = f64::NAN;
    assert_eq!(s.progress(), 0.0);
}

#[test]
fn end_to_end_two_song_album() {
    let (mut c, _log) = controller(two_songs());
    assert_eq!(c.state().current, 0);
    assert!(!c.state().is_playing());

    c.on_row_activate(0);
    assert!(c.state().is_playing());
    assert_eq!(c.engine().source(), Some("/music/a.mp3"));

    c.next();
    assert_eq!(c.engine().source(), Some("/music/b.mp3"));
    assert!(c.state().is_playing());
    assert_eq!(c.state().current, 1);

    let before = c.state().clone();
    c.next();
    assert_eq!(c.state(), &before);
    assert_eq!(c.engine().source(), Some("/music/b.mp3"));
}

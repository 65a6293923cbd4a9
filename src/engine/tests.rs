use super::listener::Listener;
use super::player::RodioEngine;
use super::thread::{clamp_volume, needs_reload};
use super::types::{MediaEngine, Notification};
use crate::config::EngineSettings;
use rodio::Sink;
use rodio::source::SineWave;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

const MISSING: &str = "/nonexistent/encore/missing.mp3";
const WAIT: Duration = Duration::from_secs(2);

/// A real engine attached to a fresh channel. Tests only load paths that do
/// not exist, so no sink is ever opened and the outcome does not depend on an
/// audio device being present.
fn attached_engine() -> (RodioEngine, mpsc::Receiver<Notification>) {
    let mut engine = RodioEngine::new(EngineSettings {
        tick_ms: 10,
        quit_fade_out_ms: 0,
    });
    let (tx, rx) = mpsc::channel();
    engine.attach(tx);
    (engine, rx)
}

fn next(rx: &mpsc::Receiver<Notification>) -> Notification {
    rx.recv_timeout(WAIT).expect("engine notification")
}

fn is_unknown_duration(n: Notification) -> bool {
    matches!(n, Notification::DurationChange(d) if d.is_nan())
}

#[test]
fn listener_delivers_only_while_attached() {
    let listener = Listener::default();
    assert!(!listener.emit(Notification::TimeUpdate(1.0)));

    let (tx, rx) = mpsc::channel();
    listener.attach(tx);
    assert!(listener.is_attached());
    assert!(listener.emit(Notification::VolumeChange(0.25)));
    assert_eq!(rx.try_recv().unwrap(), Notification::VolumeChange(0.25));

    listener.detach();
    assert!(!listener.is_attached());
    assert!(!listener.emit(Notification::TimeUpdate(2.0)));
    assert!(rx.try_recv().is_err());
}

#[test]
fn listener_clones_share_the_same_slot() {
    let listener = Listener::default();
    let thread_side = listener.clone();

    let (tx, rx) = mpsc::channel();
    listener.attach(tx);
    assert!(thread_side.emit(Notification::DurationChange(42.0)));
    assert_eq!(rx.try_recv().unwrap(), Notification::DurationChange(42.0));

    listener.detach();
    assert!(!thread_side.emit(Notification::DurationChange(43.0)));
}

#[test]
fn listener_detaches_itself_when_receiver_is_dropped() {
    let listener = Listener::default();
    let (tx, rx) = mpsc::channel();
    listener.attach(tx);
    drop(rx);

    assert!(!listener.emit(Notification::TimeUpdate(0.0)));
    assert!(!listener.is_attached());
}

#[test]
fn clamp_volume_bounds_and_rejects_nan() {
    assert_eq!(clamp_volume(0.3), Some(0.3));
    assert_eq!(clamp_volume(-1.0), Some(0.0));
    assert_eq!(clamp_volume(7.0), Some(1.0));
    assert_eq!(clamp_volume(f64::NAN), None);
}

#[test]
fn empty_or_missing_sink_needs_reload() {
    assert!(needs_reload(None));

    let (sink, _queue) = Sink::new();
    assert!(needs_reload(Some(&sink)));

    sink.append(SineWave::new(440.0));
    assert!(!needs_reload(Some(&sink)));
}

#[test]
fn load_resets_duration_then_time() {
    let (mut engine, rx) = attached_engine();
    engine.load(MISSING);
    assert_eq!(engine.source(), Some(MISSING));

    assert!(is_unknown_duration(next(&rx)));
    assert_eq!(next(&rx), Notification::TimeUpdate(0.0));
}

#[test]
fn seek_reports_the_target_time() {
    let (mut engine, rx) = attached_engine();
    engine.load(MISSING);
    next(&rx);
    next(&rx);

    engine.seek(12.5);
    assert_eq!(next(&rx), Notification::TimeUpdate(12.5));

    engine.seek(-3.0);
    assert_eq!(next(&rx), Notification::TimeUpdate(0.0));
}

#[test]
fn set_volume_reports_clamped_value_and_skips_nan() {
    let (mut engine, rx) = attached_engine();

    engine.set_volume(1.5);
    assert_eq!(next(&rx), Notification::VolumeChange(1.0));

    engine.set_volume(f64::NAN);
    engine.set_volume(0.25);
    assert_eq!(next(&rx), Notification::VolumeChange(0.25));
}

#[test]
fn play_without_playable_source_is_silent_and_clear_resets_duration() {
    let (mut engine, rx) = attached_engine();
    engine.load(MISSING);
    next(&rx);
    next(&rx);

    engine.play();
    engine.clear();
    assert_eq!(engine.source(), None);
    // Nothing was emitted for the play; the next notification comes from clear.
    assert!(is_unknown_duration(next(&rx)));
}

#[test]
fn detach_stops_delivery() {
    let (mut engine, rx) = attached_engine();
    engine.detach();
    engine.set_volume(0.3);

    assert_eq!(rx.recv_timeout(WAIT), Err(RecvTimeoutError::Disconnected));
}

#[test]
fn drop_detaches_and_joins_the_thread() {
    let (mut engine, rx) = attached_engine();
    engine.load(MISSING);
    drop(engine);

    // Whatever was delivered before the drop is still readable, then the
    // channel is closed.
    let delivered: Vec<Notification> = rx.try_iter().collect();
    assert!(delivered.len() <= 2);
    assert_eq!(rx.recv_timeout(WAIT), Err(RecvTimeoutError::Disconnected));
}

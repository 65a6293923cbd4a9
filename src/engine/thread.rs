use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::catalog::probe_duration;
use crate::config::EngineSettings;

use super::listener::Listener;
use super::sink::create_sink;
use super::types::{EngineCmd, Notification};

/// A sink with nothing queued (never opened, or played to the end) has to be
/// rebuilt from the loaded file before it can play or seek again.
pub(super) fn needs_reload(sink: Option<&Sink>) -> bool {
    sink.is_none_or(Sink::empty)
}

/// Clamp a requested volume into `[0, 1]`. `NaN` yields `None`.
pub(super) fn clamp_volume(v: f64) -> Option<f64> {
    if v.is_nan() { None } else { Some(v.clamp(0.0, 1.0)) }
}

pub(super) fn spawn_engine_thread(
    rx: Receiver<EngineCmd>,
    listener: Listener,
    settings: EngineSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut s) => {
                // rodio logs to stderr when the stream is dropped, which would land on the TUI.
                s.log_on_drop(false);
                Some(s)
            }
            Err(e) => {
                error!(error = %e, "no audio output device, playback will be silent");
                None
            }
        };

        let tick = Duration::from_millis(settings.tick_ms.max(1));
        let mut next_tick = Instant::now() + tick;

        let mut sink: Option<Sink> = None;
        let mut loaded: Option<PathBuf> = None;
        let mut volume: f32 = 1.0;
        let mut last_pos: Option<Duration> = None;

        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(EngineCmd::Load(path)) => {
                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    last_pos = None;
                    listener.emit(Notification::DurationChange(f64::NAN));
                    listener.emit(Notification::TimeUpdate(0.0));

                    let (new_sink, total) = open(stream.as_ref(), &path, volume);
                    sink = new_sink;
                    loaded = Some(path.clone());

                    let duration = total
                        .map(|d| d.as_secs_f64())
                        .or_else(|| probe_duration(&path));
                    if let Some(d) = duration {
                        listener.emit(Notification::DurationChange(d));
                    }
                    debug!(path = %path.display(), ?duration, "source loaded");
                }
                Ok(EngineCmd::Clear) => {
                    if let Some(s) = sink.take() {
                        s.stop();
                    }
                    loaded = None;
                    last_pos = None;
                    listener.emit(Notification::DurationChange(f64::NAN));
                }
                Ok(EngineCmd::Play) => {
                    if needs_reload(sink.as_ref()) {
                        sink = reopen(stream.as_ref(), loaded.as_deref(), volume);
                        last_pos = None;
                        if sink.is_some() {
                            listener.emit(Notification::TimeUpdate(0.0));
                        }
                    }
                    if let Some(ref s) = sink {
                        s.play();
                    } else {
                        debug!("play ignored, nothing loaded");
                    }
                }
                Ok(EngineCmd::Pause) => {
                    if let Some(ref s) = sink {
                        s.pause();
                    }
                }
                Ok(EngineCmd::Seek(secs)) => {
                    let Ok(target) = Duration::try_from_secs_f64(secs.max(0.0)) else {
                        warn!(secs, "ignoring seek to invalid position");
                        continue;
                    };
                    if needs_reload(sink.as_ref()) {
                        sink = reopen(stream.as_ref(), loaded.as_deref(), volume);
                    }
                    if let Some(ref s) = sink {
                        if let Err(e) = s.try_seek(target) {
                            warn!(error = %e, secs, "seek failed");
                        }
                    }
                    last_pos = None;
                    listener.emit(Notification::TimeUpdate(target.as_secs_f64()));
                }
                Ok(EngineCmd::SetVolume(v)) => {
                    let Some(v) = clamp_volume(v) else {
                        continue;
                    };
                    volume = v as f32;
                    if let Some(ref s) = sink {
                        s.set_volume(volume);
                    }
                    listener.emit(Notification::VolumeChange(v));
                }
                Ok(EngineCmd::Quit { fade_out_ms }) => {
                    if let Some(s) = sink.take() {
                        if !s.is_paused() {
                            fade_out_sink(&s, volume, fade_out_ms);
                        }
                        s.stop();
                    }
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if Instant::now() >= next_tick {
                next_tick = Instant::now() + tick;
                if let Some(ref s) = sink {
                    if !s.is_paused() && !s.empty() {
                        let pos = s.get_pos();
                        if last_pos != Some(pos) {
                            last_pos = Some(pos);
                            listener.emit(Notification::TimeUpdate(pos.as_secs_f64()));
                        }
                    }
                }
            }
        }
        debug!("engine thread stopped");
    })
}

fn open(stream: Option<&OutputStream>, path: &Path, volume: f32) -> (Option<Sink>, Option<Duration>) {
    let Some(stream) = stream else {
        return (None, None);
    };
    match create_sink(stream, path, volume) {
        Ok((s, total)) => (Some(s), total),
        Err(e) => {
            warn!(error = %e, "could not load source");
            (None, None)
        }
    }
}

/// Rebuild a paused sink for `path`, starting from the beginning.
fn reopen(stream: Option<&OutputStream>, path: Option<&Path>, volume: f32) -> Option<Sink> {
    let path = path?;
    debug!(path = %path.display(), "reopening finished source");
    open(stream, path, volume).0
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

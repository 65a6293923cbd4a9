use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use tracing::warn;

use crate::config::EngineSettings;

use super::listener::Listener;
use super::thread::spawn_engine_thread;
use super::types::{EngineCmd, MediaEngine, Notification};

/// rodio-backed `MediaEngine`. The audio thread is stopped and joined on drop.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    listener: Listener,
    source: Option<String>,
    quit_fade_out_ms: u64,
    join: Option<JoinHandle<()>>,
}

impl RodioEngine {
    pub fn new(settings: EngineSettings) -> Self {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let listener = Listener::default();
        let quit_fade_out_ms = settings.quit_fade_out_ms;
        let join = spawn_engine_thread(rx, listener.clone(), settings);

        Self {
            tx,
            listener,
            source: None,
            quit_fade_out_ms,
            join: Some(join),
        }
    }

    fn send(&self, cmd: EngineCmd) {
        if let Err(e) = self.tx.send(cmd) {
            warn!(cmd = ?e.0, "engine thread is gone");
        }
    }
}

impl MediaEngine for RodioEngine {
    fn load(&mut self, src: &str) {
        self.source = Some(src.to_string());
        self.send(EngineCmd::Load(PathBuf::from(src)));
    }

    fn clear(&mut self) {
        self.source = None;
        self.send(EngineCmd::Clear);
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn play(&mut self) {
        self.send(EngineCmd::Play);
    }

    fn pause(&mut self) {
        self.send(EngineCmd::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(EngineCmd::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        self.send(EngineCmd::SetVolume(volume));
    }

    fn attach(&mut self, listener: Sender<Notification>) {
        self.listener.attach(listener);
    }

    fn detach(&mut self) {
        self.listener.detach();
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.listener.detach();
        let _ = self.tx.send(EngineCmd::Quit {
            fade_out_ms: self.quit_fade_out_ms,
        });
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

use std::sync::mpsc::{self, Receiver};

use tracing::{debug, warn};

use crate::catalog::{Album, CatalogError, Song};
use crate::engine::{MediaEngine, Notification};

use super::model::{PlaybackState, PlaybackStatus};
use super::store::StateStore;

/// Owns the media engine for one album and translates between user intents,
/// engine calls and engine notifications.
///
/// Intent handlers run to completion on the caller's thread. Engine
/// notifications queue up on an internal channel and are applied by `pump`.
pub struct PlaybackController<E: MediaEngine> {
    album: Album,
    engine: E,
    store: StateStore,
    notifications: Receiver<Notification>,
    attached: bool,
}

impl<E: MediaEngine> PlaybackController<E> {
    /// Attach to `engine`, load the album's first song and apply `initial_volume`.
    pub fn new(album: Album, mut engine: E, initial_volume: f64) -> Result<Self, CatalogError> {
        let Some(first) = album.songs.first() else {
            return Err(CatalogError::EmptyAlbum(album.slug.clone()));
        };

        let (tx, rx) = mpsc::channel();
        engine.attach(tx);
        engine.load(&first.audio_src);

        let state = PlaybackState::new(&album, initial_volume);
        engine.set_volume(state.volume);
        debug!(album = %album.slug, songs = album.len(), "controller attached");

        Ok(Self {
            album,
            engine,
            store: StateStore::new(state),
            notifications: rx,
            attached: true,
        })
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn state(&self) -> &PlaybackState {
        self.store.get()
    }

    pub fn current_song(&self) -> &Song {
        // `current` only ever holds an index that was checked against the album.
        &self.album.songs[self.store.get().current]
    }

    /// Revision of the underlying store; changes whenever the state does.
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Subscribe to state snapshots published after every change.
    pub fn subscribe(&mut self) -> Receiver<PlaybackState> {
        self.store.subscribe()
    }

    /// Make song `index` current, loading it into the engine if it is not already.
    pub fn select_song(&mut self, index: usize) {
        let Some(song) = self.album.song(index) else {
            warn!(index, "ignoring selection outside the album");
            return;
        };
        if index == self.store.get().current {
            return;
        }

        self.engine.load(&song.audio_src);
        let duration = song.duration;
        debug!(index, title = %song.title, "song selected");
        self.store.update(|s| {
            s.current = index;
            s.current_time = 0.0;
            s.duration = duration;
        });
    }

    pub fn play(&mut self) {
        self.engine.play();
        self.store.update(|s| s.status = PlaybackStatus::Playing);
    }

    pub fn pause(&mut self) {
        self.engine.pause();
        self.store.update(|s| s.status = PlaybackStatus::Paused);
    }

    /// A click on a track row: toggles the current song off when it is playing,
    /// otherwise switches to the row (if needed) and plays.
    pub fn on_row_activate(&mut self, index: usize) {
        if index >= self.album.len() {
            return;
        }
        let state = self.store.get();
        if index == state.current && state.is_playing() {
            self.pause();
        } else {
            self.select_song(index);
            self.play();
        }
    }

    /// The transport's play/pause button: same as activating the current row.
    pub fn toggle_play(&mut self) {
        self.on_row_activate(self.store.get().current);
    }

    /// Play the previous song. Stays on the first song instead of wrapping.
    pub fn previous(&mut self) {
        let index = self.store.get().current.saturating_sub(1);
        self.select_song(index);
        self.play();
    }

    /// Play the next song. Stays on the last song instead of wrapping.
    pub fn next(&mut self) {
        let last = self.album.len().saturating_sub(1);
        let index = (self.store.get().current + 1).min(last);
        self.select_song(index);
        self.play();
    }

    /// Seek to `fraction` of the current duration. The new time is shown right
    /// away without waiting for the engine to confirm it.
    pub fn seek(&mut self, fraction: f64) {
        let duration = self.store.get().duration;
        if !duration.is_finite() || fraction.is_nan() {
            debug!(fraction, "seek ignored, duration unknown");
            return;
        }

        self.seek_to(duration * fraction.clamp(0.0, 1.0));
    }

    /// Move the playhead by `delta` seconds, staying inside the song.
    pub fn seek_by(&mut self, delta: f64) {
        let (time, duration) = {
            let s = self.store.get();
            (s.current_time, s.duration)
        };
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        self.seek_to((time + delta).clamp(0.0, duration));
    }

    fn seek_to(&mut self, target: f64) {
        self.engine.seek(target);
        self.store.update(|s| s.current_time = target);
    }

    pub fn set_volume(&mut self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let volume = fraction.clamp(0.0, 1.0);
        self.engine.set_volume(volume);
        self.store.update(|s| s.volume = volume);
    }

    pub fn change_volume(&mut self, delta: f64) {
        let volume = self.store.get().volume;
        self.set_volume(volume + delta);
    }

    /// Highlight a row. Rows outside the album clear the highlight.
    pub fn hover(&mut self, index: Option<usize>) {
        let len = self.album.len();
        let hovered = index.filter(|&i| i < len);
        self.store.update(|s| s.hovered = hovered);
    }

    /// Move the highlight by `delta` rows, starting from the current song when
    /// nothing is highlighted.
    pub fn hover_by(&mut self, delta: isize) {
        let state = self.store.get();
        let from = state.hovered.unwrap_or(state.current);
        let last = self.album.len().saturating_sub(1);
        let to = from.saturating_add_signed(delta).min(last);
        self.hover(Some(to));
    }

    /// Apply every notification the engine has delivered so far. Returns how many.
    pub fn pump(&mut self) -> usize {
        if !self.attached {
            return 0;
        }
        let mut applied = 0;
        while let Ok(n) = self.notifications.try_recv() {
            self.handle_notification(n);
            applied += 1;
        }
        applied
    }

    /// Apply a single engine notification. Each kind only writes its own field.
    pub fn handle_notification(&mut self, n: Notification) {
        if !self.attached {
            return;
        }
        match n {
            Notification::TimeUpdate(t) => {
                self.store.update(|s| s.current_time = clamp_time(t, s.duration));
            }
            Notification::DurationChange(d) => {
                self.store.update(|s| {
                    s.duration = d;
                    s.current_time = clamp_time(s.current_time, d);
                });
            }
            Notification::VolumeChange(v) => {
                if !v.is_nan() {
                    self.store.update(|s| s.volume = v.clamp(0.0, 1.0));
                }
            }
        }
    }

    /// Detach from the engine and clear its source. Safe to call more than once;
    /// only the first call has any effect. Also runs on drop.
    pub fn teardown(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.engine.detach();
        self.engine.clear();
        // Discard anything delivered before the detach.
        while self.notifications.try_recv().is_ok() {}
        debug!(album = %self.album.slug, "controller detached");
    }
}

impl<E: MediaEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn clamp_time(t: f64, duration: f64) -> f64 {
    let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
    if duration.is_finite() { t.min(duration) } else { t }
}

use crate::app::{PlaybackController, PlaybackStatus};
use crate::engine::MediaEngine;
use crate::mpris::MprisHandle;

/// The parts of the playback state MPRIS clients care about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MprisView {
    index: usize,
    status: PlaybackStatus,
    volume: f64,
    length_ms: Option<u64>,
}

impl MprisView {
    pub fn of<E: MediaEngine>(controller: &PlaybackController<E>) -> Self {
        let s = controller.state();
        Self {
            index: s.current,
            status: s.status,
            volume: s.volume,
            length_ms: s.duration_known().then(|| (s.duration * 1000.0) as u64),
        }
    }
}

pub fn update_mpris<E: MediaEngine>(mpris: &MprisHandle, controller: &PlaybackController<E>) {
    let s = controller.state();
    // Prefer the engine's measured duration, fall back to the catalog's.
    let duration = if s.duration_known() {
        s.duration
    } else {
        controller.current_song().duration
    };
    mpris.set_track_metadata(Some(s.current), controller.album(), duration);
    mpris.set_playback(s.status);
    mpris.set_volume(s.volume);
}

//! Playback state types: `PlaybackStatus` and `PlaybackState`.

use crate::catalog::Album;

/// Whether the engine was last told to play or to pause.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Paused,
    Playing,
}

impl PlaybackStatus {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Everything the views need to render the player.
///
/// Times are seconds; `duration` is `NaN` while the engine has not measured the
/// current source. `volume` is a fraction in `[0, 1]`.
#[derive(Clone, Debug)]
pub struct PlaybackState {
    /// Index of the current song within the album.
    pub current: usize,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub status: PlaybackStatus,
    /// Row under the pointer or keyboard cursor. No playback meaning.
    pub hovered: Option<usize>,
}

impl PlaybackState {
    /// Initial state for `album`: first song, paused, at 0s, with the catalog duration.
    pub fn new(album: &Album, volume: f64) -> Self {
        Self {
            current: 0,
            current_time: 0.0,
            duration: album.songs.first().map_or(f64::NAN, |s| s.duration),
            volume: volume.clamp(0.0, 1.0),
            status: PlaybackStatus::Paused,
            hovered: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.status.is_playing()
    }

    pub fn duration_known(&self) -> bool {
        self.duration.is_finite()
    }

    /// Playhead position as a fraction of the duration, 0 when the duration is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration_known() && self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Treat two `NaN`s as equal so an unknown duration does not count as a change.
fn same(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for PlaybackState {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
            && same(self.current_time, other.current_time)
            && same(self.duration, other.duration)
            && same(self.volume, other.volume)
            && self.status == other.status
            && self.hovered == other.hovered
    }
}

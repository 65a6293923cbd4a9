//! Engine contract types: notifications, thread commands and the `MediaEngine` trait.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// State changes reported by the engine itself, delivered asynchronously.
///
/// Values are seconds (time, duration) or a fraction in `[0, 1]` (volume).
/// A duration of `NaN` means the engine does not know it yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    TimeUpdate(f64),
    DurationChange(f64),
    VolumeChange(f64),
}

#[derive(Debug)]
pub(crate) enum EngineCmd {
    /// Replace the current source. The new source starts paused at 0.
    Load(PathBuf),
    /// Drop the current source.
    Clear,
    Play,
    Pause,
    /// Move the playhead to the given position in seconds.
    Seek(f64),
    SetVolume(f64),
    /// Stop the engine thread, fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Imperative audio primitive owned by a single controller.
///
/// Calls are fire-and-forget: failures are the engine's business and are never
/// reported back. Observable state only flows through the attached listener.
pub trait MediaEngine {
    /// Load `src`, replacing whatever was loaded before.
    fn load(&mut self, src: &str);
    /// Unload the current source.
    fn clear(&mut self);
    /// The currently loaded source, if any.
    fn source(&self) -> Option<&str>;
    fn play(&mut self);
    fn pause(&mut self);
    /// Set the playhead, in seconds.
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: f64);
    /// Route notifications to `listener`, replacing any previous one.
    fn attach(&mut self, listener: Sender<Notification>);
    /// Stop delivering notifications. Nothing is delivered after this returns.
    fn detach(&mut self);
}

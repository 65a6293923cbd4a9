//! Media engine: the audio primitive the playback controller drives.
//!
//! `MediaEngine` is the seam the controller talks to. `RodioEngine` implements
//! it with a dedicated audio thread that owns the rodio output stream and
//! reports its own state back as `Notification`s.

mod listener;
mod player;
mod sink;
mod thread;
mod types;

pub use player::RodioEngine;
pub use types::*;

#[cfg(test)]
mod tests;

//! Application core: playback state, its observable store and the controller
//! that keeps them in sync with the media engine.
//!
//! Views read `PlaybackState` snapshots; every user intent goes through
//! `PlaybackController`.

mod controller;
mod model;
mod store;
mod time;

pub use controller::PlaybackController;
pub use model::*;
pub use store::StateStore;
pub use time::format_time;

#[cfg(test)]
mod tests;

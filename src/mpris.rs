//! MPRIS (D-Bus media player) integration.
//!
//! Desktop media keys and tools like `playerctl` reach the player through
//! here: method calls are forwarded as `ControlCmd`s to the event loop, and the
//! event loop pushes the current status and song back with `MprisHandle`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use async_io::block_on;
use tracing::{debug, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::app::PlaybackStatus;
use crate::catalog::Album;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    SetVolume(f64),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackStatus,
    volume: f64,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
        let _ = self.notify.send(());
    }

    pub fn set_volume(&self, volume: f64) {
        if let Ok(mut s) = self.state.lock() {
            s.volume = volume;
        }
        let _ = self.notify.send(());
    }

    /// Publish song `index` of `album`. `duration` is in seconds; `NaN` omits the length.
    pub fn set_track_metadata(&self, index: Option<usize>, album: &Album, duration: f64) {
        let song = index.and_then(|i| album.song(i));
        if let Ok(mut s) = self.state.lock() {
            match (index, song) {
                (Some(i), Some(song)) => {
                    s.track_id = OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{i}")).ok();
                    s.title = Some(song.title.clone());
                    s.artist = if album.artist.trim().is_empty() {
                        Vec::new()
                    } else {
                        vec![album.artist.clone()]
                    };
                    s.album = Some(album.title.clone());
                    s.art_url = if album.album_cover.is_empty() {
                        None
                    } else {
                        Some(file_url(&album.album_cover))
                    };
                    s.length_micros = if duration.is_finite() && duration >= 0.0 {
                        Some((duration * 1_000_000.0).round() as i64)
                    } else {
                        None
                    };
                }
                _ => {
                    s.track_id = None;
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.art_url = None;
                    s.length_micros = None;
                }
            }
        }
        let _ = self.notify.send(());
    }
}

fn file_url(path: &str) -> String {
    if path.contains("://") {
        path.to_string()
    } else {
        format!("file://{path}")
    }
}

fn owned<'a>(v: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(v.into()).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(volume));
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let track_id = s
            .track_id
            .clone()
            .map(OwnedObjectPath::into_inner)
            .unwrap_or_else(|| ObjectPath::from_static_str_unchecked("/org/mpris/MediaPlayer2/TrackList/NoTrack"));
        if let Some(v) = owned(track_id) {
            map.insert("mpris:trackid".to_string(), v);
        }
        if let Some(v) = s.title.clone().and_then(owned) {
            map.insert("xesam:title".to_string(), v);
        }
        if !s.artist.is_empty() {
            if let Some(v) = owned(s.artist.clone()) {
                map.insert("xesam:artist".to_string(), v);
            }
        }
        if let Some(v) = s.album.clone().and_then(owned) {
            map.insert("xesam:album".to_string(), v);
        }
        if let Some(v) = s.art_url.clone().and_then(owned) {
            map.insert("mpris:artUrl".to_string(), v);
        }
        if let Some(v) = s.length_micros.and_then(owned) {
            map.insert("mpris:length".to_string(), v);
        }
        map
    }
}

/// Start the MPRIS service on its own thread. Bus failures are logged and the
/// returned handle keeps working as a no-op.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                warn!(error = %e, "MPRIS unavailable");
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection
        .request_name("org.mpris.MediaPlayer2.encore")
        .await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    debug!("MPRIS service registered");

    let iface_ref: InterfaceRef<PlayerIface> =
        object_server.interface(OBJECT_PATH).await?;

    // Runs until the handle is dropped. The blocking `recv` parks this thread's
    // `block_on`; D-Bus traffic keeps flowing because zbus dispatches it on its
    // own internal executor thread (the default `async-io` feature).
    while notify.recv().is_ok() {
        // Coalesce bursts into a single PropertiesChanged round.
        while notify.try_recv().is_ok() {}
        let emitter = iface_ref.signal_emitter();
        let iface = iface_ref.get().await;
        iface.playback_status_changed(emitter).await?;
        iface.metadata_changed(emitter).await?;
        iface.volume_changed(emitter).await?;
    }
    Ok(())
}

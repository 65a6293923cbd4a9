use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{PlaybackController, PlaybackState};
use crate::config;
use crate::engine::MediaEngine;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::{MprisView, update_mpris};
use crate::ui::{self, Hitmap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragTarget {
    Seek,
    Volume,
}

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pending_gg: bool,
    /// Regions of the last drawn frame, for mouse hit-testing.
    hitmap: Hitmap,
    dragging: Option<DragTarget>,
    /// Whether the current hover came from the mouse; only then does leaving
    /// the list clear it.
    mouse_hover: bool,
    /// What MPRIS clients were last told, and the store revision it was checked at.
    last_mpris: Option<MprisView>,
    mpris_revision: Option<u64>,
    updates: mpsc::Receiver<PlaybackState>,
    dirty: bool,
}

impl EventLoopState {
    pub fn new<E: MediaEngine>(controller: &mut PlaybackController<E>) -> Self {
        Self {
            pending_gg: false,
            hitmap: Hitmap::default(),
            dragging: None,
            mouse_hover: false,
            last_mpris: None,
            mpris_revision: None,
            updates: controller.subscribe(),
            dirty: true,
        }
    }
}

/// Main terminal event loop: pumps engine notifications, keeps MPRIS in sync,
/// redraws and dispatches input. Returns `Ok(())` when shutdown is requested.
pub fn run<E: MediaEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    controller: &mut PlaybackController<E>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        controller.pump();

        let revision = controller.revision();
        if state.mpris_revision != Some(revision) {
            state.mpris_revision = Some(revision);
            let view = MprisView::of(controller);
            if state.last_mpris != Some(view) {
                update_mpris(mpris, controller);
                state.last_mpris = Some(view);
            }
        }

        while state.updates.try_recv().is_ok() {
            state.dirty = true;
        }

        if state.dirty {
            let mut hitmap = state.hitmap;
            terminal.draw(|f| {
                hitmap = ui::draw(
                    f,
                    controller.album(),
                    controller.state(),
                    &settings.ui,
                    &settings.controls,
                );
            })?;
            state.hitmap = hitmap;
            state.dirty = false;
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, controller) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if handle_key_event(key, settings, controller, state) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, controller, state),
                Event::Resize(..) => state.dirty = true,
                _ => {}
            }
        }
    }
}

/// Apply a command received over MPRIS. Returns `true` when the loop should exit.
fn handle_control_cmd<E: MediaEngine>(
    cmd: ControlCmd,
    controller: &mut PlaybackController<E>,
) -> bool {
    debug!(?cmd, "MPRIS command");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => controller.play(),
        // There is no stopped state; stopping pauses in place.
        ControlCmd::Pause | ControlCmd::Stop => controller.pause(),
        ControlCmd::PlayPause => controller.toggle_play(),
        ControlCmd::Next => controller.next(),
        ControlCmd::Prev => controller.previous(),
        ControlCmd::SetVolume(v) => controller.set_volume(v),
    }
    false
}

/// Returns `true` when the key asks to quit.
fn handle_key_event<E: MediaEngine>(
    key: KeyEvent,
    settings: &config::Settings,
    controller: &mut PlaybackController<E>,
    state: &mut EventLoopState,
) -> bool {
    let controls = &settings.controls;
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    state.mouse_hover = false;

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                controller.hover(Some(0));
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            let last = controller.album().len().saturating_sub(1);
            controller.hover(Some(last));
        }
        KeyCode::Char('j') | KeyCode::Down => controller.hover_by(1),
        KeyCode::Char('k') | KeyCode::Up => controller.hover_by(-1),
        KeyCode::Esc => controller.hover(None),
        KeyCode::Enter => {
            let s = controller.state();
            let index = s.hovered.unwrap_or(s.current);
            controller.on_row_activate(index);
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => controller.toggle_play(),
        KeyCode::Char('l') => controller.next(),
        KeyCode::Char('h') => controller.previous(),
        KeyCode::Char('L') => controller.seek_by(controls.seek_seconds as f64),
        KeyCode::Char('H') => controller.seek_by(-(controls.seek_seconds as f64)),
        KeyCode::Char('+') | KeyCode::Char('=') => controller.change_volume(controls.volume_step),
        KeyCode::Char('-') => controller.change_volume(-controls.volume_step),
        _ => {}
    }
    false
}

fn handle_mouse_event<E: MediaEngine>(
    mouse: MouseEvent,
    controller: &mut PlaybackController<E>,
    state: &mut EventLoopState,
) {
    let (col, row) = (mouse.column, mouse.row);
    let hitmap = state.hitmap;

    match mouse.kind {
        MouseEventKind::Moved => {
            if let Some(index) = hitmap.row_at(col, row) {
                state.mouse_hover = true;
                controller.hover(Some(index));
            } else if state.mouse_hover && !hitmap.in_list(col, row) {
                state.mouse_hover = false;
                controller.hover(None);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = hitmap.row_at(col, row) {
                controller.on_row_activate(index);
            } else if let Some(fraction) = hitmap.seek_fraction(col, row) {
                state.dragging = Some(DragTarget::Seek);
                controller.seek(fraction);
            } else if let Some(fraction) = hitmap.volume_fraction(col, row) {
                state.dragging = Some(DragTarget::Volume);
                controller.set_volume(fraction);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => match state.dragging {
            Some(DragTarget::Seek) => controller.seek(ui::column_fraction(hitmap.seek, col)),
            Some(DragTarget::Volume) => {
                controller.set_volume(ui::column_fraction(hitmap.volume, col))
            }
            None => {}
        },
        MouseEventKind::Up(_) => state.dragging = None,
        MouseEventKind::ScrollDown if hitmap.in_list(col, row) => {
            state.mouse_hover = false;
            controller.hover_by(1);
        }
        MouseEventKind::ScrollUp if hitmap.in_list(col, row) => {
            state.mouse_hover = false;
            controller.hover_by(-1);
        }
        _ => {}
    }
}

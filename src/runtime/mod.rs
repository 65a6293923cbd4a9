use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::PlaybackController;
use crate::catalog::{Catalog, CatalogError};
use crate::engine::{MediaEngine, RodioEngine};
use crate::mpris::ControlCmd;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;

const USAGE: &str = "usage: encore <album-slug> [catalog.toml]";

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();
    let log_path = logging::init(&settings.log);
    if let Some(msg) = settings_warning {
        eprintln!("encore: {msg}");
        warn!("{msg}");
    }

    let mut args = env::args().skip(1);
    let slug = args.next().ok_or(USAGE)?;
    let catalog_path = args.next().map(PathBuf::from).unwrap_or_else(|| settings.catalog.path.clone());

    let catalog = Catalog::load(&catalog_path)?;
    let album = match catalog.find(&slug) {
        Ok(album) => album.clone(),
        Err(e @ CatalogError::AlbumNotFound(_)) => {
            let available = catalog.slugs().join(", ");
            return Err(format!("{e} (available: {available})").into());
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        album = %album.slug,
        catalog = %catalog_path.display(),
        log = ?log_path,
        "starting"
    );

    let engine = RodioEngine::new(settings.engine.clone());
    let mut controller = PlaybackController::new(album, engine, settings.playback.initial_volume)?;
    info!(source = ?controller.engine().source(), "first song loaded");

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(&mut controller);
        event_loop::run(
            &mut terminal,
            &settings,
            &mut controller,
            &mpris,
            &control_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Detach before the engine's audio thread is stopped.
    controller.teardown();
    drop(controller);
    info!("stopped");

    run_result
}

//! UI rendering helpers for the terminal user interface.
//!
//! `draw` is a pure function of the album and the current `PlaybackState`. It
//! returns a `Hitmap` describing where the interactive parts ended up so the
//! runtime can turn mouse input back into intents.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Padding, Paragraph, Row, Table, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{PlaybackState, format_time};
use crate::catalog::Album;
use crate::config::{ControlsSettings, UiSettings};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play/pause row");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next song");
    // H/L and -/+ are filled dynamically from config.
    map.insert("q", "quit");
    map
});

const PLAYING_GLYPH: &str = "⏸";
const PAUSED_GLYPH: &str = "▶";

/// Render the controls help text, incorporating the configured steps.
fn controls_text(controls: &ControlsSettings) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = ["j/k", "enter", "space/p", "h/l", "H/L", "-/+", "gg/G", "q"];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] seek -/+{}s", controls.seek_seconds)),
            "-/+" => Some(format!(
                "[-/+] volume -/+{}%",
                (controls.volume_step * 100.0).round()
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Where the interactive widgets were drawn in the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hitmap {
    /// Track rows, excluding the table header.
    pub list: Rect,
    /// Album index of the first visible row.
    pub list_start: usize,
    pub seek: Rect,
    pub volume: Rect,
}

impl Hitmap {
    /// The album index of the row under `(col, row)`, if any.
    pub fn row_at(&self, col: u16, row: u16) -> Option<usize> {
        if !self.list.contains(Position::new(col, row)) {
            return None;
        }
        Some(self.list_start + (row - self.list.y) as usize)
    }

    pub fn in_list(&self, col: u16, row: u16) -> bool {
        self.list.contains(Position::new(col, row))
    }

    pub fn seek_fraction(&self, col: u16, row: u16) -> Option<f64> {
        fraction_in(self.seek, col, row)
    }

    pub fn volume_fraction(&self, col: u16, row: u16) -> Option<f64> {
        fraction_in(self.volume, col, row)
    }
}

/// Horizontal position of `(col, row)` inside `area` as a fraction in `[0, 1]`.
pub fn fraction_in(area: Rect, col: u16, row: u16) -> Option<f64> {
    if !area.contains(Position::new(col, row)) {
        return None;
    }
    if area.width <= 1 {
        return Some(0.0);
    }
    Some(f64::from(col - area.x) / f64::from(area.width - 1))
}

/// Like `fraction_in`, but only looks at the column and clamps to the area's
/// edges. Used while dragging, when the pointer may leave the gauge.
pub fn column_fraction(area: Rect, col: u16) -> f64 {
    if area.width <= 1 {
        return 0.0;
    }
    let col = col.clamp(area.x, area.x + area.width - 1);
    f64::from(col - area.x) / f64::from(area.width - 1)
}

/// Leading cell of a track row: the current song shows its play/pause state,
/// a hovered row shows a play icon, every other row its 1-based number.
fn action_cell(index: usize, state: &PlaybackState) -> String {
    if index == state.current {
        if state.is_playing() {
            PLAYING_GLYPH.to_string()
        } else {
            PAUSED_GLYPH.to_string()
        }
    } else if state.hovered == Some(index) {
        PAUSED_GLYPH.to_string()
    } else {
        (index + 1).to_string()
    }
}

/// Pick `[start, end)` of `total` rows to show in `height` lines, keeping
/// `focus` roughly centred.
fn visible_window(total: usize, height: usize, focus: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = focus.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn album_pane(album: &Album, ui: &UiSettings) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from(album.title.clone()).bold(),
        Line::from(album.artist.clone()),
        Line::from(album.release_info.clone()).italic(),
    ];
    if ui.show_cover_path && !album.album_cover.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(format!("Cover: {}", album.album_cover)).dim());
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::bordered()
                .padding(Padding::horizontal(1))
                .title(" album "),
        )
        .wrap(Wrap { trim: true })
}

/// Render the track table into `area`, returning the row region and its first index.
fn draw_track_list(frame: &mut Frame, area: Rect, album: &Album, state: &PlaybackState) -> (Rect, usize) {
    let block = Block::default().borders(Borders::ALL).title(" tracks ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // One line goes to the header.
    let rows_area = Rect {
        y: inner.y.saturating_add(1),
        height: inner.height.saturating_sub(1),
        ..inner
    };

    let focus = state.hovered.unwrap_or(state.current);
    let (start, end) = visible_window(album.len(), rows_area.height as usize, focus);

    let rows: Vec<Row> = album.songs[start..end]
        .iter()
        .enumerate()
        .map(|(offset, song)| {
            let i = start + offset;
            let mut style = Style::default();
            if i == state.current {
                style = style.add_modifier(Modifier::BOLD);
            }
            if state.hovered == Some(i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(vec![
                Cell::from(action_cell(i, state)),
                Cell::from(song.title.clone()),
                Cell::from(format_time(song.duration)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(4), Constraint::Min(10), Constraint::Length(6)],
    )
    .header(Row::new(vec!["#", "Title", "Time"]).style(Style::default().add_modifier(Modifier::DIM)));
    frame.render_widget(table, inner);

    (rows_area, start)
}

/// Render the transport bar, returning the seek and volume gauge areas.
fn draw_player_bar(frame: &mut Frame, area: Rect, album: &Album, state: &PlaybackState) -> (Rect, Rect) {
    let block = Block::bordered()
        .padding(Padding::horizontal(1))
        .title(" now playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let glyph = if state.is_playing() { PLAYING_GLYPH } else { PAUSED_GLYPH };
    let title = album
        .song(state.current)
        .map(|s| s.title.as_str())
        .unwrap_or_default();
    let now = Line::from(vec![
        Span::raw(format!("{glyph} ")),
        Span::raw(title.to_string()).bold(),
        Span::raw(format!(" - {}", album.artist)),
    ]);
    frame.render_widget(Paragraph::new(now), lines[0]);

    let time_label = format!(
        "{} / {}",
        format_time(state.current_time),
        format_time(state.duration)
    );
    let seek_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(16), Constraint::Min(1)])
        .split(lines[1]);
    frame.render_widget(Paragraph::new(time_label), seek_row[0]);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().add_modifier(Modifier::BOLD))
            .use_unicode(true)
            .label("")
            .ratio(state.progress()),
        seek_row[1],
    );

    let volume = state.volume.clamp(0.0, 1.0);
    let volume_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(16), Constraint::Max(30)])
        .split(lines[2]);
    frame.render_widget(
        Paragraph::new(format!("vol {:>3}%", (volume * 100.0).round())),
        volume_row[0],
    );
    frame.render_widget(
        Gauge::default().use_unicode(true).label("").ratio(volume),
        volume_row[1],
    );

    (seek_row[1], volume_row[1])
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    album: &Album,
    state: &PlaybackState,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) -> Hitmap {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    frame.render_widget(album_pane(album, ui_settings), body[0]);
    let (list, list_start) = draw_track_list(frame, body[1], album, state);

    let (seek, volume) = draw_player_bar(frame, chunks[2], album, state);

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding::horizontal(1)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);

    Hitmap {
        list,
        list_start,
        seek,
        volume,
    }
}

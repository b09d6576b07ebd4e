//! TUI rendering module.
//!
//! This module handles all visual rendering using ratatui:
//! - Layer gutter on the left and one track row per layer
//! - Hit bars colored by regulatory mode
//! - Detail panel for the selected hit, with its alignment colored per base
//! - Status bar with mode, filter and position info
//! - Help overlay

pub mod glyphs;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::model::{AppMode, AppState, Hit, ModeClass};
use crate::projection::Window;
use glyphs::Glyphs;

/// Width reserved for layer numbers (including border).
const LAYER_GUTTER_WIDTH: u16 = 8;
/// Minimum width for the track panel.
const MIN_TRACK_PANEL_WIDTH: u16 = 10;
/// Height of the detail panel (including borders).
const DETAIL_PANEL_HEIGHT: u16 = 9;
/// Height of the status bar.
const STATUS_BAR_HEIGHT: u16 = 1;

const HELP_LINES: &[&str] = &[
    "j / k        select next / previous hit",
    "h / l        scroll left / right",
    "J / K        scroll one layer down / up",
    "0 / $        go to first / last hit",
    "+ / -        zoom in / out",
    "PgUp / PgDn  scroll layers by a page",
    "/text        show only labels containing text",
    ":mode M      activation, repression, other or all",
    ":pval LO HI  show scores in [LO, HI] (:pval off)",
    ":reset       clear all filters",
    ":fit         fit the projection window",
    ":<number>    centre on a genomic position",
    ":q           quit (Ctrl+C also quits)",
];

/// Color scheme for alignment symbols.
pub trait ColorScheme {
    fn get_color(&self, c: char) -> Color;
}

/// DNA nucleotide color scheme.
pub struct DnaColorScheme;

impl ColorScheme for DnaColorScheme {
    fn get_color(&self, c: char) -> Color {
        match c.to_ascii_uppercase() {
            'A' => Color::Red,
            'C' => Color::Green,
            'G' => Color::Yellow,
            'T' | 'U' => Color::Blue,
            _ => Color::DarkGray,
        }
    }
}

/// Bar color for a regulatory mode.
pub fn mode_color(class: ModeClass) -> Color {
    match class {
        ModeClass::Activation => Color::Green,
        ModeClass::Repression => Color::Red,
        ModeClass::Other => Color::Gray,
    }
}

/// Renders the complete UI.
pub fn render(frame: &mut Frame, state: &AppState, glyphs: &Glyphs) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(DETAIL_PANEL_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(LAYER_GUTTER_WIDTH),
            Constraint::Min(MIN_TRACK_PANEL_WIDTH),
        ])
        .split(main_layout[0]);

    render_layer_gutter(frame, state, content_layout[0], glyphs);
    render_tracks_panel(frame, state, content_layout[1], glyphs);
    render_detail_panel(frame, state, main_layout[1], glyphs);
    render_status_bar(frame, state, main_layout[2]);

    if state.show_help {
        render_help_overlay(frame, area);
    }
}

/// Renders the layer numbers, marking the selected hit's layer.
fn render_layer_gutter(frame: &mut Frame, state: &AppState, area: Rect, glyphs: &Glyphs) {
    let selected_layer = state.selected_hit().map(|h| h.layer);
    let end = state.viewport.layer_range().end.min(state.tracks.layer_count());

    let lines: Vec<Line> = (state.viewport.first_layer..end)
        .map(|layer| {
            if Some(layer) == selected_layer {
                Line::from(Span::styled(
                    format!("{}{}", glyphs.selected_layer, layer),
                    Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(format!(" {}", layer), Style::default().fg(Color::White)))
            }
        })
        .collect();

    let block = Block::default().borders(Borders::ALL).title("Layer");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders one row of hit bars per visible layer.
fn render_tracks_panel(frame: &mut Frame, state: &AppState, area: Rect, glyphs: &Glyphs) {
    let vp = &state.viewport;
    let title = format!(
        " {}..{} ({} bp/col) | window {} ",
        vp.first_pos,
        vp.last_pos(),
        vp.bases_per_col,
        state.window
    );

    let end = vp.layer_range().end.min(state.tracks.layer_count());
    let lines: Vec<Line> = (vp.first_layer..end).map(|layer| track_line(state, layer, glyphs)).collect();

    let block = Block::default().borders(Borders::ALL).title(title);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Builds the cells of one layer row and merges them into spans.
fn track_line(state: &AppState, layer: usize, glyphs: &Glyphs) -> Line<'static> {
    let vp = &state.viewport;
    let mut cells = vec![(' ', Style::default()); vp.visible_cols];

    // `visible` is ordered by layer, so this layer's hits are contiguous.
    let hits = &state.tracks.hits;
    let lo = state.visible.partition_point(|&i| hits[i].layer < layer);
    let hi = state.visible.partition_point(|&i| hits[i].layer <= layer);

    for &hit_index in &state.visible[lo..hi] {
        let hit = &hits[hit_index];
        let Some((first, last)) = vp.columns_of(hit.start, hit.stop) else {
            continue;
        };

        let mut style = Style::default().fg(mode_color(hit.mode_class()));
        if state.is_selected(hit_index) {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }

        for cell in &mut cells[first..=last] {
            *cell = (glyphs.bar_fill, style);
        }

        let width = last - first + 1;
        let label_len = hit.label.chars().count();
        if label_len <= width {
            let offset = first + (width - label_len) / 2;
            for (k, c) in hit.label.chars().enumerate() {
                cells[offset + k] = (c, style.add_modifier(Modifier::BOLD));
            }
        }

        if hit.start < vp.first_pos {
            cells[first] = (glyphs.clipped_left, style);
        }
        if hit.stop > vp.last_pos() {
            cells[last] = (glyphs.clipped_right, style);
        }
    }

    cells_to_line(&cells)
}

/// Collapses runs of identically styled cells into single spans.
fn cells_to_line(cells: &[(char, Style)]) -> Line<'static> {
    let mut spans: Vec<Span> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;

    for &(c, style) in cells {
        if run_style.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
        }
        run_style = Some(style);
        run.push(c);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

/// Part of the window-wide alignment covering the hit's own span.
pub fn alignment_excerpt(alignment: &str, hit: &Hit, window: &Window) -> String {
    let offset = (hit.start - window.start()).max(0) as usize;
    let last = (hit.stop - window.start()).min(window.len() as i64 - 1);
    if last < offset as i64 {
        return String::new();
    }
    alignment.chars().skip(offset).take(last as usize - offset + 1).collect()
}

/// Renders the selected hit's fields and its alignment.
fn render_detail_panel(frame: &mut Frame, state: &AppState, area: Rect, glyphs: &Glyphs) {
    let width = area.width.saturating_sub(2).max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();

    match state.selected_hit() {
        Some(hit) => {
            let info = format!(
                "{} | source {} | {}..{} | strand {} | p = {:.3e} | mode: {}",
                hit.label,
                hit.source.as_deref().unwrap_or("NA"),
                hit.start,
                hit.stop,
                hit.strand.map(|s| s.symbol()).unwrap_or('.'),
                hit.score,
                hit.mode.as_deref().unwrap_or("NA"),
            );
            for wrapped in textwrap::wrap(&info, width) {
                lines.push(Line::from(Span::styled(
                    wrapped.into_owned(),
                    Style::default().fg(mode_color(hit.mode_class())).add_modifier(Modifier::BOLD),
                )));
            }
            lines.push(Line::from(glyphs.h_separator.repeat(width)));

            match &hit.alignment {
                Some(alignment) => {
                    let excerpt: Vec<char> = alignment_excerpt(alignment, hit, &state.window).chars().collect();
                    let scheme = DnaColorScheme;
                    for chunk in excerpt.chunks(width) {
                        let spans: Vec<Span> = chunk
                            .iter()
                            .map(|&c| {
                                Span::styled(c.to_string(), Style::default().fg(Color::Black).bg(scheme.get_color(c)))
                            })
                            .collect();
                        lines.push(Line::from(spans));
                    }
                }
                None => lines.push(Line::from(Span::styled(
                    "no alignment in the projection window",
                    Style::default().fg(Color::DarkGray),
                ))),
            }
        }
        None => {
            let message = if state.tracks.is_empty() {
                "No laid-out hits"
            } else {
                "No hits match the current filter"
            };
            lines.push(Line::from(Span::styled(message, Style::default().fg(Color::DarkGray))));
        }
    }

    let block = Block::default().borders(Borders::ALL).title("Hit");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the status bar at the bottom.
fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let (mode_str, input_str) = match &state.mode {
        AppMode::Normal => ("NORMAL", String::new()),
        AppMode::Command(cmd) => ("COMMAND", format!(":{}", cmd)),
        AppMode::Search(query) => ("SEARCH", format!("/{}", query)),
    };

    let selected = state.selected.map(|s| s + 1).unwrap_or(0);
    let position_info = format!(
        "Hit {}/{} | {} layers ",
        selected,
        state.visible.len(),
        state.tracks.layer_count()
    );

    let message = state.status_message.as_deref().unwrap_or("");
    let left_content = if input_str.is_empty() {
        format!(" {} | {} ", mode_str, message)
    } else {
        format!(" {} | {} ", mode_str, input_str)
    };

    let left_len = left_content.chars().count();
    let status_line = Line::from(vec![
        Span::styled(left_content, Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::styled(
            " ".repeat((area.width as usize).saturating_sub(left_len + position_info.len())),
            Style::default().bg(Color::Cyan),
        ),
        Span::styled(
            position_info,
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(Paragraph::new(status_line), area);
}

/// Renders the key binding overlay in the middle of the screen.
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 60, (HELP_LINES.len() + 4) as u16);
    let width = popup.width.saturating_sub(2).max(1) as usize;

    let mut lines: Vec<Line> = Vec::new();
    for entry in HELP_LINES {
        for wrapped in textwrap::wrap(entry, width) {
            lines.push(Line::from(wrapped.into_owned()));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default().borders(Borders::ALL).title(" Help ");
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// A rectangle of at most `width` x `height` centred in `area`.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Calculates the visible track rows and columns for the given terminal size.
pub fn calculate_visible_dimensions(terminal_width: u16, terminal_height: u16) -> (usize, usize) {
    let tracks_height = terminal_height.saturating_sub(DETAIL_PANEL_HEIGHT + STATUS_BAR_HEIGHT);
    let tracks_width = terminal_width.saturating_sub(LAYER_GUTTER_WIDTH);

    let visible_rows = tracks_height.saturating_sub(2) as usize; // -2 for borders
    let visible_cols = tracks_width.saturating_sub(2) as usize;
    (visible_rows, visible_cols)
}

//! Data model for the track viewer.
//!
//! This module contains all data structures for representing:
//! - Laid-out motif hits and their tracks
//! - Display filters (label, regulatory mode, score range)
//! - Viewport state over genomic coordinates and layers
//! - Application state
//!
//! Filtering only changes which hits are shown; layers are never recomputed.

use std::ops::RangeInclusive;

use crate::projection::Window;
use crate::record::{EnrichedRecord, Strand};

/// Finest zoom level: one base per column.
pub const MIN_BASES_PER_COL: u64 = 1;
/// Coarsest zoom level.
pub const MAX_BASES_PER_COL: u64 = 1 << 20;

/// A motif hit placed on a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub label: String,
    pub source: Option<String>,
    pub start: i64,
    pub stop: i64,
    pub strand: Option<Strand>,
    pub score: f64,
    pub mode: Option<String>,
    pub layer: usize,
    pub alignment: Option<String>,
}

impl Hit {
    /// Builds a hit from a record that went through layout.
    ///
    /// Returns `None` for records without a layer, since those are not drawn.
    pub fn from_enriched(enriched: &EnrichedRecord) -> Option<Self> {
        let r = &enriched.record;
        let layer = enriched.layer?;
        let (start, stop) = (r.start?, r.stop?);
        Some(Self {
            label: r.label.clone()?,
            source: r.source.clone(),
            start: start.min(stop),
            stop: start.max(stop),
            strand: r.strand,
            score: r.score?,
            mode: r.mode.clone(),
            layer,
            alignment: enriched.alignment.clone(),
        })
    }

    pub fn mode_class(&self) -> ModeClass {
        ModeClass::of(self.mode.as_deref())
    }
}

/// Coarse regulatory-mode class used for filtering and coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeClass {
    Activation,
    Repression,
    Other,
}

impl ModeClass {
    pub fn of(mode: Option<&str>) -> Self {
        match mode.map(|m| m.trim().to_lowercase()).as_deref() {
            Some("activation") => ModeClass::Activation,
            Some("repression") => ModeClass::Repression,
            _ => ModeClass::Other,
        }
    }
}

/// Regulatory-mode filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeFilter {
    #[default]
    All,
    Only(ModeClass),
}

impl ModeFilter {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "all" | "*" => Some(ModeFilter::All),
            "activation" => Some(ModeFilter::Only(ModeClass::Activation)),
            "repression" => Some(ModeFilter::Only(ModeClass::Repression)),
            "other" => Some(ModeFilter::Only(ModeClass::Other)),
            _ => None,
        }
    }

    pub fn matches(&self, class: ModeClass) -> bool {
        match self {
            ModeFilter::All => true,
            ModeFilter::Only(wanted) => *wanted == class,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModeFilter::All => "all",
            ModeFilter::Only(ModeClass::Activation) => "activation",
            ModeFilter::Only(ModeClass::Repression) => "repression",
            ModeFilter::Only(ModeClass::Other) => "other",
        }
    }
}

/// Display filter over hits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    /// Case-insensitive label substring
    pub label_query: Option<String>,
    pub mode: ModeFilter,
    /// Inclusive score range
    pub score_range: Option<RangeInclusive<f64>>,
}

impl Filter {
    pub fn matches(&self, hit: &Hit) -> bool {
        if let Some(query) = &self.label_query {
            if !hit.label.to_lowercase().contains(&query.to_lowercase()) {
                return false;
            }
        }
        if !self.mode.matches(hit.mode_class()) {
            return false;
        }
        match &self.score_range {
            Some(range) => range.contains(&hit.score),
            None => true,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Filter::default()
    }

    /// Short description for the status bar.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(query) = &self.label_query {
            parts.push(format!("TF~{}", query));
        }
        if self.mode != ModeFilter::All {
            parts.push(format!("mode={}", self.mode.name()));
        }
        if let Some(range) = &self.score_range {
            parts.push(format!("p∈[{}, {}]", range.start(), range.end()));
        }
        parts.join(" ")
    }
}

/// All laid-out hits.
#[derive(Debug, Clone, Default)]
pub struct TrackSet {
    pub hits: Vec<Hit>,
    layer_count: usize,
    extent: Option<(i64, i64)>,
}

impl TrackSet {
    pub fn new(hits: Vec<Hit>) -> Self {
        let layer_count = hits.iter().map(|h| h.layer + 1).max().unwrap_or(0);
        let extent = hits.iter().fold(None, |acc: Option<(i64, i64)>, h| match acc {
            Some((lo, hi)) => Some((lo.min(h.start), hi.max(h.stop))),
            None => Some((h.start, h.stop)),
        });
        Self {
            hits,
            layer_count,
            extent,
        }
    }

    /// Collects the drawable hits from enriched records.
    pub fn from_records(records: &[EnrichedRecord]) -> Self {
        Self::new(records.iter().filter_map(Hit::from_enriched).collect())
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Lowest start and highest stop over all hits.
    pub fn extent(&self) -> Option<(i64, i64)> {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// The portion of the track area currently visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Index of the first visible layer (row)
    pub first_layer: usize,
    /// Genomic position of the first visible column
    pub first_pos: i64,
    /// Number of visible rows
    pub visible_rows: usize,
    /// Number of visible columns
    pub visible_cols: usize,
    /// Genomic positions per column
    pub bases_per_col: u64,
}

impl Viewport {
    pub fn new(visible_rows: usize, visible_cols: usize) -> Self {
        Self {
            first_layer: 0,
            first_pos: 0,
            visible_rows,
            visible_cols,
            bases_per_col: MIN_BASES_PER_COL,
        }
    }

    /// Updates the viewport dimensions.
    pub fn resize(&mut self, visible_rows: usize, visible_cols: usize) {
        self.visible_rows = visible_rows;
        self.visible_cols = visible_cols;
    }

    /// Number of genomic positions covered by the visible columns.
    pub fn span(&self) -> i64 {
        (self.visible_cols as u64 * self.bases_per_col) as i64
    }

    /// Last visible genomic position.
    pub fn last_pos(&self) -> i64 {
        self.first_pos + self.span().max(1) - 1
    }

    /// Column showing genomic position `pos`, if visible.
    pub fn column_of(&self, pos: i64) -> Option<usize> {
        if pos < self.first_pos || pos > self.last_pos() {
            return None;
        }
        Some(((pos - self.first_pos) as u64 / self.bases_per_col) as usize)
    }

    /// Visible columns covered by `[start, stop]`, clipped to the viewport.
    pub fn columns_of(&self, start: i64, stop: i64) -> Option<(usize, usize)> {
        if stop < self.first_pos || start > self.last_pos() || self.visible_cols == 0 {
            return None;
        }
        let first = self.column_of(start.max(self.first_pos))?;
        let last = self.column_of(stop.min(self.last_pos()))?;
        Some((first, last))
    }

    /// Returns the range of visible layers.
    pub fn layer_range(&self) -> std::ops::Range<usize> {
        self.first_layer..self.first_layer + self.visible_rows
    }
}

/// Application mode for handling different input states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Command input mode (after pressing ':')
    Command(String),
    /// Label search input (after pressing '/')
    Search(String),
}

/// The complete application state.
#[derive(Debug)]
pub struct AppState {
    pub tracks: TrackSet,
    /// Window the alignments were projected onto
    pub window: Window,
    pub filter: Filter,
    /// Indices into `tracks.hits` passing the filter, by layer then start
    pub visible: Vec<usize>,
    /// Index into `visible`
    pub selected: Option<usize>,
    pub viewport: Viewport,
    pub mode: AppMode,
    pub should_quit: bool,
    pub show_help: bool,
    pub status_message: Option<String>,
    /// Fit the window to the screen on the first resize
    needs_fit: bool,
}

impl AppState {
    pub fn new(tracks: TrackSet, window: Window) -> Self {
        let mut state = Self {
            tracks,
            window,
            filter: Filter::default(),
            visible: Vec::new(),
            selected: None,
            viewport: Viewport::new(0, 0),
            mode: AppMode::Normal,
            should_quit: false,
            show_help: false,
            status_message: None,
            needs_fit: true,
        };
        state.viewport.first_pos = window.start();
        state.refresh_visible();
        state.status_message = Some(format!(
            "{} hits on {} layers. Press ? for help",
            state.tracks.len(),
            state.tracks.layer_count()
        ));
        state
    }

    /// The currently selected hit.
    pub fn selected_hit(&self) -> Option<&Hit> {
        let idx = *self.visible.get(self.selected?)?;
        self.tracks.hits.get(idx)
    }

    pub fn is_selected(&self, hit_index: usize) -> bool {
        self.selected
            .and_then(|s| self.visible.get(s))
            .is_some_and(|&i| i == hit_index)
    }

    /// Updates the viewport size based on terminal dimensions.
    pub fn update_viewport_size(&mut self, rows: usize, cols: usize) {
        self.viewport.resize(rows, cols);
        if self.needs_fit && cols > 0 {
            self.needs_fit = false;
            self.fit_window();
        }
        self.clamp_viewport();
    }

    /// Re-applies the filter, keeping the selection when it stays visible.
    pub fn refresh_visible(&mut self) {
        let previous = self.selected.and_then(|s| self.visible.get(s).copied());

        let hits = &self.tracks.hits;
        let mut visible: Vec<usize> = (0..hits.len()).filter(|&i| self.filter.matches(&hits[i])).collect();
        visible.sort_by_key(|&i| (hits[i].layer, hits[i].start, hits[i].stop));
        self.visible = visible;

        self.selected = previous
            .and_then(|prev| self.visible.iter().position(|&i| i == prev))
            .or(if self.visible.is_empty() { None } else { Some(0) });
    }

    /// Selects the next visible hit.
    pub fn select_next(&mut self) {
        if let Some(sel) = self.selected {
            if sel + 1 < self.visible.len() {
                self.selected = Some(sel + 1);
                self.ensure_selection_visible();
            }
        }
    }

    /// Selects the previous visible hit.
    pub fn select_previous(&mut self) {
        if let Some(sel) = self.selected {
            if sel > 0 {
                self.selected = Some(sel - 1);
                self.ensure_selection_visible();
            }
        }
    }

    /// Scrolls a quarter screen toward lower coordinates.
    pub fn scroll_left(&mut self) {
        let step = (self.viewport.span() / 4).max(1);
        self.viewport.first_pos -= step;
        self.clamp_viewport();
    }

    /// Scrolls a quarter screen toward higher coordinates.
    pub fn scroll_right(&mut self) {
        let step = (self.viewport.span() / 4).max(1);
        self.viewport.first_pos += step;
        self.clamp_viewport();
    }

    pub fn layer_up(&mut self) {
        self.viewport.first_layer = self.viewport.first_layer.saturating_sub(1);
    }

    pub fn layer_down(&mut self) {
        self.viewport.first_layer += 1;
        self.clamp_viewport();
    }

    pub fn page_up(&mut self) {
        let page = self.viewport.visible_rows.max(1);
        self.viewport.first_layer = self.viewport.first_layer.saturating_sub(page);
    }

    pub fn page_down(&mut self) {
        self.viewport.first_layer += self.viewport.visible_rows.max(1);
        self.clamp_viewport();
    }

    /// Jumps to the lowest hit coordinate.
    pub fn goto_start(&mut self) {
        if let Some((lo, _)) = self.tracks.extent() {
            self.viewport.first_pos = lo;
            self.clamp_viewport();
        }
    }

    /// Jumps so the highest hit coordinate is the last visible column.
    pub fn goto_end(&mut self) {
        if let Some((_, hi)) = self.tracks.extent() {
            self.viewport.first_pos = hi - self.viewport.span() + 1;
            self.clamp_viewport();
        }
    }

    /// Halves the bases per column, keeping the centre fixed.
    pub fn zoom_in(&mut self) {
        let centre = self.centre_pos();
        self.viewport.bases_per_col = (self.viewport.bases_per_col / 2).max(MIN_BASES_PER_COL);
        self.centre_on(centre);
    }

    /// Doubles the bases per column, keeping the centre fixed.
    pub fn zoom_out(&mut self) {
        let centre = self.centre_pos();
        self.viewport.bases_per_col = (self.viewport.bases_per_col * 2).min(MAX_BASES_PER_COL);
        self.centre_on(centre);
    }

    /// Zooms so the projection window fills the screen.
    pub fn fit_window(&mut self) {
        let cols = self.viewport.visible_cols.max(1) as u64;
        let len = self.window.len() as u64;
        self.viewport.bases_per_col = len.div_ceil(cols).clamp(MIN_BASES_PER_COL, MAX_BASES_PER_COL);
        self.viewport.first_pos = self.window.start();
        self.clamp_viewport();
    }

    fn centre_pos(&self) -> i64 {
        self.viewport.first_pos + self.viewport.span() / 2
    }

    /// Moves the view so `pos` is in the middle column.
    pub fn centre_on(&mut self, pos: i64) {
        self.viewport.first_pos = pos - self.viewport.span() / 2;
        self.clamp_viewport();
    }

    /// Scrolls so the selected hit is on screen.
    fn ensure_selection_visible(&mut self) {
        let Some((layer, start, stop)) = self.selected_hit().map(|h| (h.layer, h.start, h.stop)) else {
            return;
        };

        if layer < self.viewport.first_layer {
            self.viewport.first_layer = layer;
        } else if self.viewport.visible_rows > 0 && layer >= self.viewport.first_layer + self.viewport.visible_rows {
            self.viewport.first_layer = layer + 1 - self.viewport.visible_rows;
        }

        if stop < self.viewport.first_pos || start > self.viewport.last_pos() {
            self.centre_on(start);
        }
    }

    /// Clamps the viewport to the hit extent and layer count.
    fn clamp_viewport(&mut self) {
        let max_first_layer = self.tracks.layer_count().saturating_sub(self.viewport.visible_rows);
        self.viewport.first_layer = self.viewport.first_layer.min(max_first_layer);

        let (lo, hi) = self
            .tracks
            .extent()
            .map(|(lo, hi)| (lo.min(self.window.start()), hi.max(self.window.stop())))
            .unwrap_or((self.window.start(), self.window.stop()));
        let max_first_pos = (hi - self.viewport.span() + 1).max(lo);
        self.viewport.first_pos = self.viewport.first_pos.clamp(lo, max_first_pos);
    }

    /// Enters command mode.
    pub fn enter_command_mode(&mut self) {
        self.mode = AppMode::Command(String::new());
    }

    /// Enters label search mode.
    pub fn enter_search_mode(&mut self) {
        self.mode = AppMode::Search(String::new());
    }

    /// Handles a character input in command or search mode.
    pub fn input_char(&mut self, c: char) {
        if let AppMode::Command(ref mut buf) | AppMode::Search(ref mut buf) = self.mode {
            buf.push(c);
        }
    }

    /// Handles backspace in command or search mode.
    pub fn input_backspace(&mut self) {
        if let AppMode::Command(ref mut buf) | AppMode::Search(ref mut buf) = self.mode {
            if buf.pop().is_none() {
                self.mode = AppMode::Normal;
            }
        }
    }

    /// Applies the typed label query; an empty query clears it.
    pub fn execute_search(&mut self) {
        if let AppMode::Search(query) = std::mem::take(&mut self.mode) {
            let query = query.trim().to_string();
            self.filter.label_query = (!query.is_empty()).then_some(query);
            self.apply_filter();
        }
        self.mode = AppMode::Normal;
    }

    /// Executes the current command.
    pub fn execute_command(&mut self) {
        let AppMode::Command(cmd) = std::mem::take(&mut self.mode) else {
            return;
        };
        let mut words = cmd.split_whitespace();
        let Some(head) = words.next() else {
            return;
        };
        let args: Vec<&str> = words.collect();

        match head {
            "q" | "quit" => self.should_quit = true,
            "h" | "help" => self.show_help = true,
            "fit" => self.fit_window(),
            "reset" => {
                self.filter = Filter::default();
                self.apply_filter();
            }
            "mode" => match args.first().and_then(|a| ModeFilter::parse(a)) {
                Some(mode) => {
                    self.filter.mode = mode;
                    self.apply_filter();
                }
                None => {
                    self.status_message = Some("Usage: :mode activation|repression|other|all".to_string());
                }
            },
            "pval" | "p" => match self.parse_score_range(&args) {
                Some(range) => {
                    self.filter.score_range = range;
                    self.apply_filter();
                }
                None => {
                    self.status_message = Some("Usage: :pval LO HI (or :pval off)".to_string());
                }
            },
            _ => {
                if let Ok(pos) = head.parse::<i64>() {
                    self.centre_on(pos);
                    self.status_message = Some(format!("Centred on position {}", pos));
                } else {
                    self.status_message = Some(format!("Unknown command: {}", cmd));
                }
            }
        }
    }

    fn parse_score_range(&self, args: &[&str]) -> Option<Option<RangeInclusive<f64>>> {
        match args {
            ["off"] => Some(None),
            [lo, hi] => {
                let lo: f64 = lo.parse().ok()?;
                let hi: f64 = hi.parse().ok()?;
                (lo <= hi).then_some(Some(lo..=hi))
            }
            _ => None,
        }
    }

    fn apply_filter(&mut self) {
        self.refresh_visible();
        self.ensure_selection_visible();
        self.status_message = Some(if self.filter.is_active() {
            format!("{} of {} hits match {}", self.visible.len(), self.tracks.len(), self.filter.describe())
        } else {
            format!("{} hits", self.tracks.len())
        });
    }

    /// Cancels command or search input and returns to normal mode.
    pub fn cancel_input(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = true;
    }

    pub fn dismiss_help(&mut self) {
        self.show_help = false;
    }
}

//! Keyboard event handling.
//!
//! This module manages keyboard input with Vim-style navigation:
//! - `h` / `l`: scroll toward lower / higher coordinates
//! - `j` / `k`: select the next / previous hit
//! - `0` or `Home`: go to the first hit coordinate
//! - `$` or `End`: go to the last hit coordinate
//! - `+` / `-`: zoom in / out
//! - `PageUp` / `PageDown` (or `Ctrl+U` / `Ctrl+D`): scroll layers by a page
//! - `:`: enter command mode
//!   - `:q` or `:quit`: quit the application
//!   - `:h` or `:help`: show help
//!   - `:mode activation|repression|other|all`: filter by regulatory mode
//!   - `:pval LO HI`: filter by score range
//!   - `:reset`: clear all filters
//!   - `:fit`: fit the projection window to the screen
//!   - `:<number>`: centre on a genomic position
//! - `/`: filter by label substring
//! - `?`: show help

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use crate::model::{AppMode, AppState};

/// Actions that can be triggered by keyboard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action (key not recognized)
    None,
    /// Quit the application
    Quit,
    /// Select the next hit
    NextHit,
    /// Select the previous hit
    PreviousHit,
    ScrollLeft,
    ScrollRight,
    /// Go to the lowest hit coordinate (0 or Home)
    GotoStart,
    /// Go to the highest hit coordinate ($ or End)
    GotoEnd,
    ZoomIn,
    ZoomOut,
    /// Scroll layers up by a page
    PageUp,
    /// Scroll layers down by a page
    PageDown,
    /// Scroll layers up by one
    LayerUp,
    /// Scroll layers down by one
    LayerDown,
    /// Enter command mode
    EnterCommandMode,
    /// Enter label search mode
    EnterSearchMode,
    /// Add character to the input buffer
    InputChar(char),
    /// Backspace in the input buffer
    InputBackspace,
    /// Execute current command
    ExecuteCommand,
    /// Apply the typed label filter
    ExecuteSearch,
    /// Leave command or search mode
    CancelInput,
    ShowHelp,
    /// Dismiss the help overlay
    DismissHelp,
    /// Resize event (terminal resized)
    Resize(u16, u16),
}

/// Polls for keyboard events with a timeout.
///
/// Returns `None` if no event occurred within the timeout.
pub fn poll_event(timeout: Duration) -> Option<Event> {
    if event::poll(timeout).ok()? {
        event::read().ok()
    } else {
        None
    }
}

/// Converts a crossterm event to an Action based on current app mode.
pub fn handle_event(event: Event, mode: &AppMode, show_help: bool) -> Action {
    match event {
        Event::Key(key_event) => handle_key_event(key_event, mode, show_help),
        Event::Resize(width, height) => Action::Resize(width, height),
        _ => Action::None,
    }
}

/// Handles a key event based on the current application mode.
fn handle_key_event(key: KeyEvent, mode: &AppMode, show_help: bool) -> Action {
    // If help is shown, any key dismisses it
    if show_help {
        return Action::DismissHelp;
    }

    match mode {
        AppMode::Normal => handle_normal_mode(key),
        AppMode::Command(_) => handle_input_mode(key, Action::ExecuteCommand),
        AppMode::Search(_) => handle_input_mode(key, Action::ExecuteSearch),
    }
}

/// Handles key events in normal mode.
fn handle_normal_mode(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('u') => Action::PageUp,
            KeyCode::Char('d') => Action::PageDown,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Action::NextHit,
        KeyCode::Char('k') | KeyCode::Up => Action::PreviousHit,
        KeyCode::Char('h') | KeyCode::Left => Action::ScrollLeft,
        KeyCode::Char('l') | KeyCode::Right => Action::ScrollRight,
        KeyCode::Char('J') => Action::LayerDown,
        KeyCode::Char('K') => Action::LayerUp,

        KeyCode::Char('0') | KeyCode::Home => Action::GotoStart,
        KeyCode::Char('$') | KeyCode::End => Action::GotoEnd,

        KeyCode::Char('+') | KeyCode::Char('=') => Action::ZoomIn,
        KeyCode::Char('-') => Action::ZoomOut,

        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,

        KeyCode::Char(':') => Action::EnterCommandMode,
        KeyCode::Char('/') => Action::EnterSearchMode,
        KeyCode::Char('?') => Action::ShowHelp,

        _ => Action::None,
    }
}

/// Handles key events while typing a command or a search.
fn handle_input_mode(key: KeyEvent, on_enter: Action) -> Action {
    match key.code {
        KeyCode::Enter => on_enter,
        KeyCode::Esc => Action::CancelInput,
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Char(c) => Action::InputChar(c),
        _ => Action::None,
    }
}

/// Applies an action to the application state.
///
/// Returns `true` if the application should continue, `false` if it should quit.
pub fn apply_action(state: &mut AppState, action: Action) -> bool {
    match action {
        Action::None => {}
        Action::Quit => state.should_quit = true,
        Action::NextHit => state.select_next(),
        Action::PreviousHit => state.select_previous(),
        Action::ScrollLeft => state.scroll_left(),
        Action::ScrollRight => state.scroll_right(),
        Action::GotoStart => state.goto_start(),
        Action::GotoEnd => state.goto_end(),
        Action::ZoomIn => state.zoom_in(),
        Action::ZoomOut => state.zoom_out(),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::LayerUp => state.layer_up(),
        Action::LayerDown => state.layer_down(),
        Action::EnterCommandMode => state.enter_command_mode(),
        Action::EnterSearchMode => state.enter_search_mode(),
        Action::InputChar(c) => state.input_char(c),
        Action::InputBackspace => state.input_backspace(),
        Action::ExecuteCommand => state.execute_command(),
        Action::ExecuteSearch => state.execute_search(),
        Action::CancelInput => state.cancel_input(),
        Action::ShowHelp => state.toggle_help(),
        Action::DismissHelp => state.dismiss_help(),
        Action::Resize(_, _) => {
            // Resize is handled in the main loop with actual terminal dimensions
        }
    }

    !state.should_quit
}

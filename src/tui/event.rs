//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes and to the actions
//! the event loop performs (submitting, loading, quitting).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Lines scrolled per PageUp/PageDown press.
const PAGE_SCROLL: u16 = 10;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    /// Submit the question in the input buffer
    Submit,
    /// Run the side panel's load-files action
    LoadFiles,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Esc` / `Ctrl+C`: quit
/// - `Tab` / `Shift+Tab`: switch panel
/// - `PageUp` / `PageDown`: scroll the answer
/// - Input focused: characters edit the question, `Enter` submits
/// - Sidebar focused: `Enter` or `Space` loads files
///
/// All keys are ignored while a call is pending.
///
/// # Examples
///
/// ```
/// use ragchat::config::PageConfig;
/// use ragchat::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new(PageConfig::default());
/// let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if app.is_pending() {
        return Action::None;
    }

    if key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Tab => {
            app.next_focus();
            return Action::None;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return Action::None;
        }
        KeyCode::PageDown => {
            app.scroll_answer_down(PAGE_SCROLL);
            return Action::None;
        }
        KeyCode::PageUp => {
            app.scroll_answer_up(PAGE_SCROLL);
            return Action::None;
        }
        _ => {}
    }

    match app.focus() {
        Focus::Input => handle_input(app, key),
        Focus::Sidebar => handle_sidebar(key),
    }
}

/// Handles keyboard input when the question input is focused.
fn handle_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::Submit,
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
            Action::None
        }
        KeyCode::Backspace => {
            app.pop_char();
            Action::None
        }
        _ => Action::None,
    }
}

fn handle_sidebar(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => Action::LoadFiles,
        _ => Action::None,
    }
}

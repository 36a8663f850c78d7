use time::OffsetDateTime;

use crate::config::PageConfig;
use crate::dispatcher::{DispatchState, LoadOutcome, Outcome};

/// Application state for the TUI.
///
/// Holds the question buffer, the last outcome, panel focus and the dispatch state.
/// Nothing survives past the next submission: a new outcome replaces the previous
/// answer or message.
#[derive(Debug, Clone)]
pub struct App {
    page: PageConfig,
    /// Question input buffer
    input: String,
    /// Currently focused panel
    focus: Focus,
    /// Whether a service call is in flight
    state: DispatchState,
    /// Busy text shown while pending
    busy: Option<String>,
    /// Answer from the most recent successful submission
    answer: Option<String>,
    /// When the current answer arrived
    answered_at: Option<OffsetDateTime>,
    /// Message for the main panel (answer label, warning or error)
    notice: Option<Notice>,
    /// Message for the side panel
    sidebar_notice: Option<Notice>,
    /// Scroll offset for the answer panel
    answer_scroll: u16,
}

/// Panel focus state for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Question input (typing edits the question, Enter submits)
    Input,
    /// Side panel (Enter triggers the load-files action)
    Sidebar,
}

/// A styled status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Success(t) | Self::Warning(t) | Self::Error(t) => t,
        }
    }
}

impl App {
    /// Creates a new App for the given page.
    ///
    /// # Examples
    ///
    /// ```
    /// use ragchat::config::PageConfig;
    /// use ragchat::tui::{App, Focus};
    ///
    /// let app = App::new(PageConfig::default());
    /// assert_eq!(app.input(), "");
    /// assert_eq!(app.focus(), Focus::Input);
    /// assert!(!app.is_pending());
    /// ```
    pub fn new(page: PageConfig) -> Self {
        Self {
            page,
            input: String::new(),
            focus: Focus::Input,
            state: DispatchState::Idle,
            busy: None,
            answer: None,
            answered_at: None,
            notice: None,
            sidebar_notice: None,
            answer_scroll: 0,
        }
    }

    pub fn page(&self) -> &PageConfig {
        &self.page
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == DispatchState::Pending
    }

    /// Returns the busy indicator text while a call is in flight.
    pub fn busy_text(&self) -> Option<&str> {
        self.busy.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn answered_at(&self) -> Option<OffsetDateTime> {
        self.answered_at
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn sidebar_notice(&self) -> Option<&Notice> {
        self.sidebar_notice.as_ref()
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Toggles focus between the input and the side panel.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Sidebar,
            Focus::Sidebar => Focus::Input,
        };
    }

    /// Same as `next_focus`; with two panels the reverse order is identical.
    pub fn prev_focus(&mut self) {
        self.next_focus();
    }

    /// Enters the pending state for a question submission.
    pub fn begin_query(&mut self) {
        self.state = DispatchState::Pending;
        self.busy = Some(self.page.busy_text.clone());
    }

    /// Enters the pending state for the load-files action.
    pub fn begin_load(&mut self) {
        self.state = DispatchState::Pending;
        self.busy = Some(self.page.load_busy_text.clone());
    }

    /// Applies a submission outcome and returns to idle.
    ///
    /// The previous answer is discarded whatever the outcome.
    pub fn apply_outcome(&mut self, outcome: Outcome) {
        self.finish();
        self.answer_scroll = 0;
        match outcome {
            Outcome::Answered(answer) => {
                self.notice = Some(Notice::Success(self.page.answer_label.clone()));
                self.answer = Some(answer);
                self.answered_at = Some(now());
            }
            Outcome::Warning(message) => {
                self.notice = Some(Notice::Warning(message));
                self.answer = None;
                self.answered_at = None;
            }
            Outcome::Failed(message) => {
                self.notice = Some(Notice::Error(message));
                self.answer = None;
                self.answered_at = None;
            }
        }
    }

    /// Applies a load-files outcome to the side panel and returns to idle.
    pub fn apply_load_outcome(&mut self, outcome: LoadOutcome) {
        self.finish();
        self.sidebar_notice = Some(match outcome {
            LoadOutcome::Success(message) => Notice::Success(message),
            LoadOutcome::Failed(message) => Notice::Error(message),
        });
    }

    fn finish(&mut self) {
        self.state = DispatchState::Idle;
        self.busy = None;
    }

    /// Returns the current answer panel scroll offset.
    pub fn answer_scroll(&self) -> u16 {
        self.answer_scroll
    }

    pub fn scroll_answer_down(&mut self, amount: u16) {
        self.answer_scroll = self.answer_scroll.saturating_add(amount);
    }

    pub fn scroll_answer_up(&mut self, amount: u16) {
        self.answer_scroll = self.answer_scroll.saturating_sub(amount);
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(PageConfig::default())
    }

    #[test]
    fn app_initializes_with_default_state() {
        let app = app();
        assert_eq!(app.input(), "");
        assert_eq!(app.focus(), Focus::Input);
        assert_eq!(app.state(), DispatchState::Idle);
        assert!(app.answer().is_none());
        assert!(app.notice().is_none());
        assert!(app.busy_text().is_none());
    }

    #[test]
    fn focus_toggles_between_panels() {
        let mut app = app();
        app.next_focus();
        assert_eq!(app.focus(), Focus::Sidebar);
        app.next_focus();
        assert_eq!(app.focus(), Focus::Input);
        app.prev_focus();
        assert_eq!(app.focus(), Focus::Sidebar);
    }

    #[test]
    fn begin_query_enters_pending_with_busy_text() {
        let mut app = app();
        app.begin_query();
        assert!(app.is_pending());
        assert_eq!(app.busy_text(), Some(PageConfig::default().busy_text.as_str()));
    }

    #[test]
    fn answered_outcome_returns_to_idle_and_shows_answer() {
        let mut app = app();
        app.begin_query();
        app.scroll_answer_down(5);

        app.apply_outcome(Outcome::Answered("**42**".to_string()));

        assert_eq!(app.state(), DispatchState::Idle);
        assert!(app.busy_text().is_none());
        assert_eq!(app.answer(), Some("**42**"));
        assert!(app.answered_at().is_some());
        assert_eq!(
            app.notice(),
            Some(&Notice::Success(PageConfig::default().answer_label))
        );
        assert_eq!(app.answer_scroll(), 0);
    }

    #[test]
    fn failed_outcome_returns_to_idle_and_discards_answer() {
        let mut app = app();
        app.apply_outcome(Outcome::Answered("old".to_string()));
        app.begin_query();

        app.apply_outcome(Outcome::Failed("An error occurred: boom".to_string()));

        assert_eq!(app.state(), DispatchState::Idle);
        assert!(app.answer().is_none());
        assert_eq!(
            app.notice(),
            Some(&Notice::Error("An error occurred: boom".to_string()))
        );
    }

    #[test]
    fn warning_outcome_replaces_previous_answer() {
        let mut app = app();
        app.apply_outcome(Outcome::Answered("old".to_string()));
        app.apply_outcome(Outcome::Warning("enter a question".to_string()));

        assert!(app.answer().is_none());
        assert_eq!(app.notice().map(Notice::text), Some("enter a question"));
    }

    #[test]
    fn input_is_kept_after_submission() {
        let mut app = app();
        for c in "why?".chars() {
            app.push_char(c);
        }
        app.begin_query();
        app.apply_outcome(Outcome::Answered("because".to_string()));
        assert_eq!(app.input(), "why?");
    }

    #[test]
    fn load_outcome_updates_sidebar_only() {
        let mut app = app();
        app.apply_outcome(Outcome::Answered("kept".to_string()));
        app.begin_load();
        assert_eq!(
            app.busy_text(),
            Some(PageConfig::default().load_busy_text.as_str())
        );

        app.apply_load_outcome(LoadOutcome::Success("Files loaded successfully.".to_string()));

        assert!(!app.is_pending());
        assert_eq!(app.answer(), Some("kept"));
        assert_eq!(
            app.sidebar_notice(),
            Some(&Notice::Success("Files loaded successfully.".to_string()))
        );
    }

    #[test]
    fn scroll_does_not_go_below_zero() {
        let mut app = app();
        app.scroll_answer_down(2);
        app.scroll_answer_up(5);
        assert_eq!(app.answer_scroll(), 0);
    }
}

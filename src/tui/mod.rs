//! Terminal User Interface module for ragchat.
//!
//! Provides the question form, answer panel and side panel using ratatui for
//! rendering and crossterm for terminal management.

use std::io;
use std::panic;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::dispatcher::QueryDispatcher;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, Notice};
use event::Action;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Term> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI, even in error cases, to
/// prevent terminal corruption.
fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic handler.
///
/// Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Discards key presses that queued up while a call was in flight.
fn drain_pending_events() -> Result<()> {
    while crossterm_event::poll(Duration::ZERO)? {
        let _ = crossterm_event::read()?;
    }
    Ok(())
}

/// Runs one submission: busy frame, blocking call, outcome.
fn submit(app: &mut App, dispatcher: &QueryDispatcher, terminal: &mut Term) -> Result<()> {
    let question = app.input().to_string();

    if crate::dispatcher::is_submittable(&question) {
        app.begin_query();
        terminal.draw(|frame| ui::draw(frame, app))?;
    }

    let outcome = dispatcher.submit(&question);
    app.apply_outcome(outcome);
    drain_pending_events()
}

/// Runs the load-files action with the same busy/blocking cycle as a submission.
fn load_files(
    app: &mut App,
    dispatcher: &QueryDispatcher,
    sources: &[String],
    terminal: &mut Term,
) -> Result<()> {
    app.begin_load();
    terminal.draw(|frame| ui::draw(frame, app))?;

    let (outcome, report) = dispatcher.load_files(sources);
    debug!(
        loaded = report.loaded().len(),
        failed = report.failed().len(),
        "load finished"
    );
    app.apply_load_outcome(outcome);
    drain_pending_events()
}

/// Internal event loop implementation.
fn run_event_loop_internal(
    app: &mut App,
    dispatcher: &QueryDispatcher,
    sources: &[String],
    terminal: &mut Term,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
        {
            match event::handle_key_event(app, key) {
                Action::Quit => break,
                Action::Submit => submit(app, dispatcher, terminal)?,
                Action::LoadFiles => load_files(app, dispatcher, sources, terminal)?,
                Action::None => {}
            }
        }
    }

    Ok(())
}

/// Runs the main event loop for the TUI.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, dispatcher: &QueryDispatcher, sources: &[String]) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, dispatcher, sources, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

/// Entry point for the TUI application.
///
/// The dispatcher must already hold a client built from validated configuration;
/// nothing is drawn before this is called.
///
/// # Errors
///
/// Returns an error if terminal initialization or the event loop fails.
pub fn run(dispatcher: &QueryDispatcher, sources: &[String]) -> Result<()> {
    init_panic_hook();

    let mut app = App::new(dispatcher.page().clone());
    info!(sources = sources.len(), "starting TUI");

    run_event_loop(&mut app, dispatcher, sources).context("TUI event loop failed")?;

    info!("TUI exited");
    Ok(())
}

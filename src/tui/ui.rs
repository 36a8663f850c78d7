//! UI rendering functions for the TUI.
//!
//! Lays out the header, the question form with its answer panel, the side panel and
//! the shortcut bar using ratatui widgets.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use time::macros::format_description;

use super::app::{App, Focus, Notice};
use crate::config::TextDirection;

/// Main rendering function for the TUI.
///
/// # Arguments
///
/// * `frame` - The ratatui Frame to render into
/// * `app` - The application state
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    // The side panel sits on the reading-start side
    let (side_area, form_area) = match app.page().direction {
        TextDirection::Ltr => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
                .split(main_chunks[1]);
            (chunks[0], chunks[1])
        }
        TextDirection::Rtl => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
                .split(main_chunks[1]);
            (chunks[1], chunks[0])
        }
    };

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Question input
            Constraint::Length(1), // Status line
            Constraint::Min(0),    // Answer
        ])
        .split(form_area);

    render_header(frame, app, main_chunks[0]);
    render_side_panel(frame, app, side_area);
    render_input(frame, app, form_chunks[0]);
    render_status(frame, app, form_chunks[1]);
    render_answer(frame, app, form_chunks[2]);
    render_shortcut_bar(frame, app, main_chunks[2]);
}

/// Maps the page text direction to paragraph alignment.
pub fn alignment_for(direction: TextDirection) -> Alignment {
    match direction {
        TextDirection::Ltr => Alignment::Left,
        TextDirection::Rtl => Alignment::Right,
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn notice_line(notice: &Notice) -> Line<'_> {
    let (icon, color) = match notice {
        Notice::Success(_) => ("✓ ", Color::Green),
        Notice::Warning(_) => ("! ", Color::Yellow),
        Notice::Error(_) => ("✗ ", Color::Red),
    };
    Line::from(vec![
        Span::styled(icon, Style::default().fg(color)),
        Span::styled(notice.text(), Style::default().fg(color)),
    ])
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.page();
    let text = Text::from(vec![
        Line::from(Span::styled(
            page.title.as_str(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(page.subtitle.as_str()),
    ]);

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::BOTTOM))
        .alignment(alignment_for(page.direction));

    frame.render_widget(paragraph, area);
}

/// Renders the question input with a cursor indicator when focused.
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::Input && !app.is_pending();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.page().input_label.as_str())
        .border_style(focus_style(is_focused));

    let mut content = app.input().to_string();
    if is_focused {
        content.push('█');
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(alignment_for(app.page().direction));

    frame.render_widget(paragraph, area);
}

/// Renders the busy indicator while pending, otherwise the latest notice.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(busy) = app.busy_text() {
        Line::from(Span::styled(
            format!("⏳ {busy}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(notice) = app.notice() {
        notice_line(notice)
    } else {
        Line::default()
    };

    let paragraph = Paragraph::new(line).alignment(alignment_for(app.page().direction));
    frame.render_widget(paragraph, area);
}

/// Renders the answer as markdown.
fn render_answer(frame: &mut Frame, app: &App, area: Rect) {
    let mut block = Block::default().borders(Borders::ALL);
    if let Some(at) = app.answered_at()
        && let Ok(stamp) = at.format(format_description!("[hour]:[minute]:[second]"))
    {
        block = block.title(stamp);
    }

    let text = match app.answer() {
        Some(answer) => tui_markdown::from_str(answer),
        None => Text::default(),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(alignment_for(app.page().direction))
        .scroll((app.answer_scroll(), 0));

    frame.render_widget(paragraph, area);
}

/// Renders the side panel: header, load-files button and its status.
fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let page = app.page();
    let is_focused = app.focus() == Focus::Sidebar && !app.is_pending();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(page.sidebar_header.as_str())
        .border_style(focus_style(is_focused));

    let button_style = if is_focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let mut text = Text::default();
    text.lines.push(Line::from(Span::styled(
        format!("[ {} ]", page.load_label),
        button_style,
    )));
    text.lines.push(Line::from(""));
    if let Some(notice) = app.sidebar_notice() {
        text.lines.push(notice_line(notice));
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(alignment_for(page.direction));

    frame.render_widget(paragraph, area);
}

/// Renders context-aware keyboard shortcuts.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let action = match app.focus() {
        Focus::Input => app.page().submit_label.as_str(),
        Focus::Sidebar => app.page().load_label.as_str(),
    };

    let spans = vec![
        Span::styled("Enter", key_style),
        Span::raw(format!(": {action}")),
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": switch panel"),
        Span::styled(" | ", sep_style),
        Span::styled("PgUp/PgDn", key_style),
        Span::raw(": scroll"),
        Span::styled(" | ", sep_style),
        Span::styled("Esc", key_style),
        Span::raw(": quit"),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

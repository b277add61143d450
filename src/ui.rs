use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPanel};
use crate::highlight::overlay_lines;
use crate::panel::{issue_cards, Badge};

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Editor and issues
            Constraint::Length(1), // Status bar
        ])
        .split(f.size());

    render_title_bar(f, app, chunks[0]);
    render_main_content(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if app.show_help {
        render_help(f, f.size());
    }
}

fn render_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let name = app
        .file_path
        .as_ref()
        .map_or_else(|| "[scratch]".to_string(), |p| p.display().to_string());

    let mut spans = vec![
        Span::styled(" proofpad ", Style::default().fg(Color::Black).bg(Color::Cyan)),
        Span::raw(format!(" {} ", name)),
    ];
    if app.session.is_busy() {
        spans.push(Span::styled(
            " Checking… ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled(
            " Ctrl+K check ",
            Style::default().fg(Color::Gray),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_main_content(f: &mut Frame, app: &App, area: Rect) {
    let horizontal_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65), // Editor
            Constraint::Percentage(35), // Issue cards
        ])
        .split(area);

    render_editor(f, app, horizontal_chunks[0]);
    render_issues(f, app, horizontal_chunks[1]);
}

fn focus_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_editor(f: &mut Frame, app: &App, area: Rect) {
    let editing = app.focus == FocusPanel::Editor;
    let active_issue = (app.focus == FocusPanel::Issues).then_some(app.selected_issue);
    let cursor = editing.then(|| app.session.buffer().cursor());

    let lines = overlay_lines(
        app.session.text(),
        app.session.issues().as_slice(),
        active_issue,
        cursor,
    );

    let editor = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Text")
                .borders(Borders::ALL)
                .border_style(focus_style(editing)),
        )
        .scroll(editor_scroll(app.session.buffer().cursor_line_col(), area));

    f.render_widget(editor, area);
}

/// Scroll offsets (rows, columns) that keep the cursor inside the bordered
/// editor area. Long lines scroll sideways instead of wrapping so overlay
/// positions stay one cell per character.
fn editor_scroll((line, column): (usize, usize), area: Rect) -> (u16, u16) {
    let rows = area.height.saturating_sub(2) as usize;
    // One spare column for the block cursor past the end of a line.
    let columns = area.width.saturating_sub(2) as usize;
    let vertical = line.saturating_sub(rows.saturating_sub(1));
    let horizontal = column.saturating_sub(columns.saturating_sub(1));
    (
        vertical.min(u16::MAX as usize) as u16,
        horizontal.min(u16::MAX as usize) as u16,
    )
}

fn render_issues(f: &mut Frame, app: &App, area: Rect) {
    let reviewing = app.focus == FocusPanel::Issues;
    let issues = app.session.issues().as_slice();
    let badge = Badge::from_issues(issues);

    let mut title = vec![Span::raw("Issues ")];
    if !badge.hidden {
        let badge_style = if badge.grammar_only {
            Style::default().fg(Color::White).bg(Color::Blue)
        } else {
            Style::default().fg(Color::White).bg(Color::Red)
        };
        title.push(Span::styled(format!(" {} ", badge.count), badge_style));
    }

    let selected = reviewing.then_some((app.selected_issue, app.selected_choice));
    let cards = issue_cards(issues, app.config.ui.max_replacements, selected);

    let list = List::new(cards).block(
        Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(focus_style(reviewing)),
    );

    let mut state = ListState::default().with_selected(selected.map(|(i, _)| i));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.session.stats();
    let mut text = format!("{} | {}", stats.char_label(), stats.word_label());

    if let Some(checked) = app.session.last_checked() {
        text.push_str(&format!(" | Checked {}", checked.format("%H:%M:%S")));
    }

    let (line, column) = app.session.buffer().cursor_line_col();
    text.push_str(&format!(" | Ln {}, Col {} | F1 help", line + 1, column + 1));

    // Show error or info message if present
    let mut style = Style::default().bg(Color::Blue).fg(Color::White);
    if let Some(error) = &app.error_message {
        text = format!("ERROR: {}", error);
        style = Style::default().bg(Color::Red).fg(Color::White);
    } else if let Some(info) = &app.info_message {
        text = format!("INFO: {}", info);
    }

    f.render_widget(Paragraph::new(text).style(style), area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from("proofpad help"),
        Line::from(""),
        Line::from("Anywhere:"),
        Line::from("  Ctrl+K - Check text"),
        Line::from("  Ctrl+S - Save file"),
        Line::from("  Ctrl+Q - Quit"),
        Line::from(""),
        Line::from("Editor:"),
        Line::from("  Type to edit, arrows/Home/End to move"),
        Line::from("  Tab - Review issues"),
        Line::from(""),
        Line::from("Issues:"),
        Line::from("  Tab/↓, Shift+Tab/↑ - Next/previous issue"),
        Line::from("  ←/→ - Choose replacement"),
        Line::from("  Enter or 1-9 - Apply replacement"),
        Line::from("  Esc - Back to editor"),
        Line::from(""),
        Line::from("Press any key to close"),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .wrap(Wrap { trim: false });

    let centered_area = centered_rect(60, 70, area);
    f.render_widget(Clear, centered_area);
    f.render_widget(help, centered_area);
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

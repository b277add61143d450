use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListItem;

use crate::buffer::utf16_range_to_bytes;
use crate::highlight::escape_html;
use crate::issue::{Issue, IssueContext, IssueType};

pub const MAX_REPLACEMENTS: usize = 5;

/// Issue count shown next to the panel title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub count: usize,
    pub hidden: bool,
    /// No spelling issue remains; everything left is grammar/other.
    pub grammar_only: bool,
}

impl Badge {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let count = issues.len();
        Self {
            count,
            hidden: count == 0,
            grammar_only: !issues.iter().any(Issue::is_misspelling),
        }
    }
}

pub fn render_badge_html(badge: &Badge) -> String {
    if badge.hidden {
        return r#"<span class="badge" hidden></span>"#.to_string();
    }
    let class = if badge.grammar_only {
        "badge badge-grammar-only"
    } else {
        "badge"
    };
    format!(r#"<span class="{}">{}</span>"#, class, badge.count)
}

/// `(before, error, after)` slices of the context window.
pub fn context_parts(context: &IssueContext) -> (&str, &str, &str) {
    let range = utf16_range_to_bytes(&context.text, context.offset, context.length);
    (
        &context.text[..range.start],
        &context.text[range.clone()],
        &context.text[range.end..],
    )
}

/// One card per issue in set order, or the all-clear placeholder. Buttons
/// carry identifiers only; the replacement text is looked up from state with
/// [`resolve_choice`] when clicked.
pub fn render_panel_html(issues: &[Issue], max_replacements: usize) -> String {
    if issues.is_empty() {
        return r#"<div class="no-issues">No issues found. Your text looks good!</div>"#.to_string();
    }

    let mut html = String::new();
    for (index, issue) in issues.iter().enumerate() {
        html.push_str(&render_card_html(index, issue, max_replacements));
    }
    html
}

fn render_card_html(index: usize, issue: &Issue, max_replacements: usize) -> String {
    let (before, error, after) = context_parts(&issue.context);

    let mut card = format!(
        r#"<div class="issue-card {}" id="issue-card-{}" data-issue="{}">"#,
        issue.issue_type.css_class(),
        index,
        index
    );
    card.push_str(&format!(
        r#"<div class="issue-type">{}</div>"#,
        issue.issue_type.label()
    ));
    card.push_str(&format!(
        r#"<div class="issue-message">{}</div>"#,
        escape_html(&issue.message)
    ));
    card.push_str(&format!(
        r#"<div class="issue-context">{}<mark class="context-error">{}</mark>{}</div>"#,
        escape_html(before),
        escape_html(error),
        escape_html(after)
    ));

    if !issue.replacements.is_empty() {
        card.push_str(r#"<div class="replacements">"#);
        for (choice, replacement) in issue.replacements.iter().take(max_replacements).enumerate() {
            card.push_str(&format!(
                r#"<button class="replacement" data-issue="{}" data-choice="{}">{}</button>"#,
                index,
                choice,
                escape_html(replacement)
            ));
        }
        card.push_str("</div>");
    }

    card.push_str("</div>");
    card
}

/// Look up the replacement a card button stands for.
pub fn resolve_choice(issues: &[Issue], index: usize, choice: usize) -> Option<&str> {
    issues
        .get(index)?
        .replacements
        .get(choice)
        .map(String::as_str)
}

fn card_header(issue: &Issue, type_color: Color) -> Line<'static> {
    let mut header = vec![
        Span::styled(
            format!("[{}] ", issue.issue_type.label()),
            Style::default().fg(type_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(issue.message.clone()),
    ];
    if let Some(rule) = issue.rule_label() {
        header.push(Span::styled(
            format!(" ({})", rule),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(header)
}

/// Terminal cards, same order and content as the HTML panel.
pub fn issue_cards(
    issues: &[Issue],
    max_replacements: usize,
    selected: Option<(usize, usize)>,
) -> Vec<ListItem<'static>> {
    if issues.is_empty() {
        return vec![ListItem::new(Line::from(Span::styled(
            "No issues found. Your text looks good!",
            Style::default().fg(Color::Green),
        )))];
    }

    issues
        .iter()
        .enumerate()
        .map(|(index, issue)| {
            let (before, error, after) = context_parts(&issue.context);
            let type_color = match issue.issue_type {
                IssueType::Misspelling => Color::Red,
                IssueType::GrammarOrOther => Color::Blue,
            };

            let mut lines = vec![
                card_header(issue, type_color),
                Line::from(vec![
                    Span::styled(before.to_string(), Style::default().fg(Color::Gray)),
                    Span::styled(
                        error.to_string(),
                        Style::default().fg(type_color).add_modifier(Modifier::UNDERLINED),
                    ),
                    Span::styled(after.to_string(), Style::default().fg(Color::Gray)),
                ]),
            ];

            let mut choices = Vec::new();
            for (choice, replacement) in issue.replacements.iter().take(max_replacements).enumerate() {
                let style = if selected == Some((index, choice)) {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Yellow)
                };
                choices.push(Span::styled(format!(" {} ", replacement), style));
                choices.push(Span::raw(" "));
            }
            if !choices.is_empty() {
                lines.push(Line::from(choices));
            }
            lines.push(Line::from(""));

            let item = ListItem::new(lines);
            if selected.map(|(i, _)| i) == Some(index) {
                item.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                item
            }
        })
        .collect()
}

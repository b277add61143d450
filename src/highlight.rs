use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::buffer::utf16_range_to_bytes;
use crate::issue::{Issue, IssueType};

/// A run of buffer text, either untouched or covered by one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Marked {
        /// Position of the issue in the set (service order).
        index: usize,
        issue_type: IssueType,
        text: &'a str,
    },
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Plain(text) => *text,
            Segment::Marked { text, .. } => *text,
        }
    }
}

/// Split `text` into plain and marked runs. Issues are visited in ascending
/// offset order (ties keep set order) and carry their set index along.
/// Out-of-range issues are clamped to the end of the text; an issue that
/// starts inside an earlier marked run is skipped.
pub fn segments<'a>(text: &'a str, issues: &[Issue]) -> Vec<Segment<'a>> {
    let mut ordered: Vec<(usize, &Issue)> = issues.iter().enumerate().collect();
    ordered.sort_by_key(|(_, issue)| issue.offset);

    let mut out = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut cursor = 0;

    for (index, issue) in ordered {
        let range = utf16_range_to_bytes(text, issue.offset, issue.length);
        if range.start < cursor {
            log::debug!("Skipping overlapping issue {} at offset {}", index, issue.offset);
            continue;
        }
        if range.start > cursor {
            out.push(Segment::Plain(&text[cursor..range.start]));
        }
        out.push(Segment::Marked {
            index,
            issue_type: issue.issue_type,
            text: &text[range.clone()],
        });
        cursor = range.end;
    }

    if cursor < text.len() {
        out.push(Segment::Plain(&text[cursor..]));
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Overlay markup for the text behind the editor: escaped text with every
/// issue wrapped in a span addressed by its set index.
pub fn render_overlay_html(text: &str, issues: &[Issue]) -> String {
    let mut html = String::with_capacity(text.len() + issues.len() * 64);

    for segment in segments(text, issues) {
        match segment {
            Segment::Plain(plain) => html.push_str(&escape_html(plain)),
            Segment::Marked {
                index,
                issue_type,
                text,
            } => {
                html.push_str(&format!(
                    r#"<span class="issue {}" data-issue="{}">{}</span>"#,
                    issue_type.css_class(),
                    index,
                    escape_html(text)
                ));
            }
        }
    }

    // A textarea swallows a final newline; keep the overlay the same height.
    if text.ends_with('\n') {
        html.push_str("<br>");
    }
    html
}

fn issue_style(issue_type: IssueType) -> Style {
    match issue_type {
        IssueType::Misspelling => Style::default().bg(Color::Red).fg(Color::White),
        IssueType::GrammarOrOther => Style::default().bg(Color::Blue).fg(Color::White),
    }
}

/// Terminal rendering of the same overlay: one `Line` per buffer line, issue
/// runs styled by type, the active issue underlined and a block cursor drawn
/// at `cursor` (a byte index) when given.
pub fn overlay_lines(
    text: &str,
    issues: &[Issue],
    active_issue: Option<usize>,
    cursor: Option<usize>,
) -> Vec<Line<'static>> {
    let cursor_style = Style::default().fg(Color::Black).bg(Color::White);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut pos = 0;
    let mut cursor_drawn = false;

    for segment in segments(text, issues) {
        let style = match &segment {
            Segment::Plain(_) => Style::default(),
            Segment::Marked {
                index, issue_type, ..
            } => {
                let style = issue_style(*issue_type);
                if Some(*index) == active_issue {
                    style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                } else {
                    style
                }
            }
        };

        let seg_text = segment.text();
        let mut run_start = 0;
        for (i, ch) in seg_text.char_indices() {
            let absolute = pos + i;
            let at_cursor = cursor == Some(absolute);
            if ch == '\n' || at_cursor {
                if i > run_start {
                    current.push(Span::styled(seg_text[run_start..i].to_string(), style));
                }
                if at_cursor {
                    cursor_drawn = true;
                    let shown = if ch == '\n' { " ".to_string() } else { ch.to_string() };
                    current.push(Span::styled(shown, cursor_style));
                }
                if ch == '\n' {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                run_start = i + ch.len_utf8();
            }
        }
        if run_start < seg_text.len() {
            current.push(Span::styled(seg_text[run_start..].to_string(), style));
        }
        pos += seg_text.len();
    }

    if cursor.is_some() && !cursor_drawn {
        current.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(current));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::tests::issue;
    use proptest::prelude::*;

    fn strip_tags(html: &str) -> String {
        let mut out = String::new();
        let mut in_tag = false;
        for ch in html.chars() {
            match ch {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(ch),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom's & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#039;s &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn test_wraps_issue_with_index_and_class() {
        let text = "I has a dog";
        let issues = vec![issue(text, 2, 3, IssueType::GrammarOrOther, &["have"])];
        assert_eq!(
            render_overlay_html(text, &issues),
            r#"I <span class="issue issue-grammar" data-issue="0">has</span> a dog"#
        );
    }

    #[test]
    fn test_issues_processed_in_offset_order() {
        let text = "ab cde fghij";
        let issues = vec![
            issue(text, 5, 3, IssueType::GrammarOrOther, &[]),
            issue(text, 0, 2, IssueType::Misspelling, &[]),
        ];

        let segs = segments(text, &issues);
        let marked: Vec<(usize, &str)> = segs
            .iter()
            .filter_map(|s| match s {
                Segment::Marked { index, text, .. } => Some((*index, *text)),
                Segment::Plain(_) => None,
            })
            .collect();
        // Offset 0 first, but each span keeps its original set index.
        assert_eq!(marked, vec![(1, "ab"), (0, "e f")]);

        let html = render_overlay_html(text, &issues);
        assert!(html.starts_with(r#"<span class="issue issue-spelling" data-issue="1">ab</span>"#));
        assert_eq!(strip_tags(&html), text);
    }

    #[test]
    fn test_user_markup_is_escaped() {
        let text = "<b>teh</b> & more";
        let issues = vec![issue(text, 3, 3, IssueType::Misspelling, &["the"])];
        let html = render_overlay_html(text, &issues);
        assert_eq!(
            html,
            r#"&lt;b&gt;<span class="issue issue-spelling" data-issue="0">teh</span>&lt;/b&gt; &amp; more"#
        );
    }

    #[test]
    fn test_trailing_newline_gets_line_break() {
        assert_eq!(render_overlay_html("line\n", &[]), "line\n<br>");
        assert_eq!(render_overlay_html("line", &[]), "line");
    }

    #[test]
    fn test_overlapping_and_out_of_range_issues_do_not_panic() {
        let text = "abcdef";
        let issues = vec![
            issue(text, 0, 4, IssueType::GrammarOrOther, &[]),
            issue(text, 2, 2, IssueType::Misspelling, &[]),
            issue(text, 5, 10, IssueType::Misspelling, &[]),
            issue(text, 40, 1, IssueType::Misspelling, &[]),
        ];
        let segs = segments(text, &issues);
        let rebuilt: String = segs.iter().map(|s| s.text()).collect();
        assert_eq!(rebuilt, text);
        assert_eq!(
            segs[0],
            Segment::Marked {
                index: 0,
                issue_type: IssueType::GrammarOrOther,
                text: "abcd"
            }
        );
    }

    #[test]
    fn test_overlay_lines_split_on_newlines_and_draw_cursor() {
        let text = "teh cat\nsat";
        let issues = vec![issue(text, 0, 3, IssueType::Misspelling, &["the"])];
        let lines = overlay_lines(text, &issues, None, Some(text.len()));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "teh");
        assert_eq!(lines[0].spans[0].style.bg, Some(Color::Red));
        assert_eq!(lines[1].spans.last().unwrap().content, " ");
    }

    #[test]
    fn test_overlay_lines_cursor_inside_issue() {
        let text = "teh";
        let issues = vec![issue(text, 0, 3, IssueType::Misspelling, &[])];
        let lines = overlay_lines(text, &issues, Some(0), Some(1));
        let contents: Vec<&str> = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(contents, vec!["t", "e", "h"]);
        assert_eq!(lines[0].spans[1].style.bg, Some(Color::White));
    }

    proptest! {
        #[test]
        fn stripped_overlay_equals_escaped_text(
            text in "[a-z<>&'\" ]{1,60}",
            cuts in proptest::collection::vec((0usize..60, 1usize..6), 0..6),
        ) {
            // Build a sorted, non-overlapping issue set inside the text.
            let len = text.len();
            let mut starts: Vec<(usize, usize)> = cuts
                .into_iter()
                .map(|(s, l)| (s % len, l))
                .collect();
            starts.sort();
            let mut issues = Vec::new();
            let mut next_free = 0;
            for (start, length) in starts {
                if start < next_free {
                    continue;
                }
                let length = length.min(len - start);
                issues.push(issue(&text, start, length, IssueType::Misspelling, &[]));
                next_free = start + length;
            }

            let html = render_overlay_html(&text, &issues);
            prop_assert_eq!(strip_tags(&html), escape_html(&text));
        }
    }
}

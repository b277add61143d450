use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::highlight::escape_html;
use crate::panel::render_badge_html;
use crate::session::EditSession;

const PAGE_STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem; display: flex; gap: 2rem; }
.editor { flex: 2; }
.overlay { white-space: pre-wrap; word-wrap: break-word; border: 1px solid #ccc; padding: 1rem; line-height: 1.5; }
.issue { cursor: pointer; border-bottom: 2px solid; }
.issue-spelling { background: #fde2e2; border-color: #e53e3e; }
.issue-grammar { background: #e2ecfd; border-color: #3b6fe5; }
.stats { color: #666; margin-top: .5rem; }
.results { flex: 1; }
.badge { background: #e53e3e; color: #fff; border-radius: 1rem; padding: 0 .6rem; }
.badge-grammar-only { background: #3b6fe5; }
.issue-card { border: 1px solid #ddd; border-radius: .5rem; padding: .75rem; margin-bottom: .75rem; }
.issue-card.focused { box-shadow: 0 0 0 2px #f6ad55; }
.issue-type { font-size: .8rem; text-transform: uppercase; color: #666; }
.context-error { background: #fde2e2; }
.replacement { margin: .25rem .25rem 0 0; }
.no-issues { color: #2f855a; }
"#;

// Clicking a highlighted span brings its card into view.
const PAGE_SCRIPT: &str = r#"
document.querySelector('.overlay').addEventListener('click', function (event) {
  var span = event.target.closest('[data-issue]');
  if (!span) { return; }
  var card = document.getElementById('issue-card-' + span.dataset.issue);
  if (!card) { return; }
  document.querySelectorAll('.issue-card.focused').forEach(function (c) { c.classList.remove('focused'); });
  card.classList.add('focused');
  card.scrollIntoView({ behavior: 'smooth', block: 'nearest' });
});
"#;

/// Standalone page with the overlay, stats, badge and issue panel for the
/// session's current state.
pub fn render_page(session: &EditSession, title: &str, max_replacements: usize) -> String {
    let stats = session.stats();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<section class="editor">
<h1>{title}</h1>
<div class="overlay">{overlay}</div>
<div class="stats"><span class="char-count">{chars}</span> · <span class="word-count">{words}</span></div>
</section>
<section class="results">
<h2>Issues {badge}</h2>
{panel}
</section>
<script>{script}</script>
</body>
</html>
"#,
        title = escape_html(title),
        style = PAGE_STYLE,
        overlay = session.overlay_html(),
        chars = stats.char_label(),
        words = stats.word_label(),
        badge = render_badge_html(&session.badge()),
        panel = session.panel_html(max_replacements),
        script = PAGE_SCRIPT,
    )
}

pub fn write_page(path: &Path, page: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, page).with_context(|| format!("Failed to write {}", path.display()))
}

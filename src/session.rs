use chrono::{DateTime, Local};
use thiserror::Error;

use crate::buffer::TextBuffer;
use crate::checker::CheckError;
use crate::highlight::render_overlay_html;
use crate::issue::{Issue, IssueSet};
use crate::panel::{render_panel_html, resolve_choice, Badge};
use crate::stats::TextStats;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("No issue with index {0}")]
    NoSuchIssue(usize),

    #[error("Issue {index} has no replacement {choice}")]
    NoSuchChoice { index: usize, choice: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    Idle,
    Checking { request_id: u64 },
    Rendered,
    Failed,
}

/// Text to hand to the checker under a fresh request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTicket {
    pub request_id: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Rendered { issue_count: usize },
    Failed { message: &'static str },
    /// Superseded by a newer request or by an edit; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Buffer, issue set and check cycle for one editing session. Every view
/// (overlay, panel, badge, stats) is derived from this value.
#[derive(Debug, Clone)]
pub struct EditSession {
    buffer: TextBuffer,
    issues: IssueSet,
    stats: TextStats,
    phase: CheckPhase,
    latest_request_id: u64,
    /// Bumped on every content change.
    revision: u64,
    /// Revision the latest request was issued against.
    latest_request_revision: u64,
    last_checked: Option<DateTime<Local>>,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new("")
    }
}

impl EditSession {
    pub fn new(text: impl Into<String>) -> Self {
        let buffer = TextBuffer::new(text);
        let stats = TextStats::from_text(buffer.text());
        Self {
            buffer,
            issues: IssueSet::default(),
            stats,
            phase: CheckPhase::Idle,
            latest_request_id: 0,
            revision: 0,
            latest_request_revision: 0,
            last_checked: None,
        }
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn issues(&self) -> &IssueSet {
        &self.issues
    }

    pub fn stats(&self) -> TextStats {
        self.stats
    }

    pub fn phase(&self) -> CheckPhase {
        self.phase
    }

    /// A check is outstanding: the trigger is disabled and the busy
    /// indicator shown.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, CheckPhase::Checking { .. })
    }

    pub fn last_checked(&self) -> Option<DateTime<Local>> {
        self.last_checked
    }

    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert_char(ch);
        self.content_changed();
    }

    pub fn backspace(&mut self) {
        if self.buffer.backspace() {
            self.content_changed();
        }
    }

    pub fn delete(&mut self) {
        if self.buffer.delete() {
            self.content_changed();
        }
    }

    /// Replace the whole buffer, as a host does when it hands over the raw
    /// content of its edit surface.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer.set_text(text);
        self.content_changed();
    }

    pub fn move_cursor(&mut self, motion: Motion) {
        match motion {
            Motion::Left => self.buffer.move_left(),
            Motion::Right => self.buffer.move_right(),
            Motion::Up => self.buffer.move_up(),
            Motion::Down => self.buffer.move_down(),
            Motion::Home => self.buffer.move_home(),
            Motion::End => self.buffer.move_end(),
        }
    }

    fn content_changed(&mut self) {
        self.revision += 1;
        self.stats = TextStats::from_text(self.buffer.text());
        // Offsets are meaningless once the text moves under them.
        self.issues.clear();
        if !self.is_busy() {
            self.phase = CheckPhase::Idle;
        }
    }

    /// Start a check of the current text. Blank text never reaches the
    /// service.
    pub fn begin_check(&mut self) -> Option<CheckTicket> {
        if self.buffer.is_blank() {
            log::debug!("Not checking blank text");
            return None;
        }

        self.latest_request_id += 1;
        self.latest_request_revision = self.revision;
        self.phase = CheckPhase::Checking {
            request_id: self.latest_request_id,
        };
        log::debug!("Issued check request {}", self.latest_request_id);

        Some(CheckTicket {
            request_id: self.latest_request_id,
            text: self.buffer.text().to_string(),
        })
    }

    /// Settle a request. Only the most recently issued request is applied,
    /// and only if the text has not changed since it was issued.
    pub fn complete_check(
        &mut self,
        request_id: u64,
        result: Result<Vec<Issue>, CheckError>,
    ) -> CheckOutcome {
        if request_id != self.latest_request_id {
            log::debug!(
                "Ignoring outdated check response (ID: {} vs current: {})",
                request_id,
                self.latest_request_id
            );
            return CheckOutcome::Stale;
        }
        if !self.is_busy() {
            log::debug!("Check response {} already settled", request_id);
            return CheckOutcome::Stale;
        }

        match result {
            Ok(issues) => {
                if self.latest_request_revision != self.revision {
                    log::debug!("Text changed while request {} was in flight", request_id);
                    self.phase = CheckPhase::Idle;
                    return CheckOutcome::Stale;
                }
                let issue_count = issues.len();
                self.issues = IssueSet::new(issues);
                self.phase = CheckPhase::Rendered;
                self.last_checked = Some(Local::now());
                CheckOutcome::Rendered { issue_count }
            }
            Err(e) => {
                log::warn!("Check request {} failed: {}", request_id, e);
                self.phase = CheckPhase::Failed;
                CheckOutcome::Failed {
                    message: e.user_message(),
                }
            }
        }
    }

    /// Splice `replacement` over issue `index` and start a fresh check of
    /// the result. The old set is dropped rather than remapped.
    pub fn apply_replacement(
        &mut self,
        index: usize,
        replacement: &str,
    ) -> Result<Option<CheckTicket>, SessionError> {
        let issue = self
            .issues
            .get(index)
            .ok_or(SessionError::NoSuchIssue(index))?;
        let (offset, length) = (issue.offset, issue.length);

        self.buffer.splice_utf16(offset, length, replacement);
        self.content_changed();
        Ok(self.begin_check())
    }

    /// Apply replacement `choice` of issue `index`, looked up from the
    /// current set.
    pub fn apply_choice(
        &mut self,
        index: usize,
        choice: usize,
    ) -> Result<Option<CheckTicket>, SessionError> {
        if self.issues.get(index).is_none() {
            return Err(SessionError::NoSuchIssue(index));
        }
        let replacement = resolve_choice(self.issues.as_slice(), index, choice)
            .ok_or(SessionError::NoSuchChoice { index, choice })?
            .to_string();
        self.apply_replacement(index, &replacement)
    }

    pub fn overlay_html(&self) -> String {
        render_overlay_html(self.buffer.text(), self.issues.as_slice())
    }

    pub fn panel_html(&self, max_replacements: usize) -> String {
        render_panel_html(self.issues.as_slice(), max_replacements)
    }

    pub fn badge(&self) -> Badge {
        Badge::from_issues(self.issues.as_slice())
    }
}

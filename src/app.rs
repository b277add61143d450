use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;
use tokio::runtime::Handle;

use crate::async_check::AsyncChecker;
use crate::checker::{CheckError, CheckService, LanguageToolClient};
use crate::config::Config;
use crate::panel::context_parts;
use crate::session::{CheckOutcome, CheckTicket, EditSession, Motion, SessionError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Edit error: {0}")]
    SessionError(#[from] SessionError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPanel {
    Editor,
    Issues,
}

pub struct App {
    pub config: Config,
    pub session: EditSession,
    pub file_path: Option<PathBuf>,
    pub should_quit: bool,
    pub focus: FocusPanel,
    pub show_help: bool,

    // Issue panel selection
    pub selected_issue: usize,
    pub selected_choice: usize,

    pub error_message: Option<String>,
    pub info_message: Option<String>,
    pub message_timeout: Option<Instant>,

    checker: Option<AsyncChecker>,
}

impl App {
    pub fn new(config: Config, text: String, file_path: Option<PathBuf>, runtime: &Handle) -> Self {
        let checker = Self::init_checker(&config, runtime);
        Self::build(config, text, file_path, checker)
    }

    /// Same as [`App::new`] but against a caller-provided service.
    pub fn with_service<S: CheckService>(
        config: Config,
        text: String,
        file_path: Option<PathBuf>,
        service: Arc<S>,
        runtime: &Handle,
    ) -> Self {
        let checker = Some(AsyncChecker::spawn(service, runtime));
        Self::build(config, text, file_path, checker)
    }

    fn build(
        config: Config,
        text: String,
        file_path: Option<PathBuf>,
        checker: Option<AsyncChecker>,
    ) -> Self {
        Self {
            config,
            session: EditSession::new(text),
            file_path,
            should_quit: false,
            focus: FocusPanel::Editor,
            show_help: false,
            selected_issue: 0,
            selected_choice: 0,
            error_message: None,
            info_message: None,
            message_timeout: None,
            checker,
        }
    }

    fn init_checker(config: &Config, runtime: &Handle) -> Option<AsyncChecker> {
        match LanguageToolClient::new(&config.checker) {
            Ok(client) => {
                log::info!(
                    "Checking against {} ({})",
                    client.endpoint(),
                    client.language()
                );
                Some(AsyncChecker::spawn(Arc::new(client), runtime))
            }
            Err(e) => {
                log::warn!("Failed to initialize checking client: {}", e);
                None
            }
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> AppResult<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('k') => {
                    self.request_check();
                    return Ok(());
                }
                KeyCode::Char('s') => return self.save(),
                _ => {}
            }
        }

        if self.show_help {
            self.show_help = false;
            return Ok(());
        }

        match self.focus {
            FocusPanel::Editor => self.handle_editor_input(key),
            FocusPanel::Issues => self.handle_issues_input(key),
        }
    }

    fn handle_editor_input(&mut self, key: KeyEvent) -> AppResult<()> {
        match key.code {
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Tab => {
                if self.session.issues().is_empty() {
                    self.show_info("No issues to review");
                } else {
                    self.focus = FocusPanel::Issues;
                    self.clamp_selection();
                }
            }
            KeyCode::Enter => self.session.insert_char('\n'),
            KeyCode::Backspace => self.session.backspace(),
            KeyCode::Delete => self.session.delete(),
            KeyCode::Left => self.session.move_cursor(Motion::Left),
            KeyCode::Right => self.session.move_cursor(Motion::Right),
            KeyCode::Up => self.session.move_cursor(Motion::Up),
            KeyCode::Down => self.session.move_cursor(Motion::Down),
            KeyCode::Home => self.session.move_cursor(Motion::Home),
            KeyCode::End => self.session.move_cursor(Motion::End),
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.session.insert_char(c);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_issues_input(&mut self, key: KeyEvent) -> AppResult<()> {
        let count = self.session.issues().len();
        if count == 0 {
            self.focus = FocusPanel::Editor;
            return Ok(());
        }

        match key.code {
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Esc => self.focus = FocusPanel::Editor,
            KeyCode::Tab | KeyCode::Down => {
                self.selected_issue = (self.selected_issue + 1) % count;
                self.selected_choice = 0;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected_issue = (self.selected_issue + count - 1) % count;
                self.selected_choice = 0;
            }
            KeyCode::Right => {
                if self.selected_choice + 1 < self.visible_choices() {
                    self.selected_choice += 1;
                }
            }
            KeyCode::Left => {
                self.selected_choice = self.selected_choice.saturating_sub(1);
            }
            KeyCode::Enter => self.apply_selected(self.selected_choice)?,
            KeyCode::Char(c @ '1'..='9') => {
                let choice = c as usize - '1' as usize;
                if choice < self.visible_choices() {
                    self.apply_selected(choice)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visible_choices(&self) -> usize {
        self.session
            .issues()
            .get(self.selected_issue)
            .map_or(0, |issue| {
                issue.replacements.len().min(self.config.ui.max_replacements)
            })
    }

    fn clamp_selection(&mut self) {
        let count = self.session.issues().len();
        if self.selected_issue >= count {
            self.selected_issue = 0;
        }
        if self.selected_choice >= self.visible_choices() {
            self.selected_choice = 0;
        }
    }

    /// Apply replacement `choice` of the selected card.
    fn apply_selected(&mut self, choice: usize) -> AppResult<()> {
        if self.visible_choices() == 0 {
            self.show_info("No suggestions for this issue");
            return Ok(());
        }

        let index = self.selected_issue;
        let original = self
            .session
            .issues()
            .get(index)
            .map(|issue| issue.context.clone());
        let ticket = self.session.apply_choice(index, choice)?;

        if let Some(context) = original {
            let (_, error, _) = context_parts(&context);
            self.show_info(&format!("Replaced '{}'", error));
        }
        self.focus = FocusPanel::Editor;
        self.selected_issue = 0;
        self.selected_choice = 0;

        if let Some(ticket) = ticket {
            self.dispatch(ticket);
        }
        Ok(())
    }

    /// Explicit check trigger. Disabled while a check is outstanding.
    pub fn request_check(&mut self) {
        if self.session.is_busy() {
            return;
        }
        match self.session.begin_check() {
            Some(ticket) => self.dispatch(ticket),
            None => self.show_info("Nothing to check"),
        }
    }

    fn dispatch(&mut self, ticket: CheckTicket) {
        match &self.checker {
            Some(checker) => checker.request_check(ticket.request_id, ticket.text),
            None => {
                let outcome = self
                    .session
                    .complete_check(ticket.request_id, Err(CheckError::Unavailable));
                self.report(outcome);
            }
        }
    }

    fn report(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::Rendered { issue_count } => {
                self.selected_issue = 0;
                self.selected_choice = 0;
                match issue_count {
                    0 => self.show_info("No issues found"),
                    1 => self.show_info("1 issue found"),
                    n => self.show_info(&format!("{} issues found", n)),
                }
            }
            CheckOutcome::Failed { message } => self.show_error(message),
            CheckOutcome::Stale => {}
        }
    }

    fn save(&mut self) -> AppResult<()> {
        let Some(path) = self.file_path.clone() else {
            self.show_error("No file to save to");
            return Ok(());
        };
        std::fs::write(&path, self.session.text())?;
        log::info!("Saved {}", path.display());
        self.show_info(&format!("Saved {}", path.display()));
        Ok(())
    }

    pub fn show_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
        self.info_message = None;
        self.message_timeout =
            Some(Instant::now() + Duration::from_secs(self.config.ui.message_timeout_secs));
    }

    pub fn show_info(&mut self, message: &str) {
        self.info_message = Some(message.to_string());
        self.error_message = None;
        self.message_timeout =
            Some(Instant::now() + Duration::from_secs(self.config.ui.message_timeout_secs));
    }

    pub fn tick(&mut self) -> AppResult<()> {
        // Settle any finished checks
        let mut outcomes = Vec::new();
        if let Some(checker) = self.checker.as_mut() {
            while let Some(response) = checker.try_receive_response() {
                outcomes.push(
                    self.session
                        .complete_check(response.request_id, response.result),
                );
            }
        }
        for outcome in outcomes {
            self.report(outcome);
        }

        // Clear messages after timeout
        if let Some(timeout) = self.message_timeout {
            if Instant::now() > timeout {
                self.error_message = None;
                self.info_message = None;
                self.message_timeout = None;
            }
        }

        Ok(())
    }
}

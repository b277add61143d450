use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use log::error;
use ratatui::prelude::*;

use proofpad::app::{App, AppError, AppResult};
use proofpad::checker::{CheckService, LanguageToolClient};
use proofpad::config::{Config, DEFAULT_CONFIG_PATH};
use proofpad::export::{render_page, write_page};
use proofpad::session::{CheckOutcome, EditSession};
use proofpad::ui::ui;

/// Text editor that highlights spelling and grammar issues from a LanguageTool server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to config file
    #[clap(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,

    /// Checking service endpoint (overrides config)
    #[clap(long)]
    endpoint: Option<String>,

    /// Language code sent to the checking service (overrides config)
    #[clap(short, long)]
    language: Option<String>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Edit text interactively (the default)
    Edit {
        /// File to open; starts with an empty buffer when missing
        file: Option<PathBuf>,
    },

    /// Check a file once and write an HTML report
    Check {
        /// File to check
        file: PathBuf,

        /// Where to write the report (defaults to FILE.html)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config_path = shellexpand::tilde(&args.config).into_owned();
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load config at {}: {}. Using defaults.", config_path, e);
            Config::default()
        }
    }
    .with_overrides(args.endpoint.clone(), args.language.clone());

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    match args.command.unwrap_or(Commands::Edit { file: None }) {
        Commands::Check { file, output } => {
            init_logger(args.debug, None);
            runtime.block_on(run_check(&config, &file, output))
        }
        Commands::Edit { file } => {
            init_logger(args.debug, Some(log_file_path()));
            run_editor(config, file, runtime.handle())
        }
    }
}

/// Logs go to stderr, or to `log_file` while the terminal is taken over.
fn init_logger(debug: bool, log_file: Option<PathBuf>) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    if let Some(path) = log_file {
        match open_log_file(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            // Without a log file, stay quiet rather than draw over the UI.
            Err(e) => {
                eprintln!("Logging disabled, cannot open {}: {}", path.display(), e);
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

fn log_file_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("proofpad")
        .join("proofpad.log")
}

async fn run_check(config: &Config, file: &Path, output: Option<PathBuf>) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut session = EditSession::new(text);

    match session.begin_check() {
        Some(ticket) => {
            let client = LanguageToolClient::new(&config.checker)
                .context("Failed to create checking client")?;
            let result = client.check(&ticket.text).await;
            match session.complete_check(ticket.request_id, result) {
                CheckOutcome::Failed { message } => bail!("{}", message),
                outcome => log::debug!("Check finished: {:?}", outcome),
            }
        }
        None => println!("{} is blank, nothing to check.", file.display()),
    }

    let output = output.unwrap_or_else(|| {
        let mut name = file.as_os_str().to_owned();
        name.push(".html");
        PathBuf::from(name)
    });
    let title = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
    let page = render_page(&session, &title, config.ui.max_replacements);
    write_page(&output, &page)?;

    let issues = session.issues();
    println!(
        "{}: {} issue{} ({} spelling), {} | {}",
        file.display(),
        issues.len(),
        if issues.len() == 1 { "" } else { "s" },
        issues.misspelling_count(),
        session.stats().char_label(),
        session.stats().word_label()
    );
    for issue in issues {
        let start = proofpad::buffer::utf16_to_byte(session.text(), issue.offset);
        let before = &session.text()[..start];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        let suggestions: Vec<&str> = issue
            .replacements
            .iter()
            .take(config.ui.max_replacements)
            .map(String::as_str)
            .collect();
        println!(
            "  {}:{} [{}] {}{}",
            line,
            column,
            issue.issue_type.label(),
            issue.headline(),
            if suggestions.is_empty() {
                String::new()
            } else {
                format!(" -> {}", suggestions.join(", "))
            }
        );
    }
    println!("Report written to {}", output.display());
    Ok(())
}

fn run_editor(config: Config, file: Option<PathBuf>, runtime: &tokio::runtime::Handle) -> Result<()> {
    let text = match &file {
        Some(path) if path.exists() => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => String::new(),
    };

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("Failed to create terminal")?;

    // Create app state
    let mut app = App::new(config, text, file, runtime);

    // Run the application
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    io::stdout()
        .execute(LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;

    // If there was an error, print it
    if let Err(err) = result {
        error!("Error: {:?}", err);
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> AppResult<()> {
    let mut consecutive_errors = 0;
    const MAX_CONSECUTIVE_ERRORS: u32 = 10;

    loop {
        // Draw UI
        if let Err(e) = terminal.draw(|frame| ui(frame, app)) {
            consecutive_errors += 1;
            if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                return Err(AppError::IoError(e));
            }
            continue;
        }

        // Handle events
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Handle input with error recovery
                    if let Err(e) = app.handle_key_event(key) {
                        app.show_error(&format!("Error: {}", e));
                        consecutive_errors += 1;

                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            return Err(e);
                        }
                    } else {
                        consecutive_errors = 0;
                    }

                    if app.should_quit {
                        return Ok(());
                    }
                }
            }
        }

        // Settle finished checks and expire messages
        if let Err(e) = app.tick() {
            app.show_error(&format!("Update error: {}", e));
            consecutive_errors += 1;

            if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("proofpad.log");
        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_reports_bad_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        assert!(open_log_file(&blocker.join("proofpad.log")).is_err());
    }
}

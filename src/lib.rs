pub mod app;
pub mod async_check;
pub mod buffer;
pub mod checker;
pub mod config;
pub mod export;
pub mod highlight;
pub mod issue;
pub mod panel;
pub mod session;
pub mod stats;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use checker::{CheckError, CheckService, LanguageToolClient};
pub use config::Config;
pub use issue::{Issue, IssueSet, IssueType};
pub use session::{CheckOutcome, EditSession};
pub use stats::TextStats;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use thiserror::Error;

use crate::config::CheckerConfig;
use crate::issue::{parse_matches, Issue};

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Checking service returned status {0}")]
    Status(u16),

    #[error("Malformed response from checking service: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Checking client is not available")]
    Unavailable,
}

impl CheckError {
    /// The one message shown to the user, whatever went wrong.
    pub fn user_message(&self) -> &'static str {
        "Could not check text. Please try again."
    }
}

/// Something that turns text into a list of issues.
#[async_trait]
pub trait CheckService: Send + Sync + 'static {
    async fn check(&self, text: &str) -> Result<Vec<Issue>, CheckError>;
}

/// Client for a LanguageTool-compatible `/v2/check` endpoint.
pub struct LanguageToolClient {
    client: Client,
    endpoint: String,
    language: String,
}

impl LanguageToolClient {
    pub fn new(config: &CheckerConfig) -> Result<Self, CheckError> {
        let client = Client::builder()
            .user_agent(concat!("proofpad/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl CheckService for LanguageToolClient {
    async fn check(&self, text: &str) -> Result<Vec<Issue>, CheckError> {
        log::debug!(
            "Sending {} chars to {} ({})",
            text.chars().count(),
            self.endpoint,
            self.language
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Checking service answered {}", status);
            return Err(CheckError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let issues = parse_matches(&body)?;
        log::debug!("Checking service reported {} issues", issues.len());
        Ok(issues)
    }
}

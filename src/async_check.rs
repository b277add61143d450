use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::checker::{CheckError, CheckService};
use crate::issue::Issue;

/// Message types for the background checker
#[derive(Debug, Clone)]
pub enum CheckMessage {
    /// Send this text to the checking service
    CheckText { text: String, request_id: u64 },
    /// Stop accepting requests
    Shutdown,
}

/// Outcome of one request, tagged with the id it was issued under.
#[derive(Debug)]
pub struct CheckResponse {
    pub request_id: u64,
    pub result: Result<Vec<Issue>, CheckError>,
}

/// Runs checks off the UI thread. Every request gets its own task, so
/// overlapping requests are allowed; the caller decides which response is
/// current by its request id. Blank requests are dropped without a response.
pub struct AsyncChecker {
    sender: mpsc::UnboundedSender<CheckMessage>,
    response_receiver: mpsc::UnboundedReceiver<CheckResponse>,
}

impl AsyncChecker {
    pub fn spawn<S: CheckService>(service: Arc<S>, runtime: &Handle) -> Self {
        let (msg_sender, msg_receiver) = mpsc::unbounded_channel::<CheckMessage>();
        let (response_sender, response_receiver) = mpsc::unbounded_channel::<CheckResponse>();

        let task_runtime = runtime.clone();
        runtime.spawn(async move {
            Self::background_task(service, task_runtime, msg_receiver, response_sender).await;
        });

        Self {
            sender: msg_sender,
            response_receiver,
        }
    }

    pub fn request_check(&self, request_id: u64, text: String) {
        let message = CheckMessage::CheckText { text, request_id };
        if let Err(e) = self.sender.send(message) {
            log::error!("Failed to send check request: {}", e);
        }
    }

    /// Non-blocking poll for a settled request.
    pub fn try_receive_response(&mut self) -> Option<CheckResponse> {
        self.response_receiver.try_recv().ok()
    }

    /// Wait for the next settled request.
    pub async fn receive_response(&mut self) -> Option<CheckResponse> {
        self.response_receiver.recv().await
    }

    pub fn shutdown(&self) {
        // The worker may already be gone; nothing to report then.
        let _ = self.sender.send(CheckMessage::Shutdown);
    }

    async fn background_task<S: CheckService>(
        service: Arc<S>,
        runtime: Handle,
        mut msg_receiver: mpsc::UnboundedReceiver<CheckMessage>,
        response_sender: mpsc::UnboundedSender<CheckResponse>,
    ) {
        while let Some(message) = msg_receiver.recv().await {
            match message {
                CheckMessage::CheckText { text, request_id } => {
                    if text.trim().is_empty() {
                        log::debug!("Dropping request {}: blank text", request_id);
                        continue;
                    }

                    log::debug!("Starting check request {}", request_id);
                    let service = Arc::clone(&service);
                    let sender = response_sender.clone();
                    runtime.spawn(async move {
                        let result = service.check(&text).await;
                        match &result {
                            Ok(issues) => log::debug!(
                                "Check request {} complete with {} issues",
                                request_id,
                                issues.len()
                            ),
                            Err(e) => log::warn!("Check request {} failed: {}", request_id, e),
                        }
                        if sender.send(CheckResponse { request_id, result }).is_err() {
                            log::debug!("Dropping response {}: receiver closed", request_id);
                        }
                    });
                }
                CheckMessage::Shutdown => {
                    log::info!("Shutting down background checker");
                    break;
                }
            }
        }

        log::info!("Background checker task ended");
    }
}

impl Drop for AsyncChecker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

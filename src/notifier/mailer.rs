//! Transactional-email API client and the best-effort notifier.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::templates;
use super::{NotifyError, OutboundEvent};

/// HTTP client for the external transactional-email API.
pub struct EmailClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl EmailClient {
    /// Create a new email client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the email API (e.g. "https://api.mailer.example")
    /// * `api_key` - Bearer token for the API
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, api_key: String, timeout_sec: u64) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Send one HTML email.
    pub async fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), NotifyError> {
        let url = format!("{}/messages", self.base_url);
        let body = SendMessageBody {
            from,
            to,
            subject,
            html,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Api(format!(
                "send failed with status {}",
                response.status()
            )))
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Delivers outbound pipeline events as emails to the configured admin
/// recipient. Every send is fire-and-forget: failures are logged at
/// warn and swallowed.
pub struct EmailNotifier {
    client: Option<EmailClient>,
    from_address: String,
    admin_address: String,
}

impl EmailNotifier {
    pub fn new(client: Option<EmailClient>, from_address: String, admin_address: String) -> Self {
        Self {
            client,
            from_address,
            admin_address,
        }
    }

    /// A notifier with no configured delivery backend; every event is a
    /// logged no-op.
    pub fn disabled() -> Self {
        Self::new(None, String::new(), String::new())
    }

    /// Deliver one event. Never fails and never blocks the pipeline on
    /// delivery problems.
    pub async fn notify(&self, event: &OutboundEvent) {
        let Some(client) = &self.client else {
            debug!("Email notifications disabled, dropping {:?}", event_name(event));
            return;
        };

        let (subject, html) = match event {
            OutboundEvent::SubmissionReceived { submission_id } => {
                templates::received_email(submission_id)
            }
            OutboundEvent::ReleaseProcessed { release } => templates::complete_email(release),
            OutboundEvent::ProcessingFailed {
                submission_id,
                error,
            } => templates::failed_email(submission_id, error),
        };

        match client
            .send(&self.from_address, &self.admin_address, &subject, &html)
            .await
        {
            Ok(()) => debug!("Sent {} email to {}", event_name(event), self.admin_address),
            Err(e) => warn!(
                "Failed to send {} email (ignored): {}",
                event_name(event),
                e
            ),
        }
    }
}

fn event_name(event: &OutboundEvent) -> &'static str {
    match event {
        OutboundEvent::SubmissionReceived { .. } => "submission_received",
        OutboundEvent::ReleaseProcessed { .. } => "release_processed",
        OutboundEvent::ProcessingFailed { .. } => "processing_failed",
    }
}

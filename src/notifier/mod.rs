//! Best-effort email notifications.
//!
//! The pipeline emits explicit outbound events; delivery is decoupled
//! and never affects pipeline correctness. A failed send is logged and
//! otherwise ignored, including on the pipeline's own failure path.

mod mailer;
mod templates;

pub use mailer::{EmailClient, EmailNotifier};

use thiserror::Error;

use crate::catalog::ReleaseDocument;

/// Errors from the email delivery layer. Always swallowed by the
/// notifier after logging; they never propagate into the pipeline.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Email API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Events the pipeline hands to the notifier.
#[derive(Debug)]
pub enum OutboundEvent {
    /// A submission was received and processing has started.
    SubmissionReceived { submission_id: String },
    /// Processing finished and the release was cataloged.
    ReleaseProcessed { release: ReleaseDocument },
    /// Processing failed with a fatal error.
    ProcessingFailed {
        submission_id: String,
        error: String,
    },
}

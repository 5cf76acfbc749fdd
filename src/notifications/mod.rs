//! Order emails
//!
//! Each order event produces two independent messages, one for the store and
//! one for the customer. Messages go through the [`outbox::Outbox`], which
//! retries delivery off the request path; a message that keeps failing is
//! logged and given up on.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod dispatcher;
pub mod outbox;
pub mod resend;
pub mod templates;

pub use dispatcher::NotificationDispatcher;
pub use outbox::{Outbox, OutboxHandle, OutboxStats};
pub use resend::ResendMailer;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("email transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Stand-in used when no provider key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(to = %message.to, subject = %message.subject, "email provider not configured, message logged only");
        Ok(())
    }
}

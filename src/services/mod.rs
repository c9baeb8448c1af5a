//! Service layer modules for external integrations.
//!
//! Contains the outbound channel clients (SMS gateway, transactional
//! email) and the channel traits the notification dispatcher works
//! against.

pub mod email;
pub mod sms;

use async_trait::async_trait;
use thiserror::Error;

pub use email::EmailClient;
pub use sms::SmsClient;

/// Failure sending through one channel to one recipient. Never escapes
/// the dispatcher; it only feeds the failure log.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel unreachable: {0}")]
    Unreachable(String),

    #[error("provider rejected message ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("malformed recipient address: {0}")]
    BadRecipient(String),
}

/// Receipt for an accepted SMS message.
#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub provider_message_id: Option<String>,
}

/// Outbound SMS gateway, `send(to, text) -> receipt`.
#[async_trait]
pub trait SmsChannel: Send + Sync {
    async fn send(&self, to_phone: &str, message: &str) -> Result<SmsReceipt, ChannelError>;
}

/// Outbound transactional email, `send(to, subject, html) -> ()`.
#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send(
        &self,
        to_address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), ChannelError>;
}

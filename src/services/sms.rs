//! SMS gateway client.
//!
//! Thin JSON client for the HTTP SMS provider. One call per recipient;
//! the dispatcher owns fan-out, timeouts and failure policy.

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChannelError, SmsChannel, SmsReceipt};

#[derive(Clone)]
pub struct SmsClient {
    client: Client,
    base_url: String,
    token: String,
    sender_id: String,
}

#[derive(Serialize)]
struct SendSmsBody<'a> {
    from: &'a str,
    to: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendSmsResponse {
    message_id: Option<String>,
}

#[derive(Deserialize)]
struct GatewayErrorResponse {
    message: Option<String>,
}

impl SmsClient {
    pub fn new(
        base_url: &str,
        token: &str,
        sender_id: &str,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create SMS gateway HTTP client")?;

        tracing::info!(base_url = base_url, sender_id = sender_id, "SMS client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            sender_id: sender_id.to_string(),
        })
    }
}

#[async_trait]
impl SmsChannel for SmsClient {
    async fn send(&self, to_phone: &str, message: &str) -> Result<SmsReceipt, ChannelError> {
        // Gateway expects E.164; reject early instead of burning a request
        if !to_phone.starts_with('+') || to_phone.len() < 8 {
            return Err(ChannelError::BadRecipient(to_phone.to_string()));
        }

        let url = format!("{}/messages", self.base_url);
        debug!(to = to_phone, "SMS gateway request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&SendSmsBody {
                from: &self.sender_id,
                to: to_phone,
                text: message,
            })
            .send()
            .await
            .map_err(|e| ChannelError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .json::<SendSmsResponse>()
                .await
                .unwrap_or(SendSmsResponse { message_id: None });
            Ok(SmsReceipt {
                provider_message_id: body.message_id,
            })
        } else {
            let message = response
                .json::<GatewayErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("SMS gateway error: {status}"));

            Err(ChannelError::Provider {
                status: status.as_u16(),
                message,
            })
        }
    }
}

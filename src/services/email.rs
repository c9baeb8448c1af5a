//! Transactional email client.
//!
//! JSON client for the HTTP email provider, mirroring the SMS gateway
//! client's shape.

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChannelError, EmailChannel};

#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    base_url: String,
    token: String,
    from_address: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ProviderErrorResponse {
    message: Option<String>,
}

impl EmailClient {
    pub fn new(
        base_url: &str,
        token: &str,
        from_address: &str,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create email HTTP client")?;

        tracing::info!(base_url = base_url, from = from_address, "Email client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            from_address: from_address.to_string(),
        })
    }
}

#[async_trait]
impl EmailChannel for EmailClient {
    async fn send(
        &self,
        to_address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), ChannelError> {
        if !to_address.contains('@') {
            return Err(ChannelError::BadRecipient(to_address.to_string()));
        }

        let url = format!("{}/send", self.base_url);
        debug!(to = to_address, subject = subject, "Email provider request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&SendEmailBody {
                from: &self.from_address,
                to: to_address,
                subject,
                html: html_body,
            })
            .send()
            .await
            .map_err(|e| ChannelError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .json::<ProviderErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("email provider error: {status}"));

            Err(ChannelError::Provider {
                status: status.as_u16(),
                message,
            })
        }
    }
}

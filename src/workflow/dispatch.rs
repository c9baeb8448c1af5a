//! Notification dispatcher.
//!
//! Maps an applied workflow event to (recipient, channel, message)
//! triples and fires them concurrently. Outbound notifications are
//! advisory: every per-recipient failure is logged and swallowed, and
//! the top-level call never errors.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SupplierRouting;
use crate::domain::services::ServiceDetail;
use crate::domain::users::AdminContact;
use crate::services::{EmailChannel, SmsChannel};

use super::templates::{
    render_client_email, render_sms, MessageContext, NotificationEvent, RecipientRole,
};

/// Message bound to one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Sms(String),
    Email { subject: String, html: String },
}

/// One resolved notification: who, over what, saying what.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub role: RecipientRole,
    pub to: String,
    pub message: OutboundMessage,
}

impl Dispatch {
    fn channel_name(&self) -> &'static str {
        match self.message {
            OutboundMessage::Sms(_) => "sms",
            OutboundMessage::Email { .. } => "email",
        }
    }
}

/// Outcome counters, for logging and tests only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub failed: usize,
}

pub struct NotificationDispatcher {
    sms: Arc<dyn SmsChannel>,
    email: Arc<dyn EmailChannel>,
    routing: SupplierRouting,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        sms: Arc<dyn SmsChannel>,
        email: Arc<dyn EmailChannel>,
        routing: SupplierRouting,
        send_timeout: Duration,
    ) -> Self {
        Self {
            sms,
            email,
            routing,
            send_timeout,
        }
    }

    /// Compute the recipient set for an event. Pure; separated from the
    /// sending so tests can assert on routing alone.
    pub fn resolve(
        &self,
        detail: &ServiceDetail,
        admins: &[AdminContact],
        event: &NotificationEvent,
    ) -> Vec<Dispatch> {
        let ctx = MessageContext::from_detail(detail);
        let mut out = Vec::new();

        // Client: SMS when a phone is on file, email alongside when present
        if let Some(phone) = detail.client_phone.as_deref() {
            if let Some(text) = render_sms(RecipientRole::Client, event, &ctx) {
                out.push(Dispatch {
                    role: RecipientRole::Client,
                    to: phone.to_string(),
                    message: OutboundMessage::Sms(text),
                });
            }
        }
        if let Some(email) = detail.client_email.as_deref() {
            if let Some((subject, html)) = render_client_email(event, &ctx) {
                out.push(Dispatch {
                    role: RecipientRole::Client,
                    to: email.to_string(),
                    message: OutboundMessage::Email { subject, html },
                });
            }
        }

        // Every active admin, on every event
        for admin in admins {
            let Some(phone) = admin.phone.as_deref() else {
                continue;
            };
            if let Some(text) = render_sms(RecipientRole::Admin, event, &ctx) {
                out.push(Dispatch {
                    role: RecipientRole::Admin,
                    to: phone.to_string(),
                    message: OutboundMessage::Sms(text),
                });
            }
        }

        // Linked business partner
        if detail.service.business_partner_id.is_some() {
            if let Some(phone) = detail.partner_phone.as_deref() {
                if let Some(text) = render_sms(RecipientRole::Partner, event, &ctx) {
                    out.push(Dispatch {
                        role: RecipientRole::Partner,
                        to: phone.to_string(),
                        message: OutboundMessage::Sms(text),
                    });
                }
            }
        }

        // Brand-routed supplier contact
        if self.routing.routes_brand(&detail.appliance_manufacturer) {
            if let Some(phone) = self.routing.contact_phone.as_deref() {
                if let Some(text) = render_sms(RecipientRole::Supplier, event, &ctx) {
                    out.push(Dispatch {
                        role: RecipientRole::Supplier,
                        to: phone.to_string(),
                        message: OutboundMessage::Sms(text),
                    });
                }
            }
        }

        out
    }

    /// Resolve and send. Each triple goes out independently under a
    /// bounded timeout; one failure never blocks another.
    pub async fn dispatch(
        &self,
        detail: &ServiceDetail,
        admins: &[AdminContact],
        event: &NotificationEvent,
    ) -> DispatchSummary {
        let dispatches = self.resolve(detail, admins, event);
        let service_id = detail.service.id;

        let sends = dispatches.into_iter().map(|d| async move {
            let outcome = tokio::time::timeout(self.send_timeout, self.send_one(&d)).await;
            match outcome {
                Ok(Ok(())) => {
                    info!(
                        service_id = %service_id,
                        recipient_role = d.role.as_str(),
                        channel = d.channel_name(),
                        "Notification sent"
                    );
                    true
                }
                Ok(Err(reason)) => {
                    warn!(
                        service_id = %service_id,
                        recipient_role = d.role.as_str(),
                        channel = d.channel_name(),
                        recipient = %d.to,
                        reason = %reason,
                        "Notification dispatch failed"
                    );
                    false
                }
                Err(_) => {
                    warn!(
                        service_id = %service_id,
                        recipient_role = d.role.as_str(),
                        channel = d.channel_name(),
                        recipient = %d.to,
                        timeout_secs = self.send_timeout.as_secs(),
                        "Notification dispatch timed out"
                    );
                    false
                }
            }
        });

        let results = join_all(sends).await;
        let attempted = results.len();
        let failed = results.iter().filter(|ok| !**ok).count();

        if failed > 0 {
            warn!(service_id = %service_id, attempted, failed, "Some notifications failed");
        }

        DispatchSummary { attempted, failed }
    }

    async fn send_one(&self, dispatch: &Dispatch) -> Result<(), String> {
        match &dispatch.message {
            OutboundMessage::Sms(text) => self
                .sms
                .send(&dispatch.to, text)
                .await
                .map(|receipt| {
                    tracing::debug!(
                        provider_message_id = ?receipt.provider_message_id,
                        "SMS accepted by gateway"
                    );
                })
                .map_err(|e| e.to_string()),
            OutboundMessage::Email { subject, html } => self
                .email
                .send(&dispatch.to, subject, html)
                .await
                .map_err(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parts::PartUrgency;
    use crate::domain::services::ServiceStatus;
    use crate::workflow::testkit::{routed_brands, sample_admins, sample_detail, FakeEmail, FakeSms};

    fn dispatcher(sms: Arc<FakeSms>, email: Arc<FakeEmail>) -> NotificationDispatcher {
        NotificationDispatcher::new(sms, email, routed_brands(), Duration::from_secs(1))
    }

    fn status_event() -> NotificationEvent {
        NotificationEvent::StatusChanged {
            from: ServiceStatus::InProgress,
            to: ServiceStatus::WaitingParts,
        }
    }

    #[tokio::test]
    async fn resolves_client_admins_and_partner() {
        let sms = Arc::new(FakeSms::default());
        let email = Arc::new(FakeEmail::default());
        let d = dispatcher(sms.clone(), email.clone());

        let detail = sample_detail();
        let admins = sample_admins(2);
        let dispatches = d.resolve(&detail, &admins, &status_event());

        // client SMS + client email + 2 admins + partner (manufacturer not routed)
        assert_eq!(dispatches.len(), 5);
        assert!(dispatches
            .iter()
            .all(|d| d.role != RecipientRole::Supplier));

        let summary = d.dispatch(&detail, &admins, &status_event()).await;
        assert_eq!(summary, DispatchSummary { attempted: 5, failed: 0 });
        assert_eq!(sms.sent().len(), 4);
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn routed_brand_adds_the_supplier_contact_on_parts_orders() {
        let sms = Arc::new(FakeSms::default());
        let email = Arc::new(FakeEmail::default());
        let d = dispatcher(sms.clone(), email);

        let mut detail = sample_detail();
        detail.appliance_manufacturer = "Arctic".to_string();
        let event = NotificationEvent::PartsOrdered {
            part_name: "drain pump".to_string(),
            urgency: PartUrgency::High,
        };

        let dispatches = d.resolve(&detail, &sample_admins(1), &event);
        let supplier: Vec<_> = dispatches
            .iter()
            .filter(|d| d.role == RecipientRole::Supplier)
            .collect();
        assert_eq!(supplier.len(), 1);
        assert_eq!(supplier[0].to, routed_brands().contact_phone.unwrap());

        // A brand outside the table never reaches the supplier
        detail.appliance_manufacturer = "Beko".to_string();
        let dispatches = d.resolve(&detail, &sample_admins(1), &event);
        assert!(dispatches
            .iter()
            .all(|d| d.role != RecipientRole::Supplier));
    }

    #[tokio::test]
    async fn client_without_phone_is_skipped_not_fatal() {
        let sms = Arc::new(FakeSms::default());
        let email = Arc::new(FakeEmail::default());
        let d = dispatcher(sms.clone(), email);

        let mut detail = sample_detail();
        detail.client_phone = None;
        detail.client_email = None;

        let dispatches = d.resolve(&detail, &sample_admins(1), &status_event());
        assert!(dispatches
            .iter()
            .all(|d| d.role != RecipientRole::Client));
    }

    #[tokio::test]
    async fn channel_failures_are_swallowed_and_counted() {
        let sms = Arc::new(FakeSms::failing());
        let email = Arc::new(FakeEmail::failing());
        let d = dispatcher(sms, email);

        let detail = sample_detail();
        let summary = d.dispatch(&detail, &sample_admins(2), &status_event()).await;

        assert_eq!(summary.attempted, 5);
        assert_eq!(summary.failed, 5);
    }
}

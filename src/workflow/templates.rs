//! Per-transition notification templates.
//!
//! One lookup keyed by (recipient role, event) instead of branch chains.
//! SMS bodies are clipped to a single 160-character segment; the email
//! channel gets a subject/body pair for the client only.

use crate::domain::parts::PartUrgency;
use crate::domain::services::{ServiceDetail, ServiceStatus};

/// Single SMS segment
pub const SMS_MAX_LEN: usize = 160;

/// Workflow event a notification describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    StatusChanged {
        from: ServiceStatus,
        to: ServiceStatus,
    },
    PartsOrdered {
        part_name: String,
        urgency: PartUrgency,
    },
    PartsArrived {
        part_name: String,
        urgency: PartUrgency,
    },
}

/// Audience a resolved message targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientRole {
    Client,
    Admin,
    Partner,
    Supplier,
}

impl RecipientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Admin => "admin",
            Self::Partner => "partner",
            Self::Supplier => "supplier",
        }
    }
}

/// Interpolation fields shared by all templates for one event.
pub struct MessageContext<'a> {
    pub service_ref: String,
    pub client_name: &'a str,
    pub device: String,
    pub manufacturer: &'a str,
    pub technician_name: &'a str,
}

impl<'a> MessageContext<'a> {
    pub fn from_detail(detail: &'a ServiceDetail) -> Self {
        let id = detail.service.id.simple().to_string();
        Self {
            // Short ticket reference, enough to look the service up
            service_ref: id[..8].to_string(),
            client_name: &detail.client_name,
            device: format!(
                "{} {}",
                detail.appliance_manufacturer, detail.appliance_category
            ),
            manufacturer: &detail.appliance_manufacturer,
            technician_name: detail.technician_name.as_deref().unwrap_or("unassigned"),
        }
    }
}

fn urgency_prefix(urgency: PartUrgency) -> &'static str {
    match urgency {
        PartUrgency::Urgent => "URGENT: ",
        PartUrgency::High => "High priority: ",
        PartUrgency::Normal => "",
    }
}

/// Clip to one SMS segment on a char boundary.
fn clip_sms(text: String) -> String {
    if text.chars().count() <= SMS_MAX_LEN {
        return text;
    }
    text.chars().take(SMS_MAX_LEN - 3).collect::<String>() + "..."
}

/// SMS body for a (role, event) pair. `None` means this audience gets
/// no SMS for this event.
pub fn render_sms(
    role: RecipientRole,
    event: &NotificationEvent,
    ctx: &MessageContext<'_>,
) -> Option<String> {
    use NotificationEvent::*;
    use RecipientRole::*;

    let text = match (role, event) {
        (Client, StatusChanged { to, .. }) => format!(
            "Hi {}, your {} service #{} is now {}.",
            ctx.client_name,
            ctx.device,
            ctx.service_ref,
            to.label()
        ),
        (Admin, StatusChanged { from, to }) => format!(
            "[#{}] {} / {}: {} -> {} (tech: {})",
            ctx.service_ref,
            ctx.client_name,
            ctx.device,
            from.as_str(),
            to.as_str(),
            ctx.technician_name
        ),
        (Partner, StatusChanged { to, .. }) => format!(
            "Service #{} for {} ({}) is now {}.",
            ctx.service_ref,
            ctx.client_name,
            ctx.device,
            to.label()
        ),
        (Supplier, StatusChanged { to, .. }) => format!(
            "{} service #{} is now {}.",
            ctx.manufacturer,
            ctx.service_ref,
            to.label()
        ),
        (Client, PartsOrdered { part_name, .. }) => format!(
            "Hi {}, the part '{}' for your {} service #{} has been ordered.",
            ctx.client_name, part_name, ctx.device, ctx.service_ref
        ),
        (Client, PartsArrived { part_name, .. }) => format!(
            "Hi {}, the part '{}' for your {} service #{} has arrived. We will contact you to schedule the repair.",
            ctx.client_name, part_name, ctx.device, ctx.service_ref
        ),
        (Admin, PartsOrdered { part_name, urgency }) => format!(
            "{}[#{}] part ordered: {} ({})",
            urgency_prefix(*urgency),
            ctx.service_ref,
            part_name,
            ctx.device
        ),
        (Admin, PartsArrived { part_name, .. }) => format!(
            "[#{}] part arrived: {} ({})",
            ctx.service_ref, part_name, ctx.device
        ),
        (Supplier, PartsOrdered { part_name, urgency }) => format!(
            "{}Part needed for {} #{}: {}. Please confirm availability.",
            urgency_prefix(*urgency),
            ctx.manufacturer,
            ctx.service_ref,
            part_name
        ),
        (Supplier, PartsArrived { part_name, urgency }) => format!(
            "{}Part received for {} #{}: {}.",
            urgency_prefix(*urgency),
            ctx.manufacturer,
            ctx.service_ref,
            part_name
        ),
        // Partners only follow the ticket lifecycle, not parts logistics
        (Partner, PartsOrdered { .. }) | (Partner, PartsArrived { .. }) => return None,
    };

    Some(clip_sms(text))
}

/// Email subject/body for the client, mirroring the SMS content.
pub fn render_client_email(
    event: &NotificationEvent,
    ctx: &MessageContext<'_>,
) -> Option<(String, String)> {
    let body = render_sms(RecipientRole::Client, event, ctx)?;
    let subject = match event {
        NotificationEvent::StatusChanged { to, .. } => {
            format!("Service #{} update: {}", ctx.service_ref, to.label())
        }
        NotificationEvent::PartsOrdered { .. } => {
            format!("Service #{}: spare part ordered", ctx.service_ref)
        }
        NotificationEvent::PartsArrived { .. } => {
            format!("Service #{}: spare part arrived", ctx.service_ref)
        }
    };
    Some((subject, format!("<p>{body}</p>")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testkit::sample_detail;

    #[test]
    fn every_pair_stays_within_one_sms_segment() {
        let mut detail = sample_detail();
        detail.client_name = "A very long client name that keeps going and going".to_string();
        detail.appliance_manufacturer = "Extraordinarily Long Brand Name GmbH & Co KG".to_string();
        let ctx = MessageContext::from_detail(&detail);

        let events = [
            NotificationEvent::StatusChanged {
                from: ServiceStatus::InProgress,
                to: ServiceStatus::WaitingParts,
            },
            NotificationEvent::PartsOrdered {
                part_name: "drain pump assembly with extended hose kit".to_string(),
                urgency: PartUrgency::Urgent,
            },
            NotificationEvent::PartsArrived {
                part_name: "drain pump assembly with extended hose kit".to_string(),
                urgency: PartUrgency::High,
            },
        ];

        for event in &events {
            for role in [
                RecipientRole::Client,
                RecipientRole::Admin,
                RecipientRole::Partner,
                RecipientRole::Supplier,
            ] {
                if let Some(text) = render_sms(role, event, &ctx) {
                    assert!(
                        text.chars().count() <= SMS_MAX_LEN,
                        "({role:?}, {event:?}) produced {} chars",
                        text.chars().count()
                    );
                }
            }
        }
    }

    #[test]
    fn urgent_part_order_is_prefixed_for_the_supplier() {
        let detail = sample_detail();
        let ctx = MessageContext::from_detail(&detail);
        let event = NotificationEvent::PartsOrdered {
            part_name: "compressor".to_string(),
            urgency: PartUrgency::Urgent,
        };

        let text = render_sms(RecipientRole::Supplier, &event, &ctx).unwrap();
        assert!(text.starts_with("URGENT: "));
    }

    #[test]
    fn partners_get_no_parts_messages() {
        let detail = sample_detail();
        let ctx = MessageContext::from_detail(&detail);
        let event = NotificationEvent::PartsOrdered {
            part_name: "compressor".to_string(),
            urgency: PartUrgency::Normal,
        };

        assert_eq!(render_sms(RecipientRole::Partner, &event, &ctx), None);
    }

    #[test]
    fn client_email_mirrors_the_sms_body() {
        let detail = sample_detail();
        let ctx = MessageContext::from_detail(&detail);
        let event = NotificationEvent::StatusChanged {
            from: ServiceStatus::InProgress,
            to: ServiceStatus::Completed,
        };

        let (subject, body) = render_client_email(&event, &ctx).unwrap();
        assert!(subject.contains("completed"));
        assert!(body.contains(&ctx.service_ref));
    }
}

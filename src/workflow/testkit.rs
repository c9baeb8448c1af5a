//! Shared fakes for workflow tests: an in-memory entity store and
//! scripted SMS/email channels.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::SupplierRouting;
use crate::domain::parts::{PartOrderStatus, PartUrgency, SparePartOrder};
use crate::domain::services::{Service, ServiceDetail, ServiceStatus, WarrantyStatus};
use crate::domain::users::AdminContact;
use crate::services::{ChannelError, EmailChannel, SmsChannel, SmsReceipt};

use super::store::{EntityStore, StatusWrite, StoreError};

pub const TECH_ID: Uuid = Uuid::from_u128(0x7ec);
pub const SERVICE_ID: Uuid = Uuid::from_u128(42);
pub const PART_ID: Uuid = Uuid::from_u128(0x9a27);

pub fn sample_detail() -> ServiceDetail {
    let now = Utc::now();
    ServiceDetail {
        service: Service {
            id: SERVICE_ID,
            client_id: Uuid::from_u128(1),
            appliance_id: Uuid::from_u128(2),
            technician_id: Some(TECH_ID),
            business_partner_id: Some(Uuid::from_u128(3)),
            status: ServiceStatus::InProgress,
            warranty_status: WarrantyStatus::OutOfWarranty,
            problem_description: "Washer does not drain".to_string(),
            customer_refusal_reason: None,
            client_unavailable_reason: None,
            needs_rescheduling: false,
            rescheduling_notes: None,
            scheduled_date: None,
            completed_date: None,
            version: 1,
            created_at: now,
            updated_at: now,
        },
        client_name: "Maria Ionescu".to_string(),
        client_phone: Some("+15550000001".to_string()),
        client_email: Some("maria@example.com".to_string()),
        appliance_category: "washing machine".to_string(),
        appliance_manufacturer: "Beko".to_string(),
        appliance_model: Some("WTV 8744".to_string()),
        technician_name: Some("Andrei Popa".to_string()),
        partner_company: Some("HomeCare Lettings".to_string()),
        partner_phone: Some("+15550000077".to_string()),
    }
}

pub fn sample_part(status: PartOrderStatus, urgency: PartUrgency) -> SparePartOrder {
    let now = Utc::now();
    SparePartOrder {
        id: PART_ID,
        service_id: SERVICE_ID,
        technician_id: Some(TECH_ID),
        part_name: "drain pump".to_string(),
        quantity: 1,
        unit_price: None,
        urgency,
        status,
        catalog_ref: None,
        ordered_at: None,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_admins(count: usize) -> Vec<AdminContact> {
    (0..count)
        .map(|i| AdminContact {
            id: Uuid::from_u128(0x100 + i as u128),
            full_name: format!("Admin {i}"),
            phone: Some(format!("+1555000200{i}")),
        })
        .collect()
}

pub fn routed_brands() -> SupplierRouting {
    SupplierRouting {
        brands: vec!["Arctic".to_string(), "Polarline".to_string()],
        contact_name: "Parts supplier".to_string(),
        contact_phone: Some("+15559990000".to_string()),
    }
}

/// In-memory entity store with the same version semantics as Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    services: Mutex<HashMap<Uuid, ServiceDetail>>,
    parts: Mutex<HashMap<Uuid, SparePartOrder>>,
    admins: Vec<AdminContact>,
}

impl InMemoryStore {
    pub fn with_service(detail: ServiceDetail, admins: Vec<AdminContact>) -> Self {
        let mut services = HashMap::new();
        services.insert(detail.service.id, detail);
        Self {
            services: Mutex::new(services),
            parts: Mutex::new(HashMap::new()),
            admins,
        }
    }

    pub fn insert_part(&self, part: SparePartOrder) {
        self.parts.lock().insert(part.id, part);
    }

    pub fn service_snapshot(&self, id: Uuid) -> Option<Service> {
        self.services.lock().get(&id).map(|d| d.service.clone())
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get_service_detail(&self, id: Uuid) -> Result<ServiceDetail, StoreError> {
        self.services
            .lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn apply_status_write(
        &self,
        id: Uuid,
        write: &StatusWrite,
    ) -> Result<Service, StoreError> {
        let mut services = self.services.lock();
        let detail = services.get_mut(&id).ok_or(StoreError::NotFound)?;

        if detail.service.version != write.expected_version {
            return Err(StoreError::VersionConflict);
        }

        let service = &mut detail.service;
        service.status = write.status;
        service.customer_refusal_reason = write.customer_refusal_reason.clone();
        service.client_unavailable_reason = write.client_unavailable_reason.clone();
        service.needs_rescheduling = write.needs_rescheduling;
        service.rescheduling_notes = write.rescheduling_notes.clone();
        if let Some(done) = write.completed_date {
            service.completed_date = Some(done);
        }
        service.version += 1;
        service.updated_at = Utc::now();

        Ok(service.clone())
    }

    async fn get_admin_contacts(&self) -> Result<Vec<AdminContact>, StoreError> {
        Ok(self.admins.clone())
    }

    async fn get_part_order(&self, id: Uuid) -> Result<SparePartOrder, StoreError> {
        self.parts
            .lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn apply_part_status(
        &self,
        id: Uuid,
        status: PartOrderStatus,
    ) -> Result<SparePartOrder, StoreError> {
        let mut parts = self.parts.lock();
        let part = parts.get_mut(&id).ok_or(StoreError::NotFound)?;

        part.status = status;
        match status {
            PartOrderStatus::Ordered => part.ordered_at = Some(Utc::now()),
            PartOrderStatus::Delivered => part.delivered_at = Some(Utc::now()),
            PartOrderStatus::Pending => {}
        }
        part.updated_at = Utc::now();

        Ok(part.clone())
    }
}

/// Scripted SMS channel recording every accepted message.
#[derive(Default)]
pub struct FakeSms {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeSms {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl SmsChannel for FakeSms {
    async fn send(&self, to_phone: &str, message: &str) -> Result<SmsReceipt, ChannelError> {
        if self.fail {
            return Err(ChannelError::Unreachable("scripted failure".to_string()));
        }
        self.sent
            .lock()
            .push((to_phone.to_string(), message.to_string()));
        Ok(SmsReceipt {
            provider_message_id: Some("fake-msg-1".to_string()),
        })
    }
}

/// Scripted email channel recording every accepted message.
#[derive(Default)]
pub struct FakeEmail {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeEmail {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailChannel for FakeEmail {
    async fn send(
        &self,
        to_address: &str,
        subject: &str,
        _html_body: &str,
    ) -> Result<(), ChannelError> {
        if self.fail {
            return Err(ChannelError::Unreachable("scripted failure".to_string()));
        }
        self.sent
            .lock()
            .push((to_address.to_string(), subject.to_string()));
        Ok(())
    }
}

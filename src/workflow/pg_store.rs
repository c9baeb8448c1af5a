//! PostgreSQL implementation of the entity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::parts::{PartOrderStatus, SparePartOrder};
use crate::domain::services::{Service, ServiceDetail, ServiceStatus, WarrantyStatus};
use crate::domain::users::AdminContact;

use super::store::{EntityStore, StatusWrite, StoreError};

#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row for a service joined with its parties
#[derive(Debug, sqlx::FromRow)]
struct ServiceDetailRow {
    id: Uuid,
    client_id: Uuid,
    appliance_id: Uuid,
    technician_id: Option<Uuid>,
    business_partner_id: Option<Uuid>,
    status: String,
    warranty_status: String,
    problem_description: String,
    customer_refusal_reason: Option<String>,
    client_unavailable_reason: Option<String>,
    needs_rescheduling: bool,
    rescheduling_notes: Option<String>,
    scheduled_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    client_name: String,
    client_phone: Option<String>,
    client_email: Option<String>,
    appliance_category: String,
    appliance_manufacturer: String,
    appliance_model: Option<String>,
    technician_name: Option<String>,
    partner_company: Option<String>,
    partner_phone: Option<String>,
}

/// Database row for a bare service
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    client_id: Uuid,
    appliance_id: Uuid,
    technician_id: Option<Uuid>,
    business_partner_id: Option<Uuid>,
    status: String,
    warranty_status: String,
    problem_description: String,
    customer_refusal_reason: Option<String>,
    client_unavailable_reason: Option<String>,
    needs_rescheduling: bool,
    rescheduling_notes: Option<String>,
    scheduled_date: Option<DateTime<Utc>>,
    completed_date: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Database row for a spare part order
#[derive(Debug, sqlx::FromRow)]
struct PartOrderRow {
    id: Uuid,
    service_id: Uuid,
    technician_id: Option<Uuid>,
    part_name: String,
    quantity: i32,
    unit_price: Option<Decimal>,
    urgency: String,
    status: String,
    catalog_ref: Option<String>,
    ordered_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode_column<T: std::str::FromStr<Err = String>>(
    column: &str,
    raw: &str,
) -> Result<T, sqlx::Error> {
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: e.into(),
    })
}

impl ServiceRow {
    fn into_service(self) -> Result<Service, sqlx::Error> {
        Ok(Service {
            id: self.id,
            client_id: self.client_id,
            appliance_id: self.appliance_id,
            technician_id: self.technician_id,
            business_partner_id: self.business_partner_id,
            status: decode_column::<ServiceStatus>("status", &self.status)?,
            warranty_status: decode_column::<WarrantyStatus>(
                "warranty_status",
                &self.warranty_status,
            )?,
            problem_description: self.problem_description,
            customer_refusal_reason: self.customer_refusal_reason,
            client_unavailable_reason: self.client_unavailable_reason,
            needs_rescheduling: self.needs_rescheduling,
            rescheduling_notes: self.rescheduling_notes,
            scheduled_date: self.scheduled_date,
            completed_date: self.completed_date,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ServiceDetailRow {
    fn into_detail(self) -> Result<ServiceDetail, sqlx::Error> {
        let service = Service {
            id: self.id,
            client_id: self.client_id,
            appliance_id: self.appliance_id,
            technician_id: self.technician_id,
            business_partner_id: self.business_partner_id,
            status: decode_column::<ServiceStatus>("status", &self.status)?,
            warranty_status: decode_column::<WarrantyStatus>(
                "warranty_status",
                &self.warranty_status,
            )?,
            problem_description: self.problem_description,
            customer_refusal_reason: self.customer_refusal_reason,
            client_unavailable_reason: self.client_unavailable_reason,
            needs_rescheduling: self.needs_rescheduling,
            rescheduling_notes: self.rescheduling_notes,
            scheduled_date: self.scheduled_date,
            completed_date: self.completed_date,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        Ok(ServiceDetail {
            service,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_email: self.client_email,
            appliance_category: self.appliance_category,
            appliance_manufacturer: self.appliance_manufacturer,
            appliance_model: self.appliance_model,
            technician_name: self.technician_name,
            partner_company: self.partner_company,
            partner_phone: self.partner_phone,
        })
    }
}

impl PartOrderRow {
    fn into_order(self) -> Result<SparePartOrder, sqlx::Error> {
        Ok(SparePartOrder {
            id: self.id,
            service_id: self.service_id,
            technician_id: self.technician_id,
            part_name: self.part_name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            urgency: decode_column("urgency", &self.urgency)?,
            status: decode_column("status", &self.status)?,
            catalog_ref: self.catalog_ref,
            ordered_at: self.ordered_at,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SERVICE_DETAIL_SELECT: &str = r#"
    SELECT s.id, s.client_id, s.appliance_id, s.technician_id, s.business_partner_id,
           s.status, s.warranty_status, s.problem_description,
           s.customer_refusal_reason, s.client_unavailable_reason,
           s.needs_rescheduling, s.rescheduling_notes,
           s.scheduled_date, s.completed_date, s.version, s.created_at, s.updated_at,
           c.full_name AS client_name, c.phone AS client_phone, c.email AS client_email,
           a.category AS appliance_category, a.manufacturer AS appliance_manufacturer,
           a.model AS appliance_model,
           t.full_name AS technician_name,
           bp.company_name AS partner_company, bp.phone AS partner_phone
    FROM services s
    JOIN clients c ON s.client_id = c.id
    JOIN appliances a ON s.appliance_id = a.id
    LEFT JOIN technicians t ON s.technician_id = t.id
    LEFT JOIN business_partners bp ON s.business_partner_id = bp.id
    WHERE s.id = $1 AND s.deleted_at IS NULL
"#;

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn get_service_detail(&self, id: Uuid) -> Result<ServiceDetail, StoreError> {
        let row = sqlx::query_as::<_, ServiceDetailRow>(SERVICE_DETAIL_SELECT)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(row.into_detail()?)
    }

    async fn apply_status_write(
        &self,
        id: Uuid,
        write: &StatusWrite,
    ) -> Result<Service, StoreError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            UPDATE services SET
                status = $3,
                customer_refusal_reason = $4,
                client_unavailable_reason = $5,
                needs_rescheduling = $6,
                rescheduling_notes = $7,
                completed_date = COALESCE($8, completed_date),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING id, client_id, appliance_id, technician_id, business_partner_id,
                      status, warranty_status, problem_description,
                      customer_refusal_reason, client_unavailable_reason,
                      needs_rescheduling, rescheduling_notes,
                      scheduled_date, completed_date, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(write.expected_version)
        .bind(write.status.as_str())
        .bind(&write.customer_refusal_reason)
        .bind(&write.client_unavailable_reason)
        .bind(write.needs_rescheduling)
        .bind(&write.rescheduling_notes)
        .bind(write.completed_date)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into_service()?),
            None => {
                // Missing row vs lost version race
                let exists: Option<i64> = sqlx::query_scalar(
                    "SELECT 1 FROM services WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

                Err(if exists.is_some() {
                    StoreError::VersionConflict
                } else {
                    StoreError::NotFound
                })
            }
        }
    }

    async fn get_admin_contacts(&self) -> Result<Vec<AdminContact>, StoreError> {
        let admins = sqlx::query_as::<_, AdminContact>(
            r#"
            SELECT id, full_name, phone
            FROM users
            WHERE role = 'admin' AND is_active
            ORDER BY full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(admins)
    }

    async fn get_part_order(&self, id: Uuid) -> Result<SparePartOrder, StoreError> {
        let row = sqlx::query_as::<_, PartOrderRow>(
            r#"
            SELECT id, service_id, technician_id, part_name, quantity, unit_price,
                   urgency, status, catalog_ref, ordered_at, delivered_at,
                   created_at, updated_at
            FROM spare_part_orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(row.into_order()?)
    }

    async fn apply_part_status(
        &self,
        id: Uuid,
        status: PartOrderStatus,
    ) -> Result<SparePartOrder, StoreError> {
        let row = sqlx::query_as::<_, PartOrderRow>(
            r#"
            UPDATE spare_part_orders SET
                status = $2,
                ordered_at = CASE WHEN $2 = 'ordered' THEN NOW() ELSE ordered_at END,
                delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, service_id, technician_id, part_name, quantity, unit_price,
                      urgency, status, catalog_ref, ordered_at, delivered_at,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(row.into_order()?)
    }
}

//! Workflow engine: the only mutator of service and part order status.
//!
//! A `change_status` call validates against the latest persisted state,
//! persists the transition as one version-checked write, then hands the
//! applied event to the dispatcher. Notification outcomes never affect
//! the returned result. Calls on the same id are serialized through a
//! per-id async mutex so no transition is validated against a stale
//! status.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Actor, ActorRole};
use crate::domain::parts::{PartOrderStatus, SparePartOrder};
use crate::domain::services::{ChangeStatusRequest, Service, ServiceStatus};
use crate::error::{ApiError, ApiResult};

use super::dispatch::NotificationDispatcher;
use super::store::{EntityStore, StatusWrite};
use super::templates::NotificationEvent;
use super::transitions::{validate_transition, TransitionOutcome};

/// Per-id async locks. Entries whose lock is no longer held get pruned
/// once the registry grows past a threshold.
#[derive(Clone, Default)]
struct LockRegistry {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

const LOCK_PRUNE_THRESHOLD: usize = 1024;

impl LockRegistry {
    async fn acquire(&self, id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock();
            if map.len() > LOCK_PRUNE_THRESHOLD {
                map.retain(|_, l| Arc::strong_count(l) > 1);
            }
            map.entry(id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub struct WorkflowEngine {
    store: Arc<dyn EntityStore>,
    dispatcher: NotificationDispatcher,
    locks: LockRegistry,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn EntityStore>, dispatcher: NotificationDispatcher) -> Self {
        Self {
            store,
            dispatcher,
            locks: LockRegistry::default(),
        }
    }

    /// Apply a status change to a service.
    ///
    /// The status write is authoritative; notifications are best-effort
    /// and their failures are only logged.
    pub async fn change_status(
        &self,
        service_id: Uuid,
        actor: &Actor,
        request: &ChangeStatusRequest,
    ) -> ApiResult<Service> {
        let _guard = self.locks.acquire(service_id).await;

        let mut detail = self.store.get_service_detail(service_id).await?;
        let current = detail.service.status;

        let change = match validate_transition(
            current,
            actor,
            detail.service.technician_id,
            request,
        )? {
            TransitionOutcome::NoOp => {
                info!(
                    service_id = %service_id,
                    status = %current,
                    "Status unchanged, skipping transition"
                );
                return Ok(detail.service);
            }
            TransitionOutcome::Apply(change) => change,
        };

        let write = StatusWrite {
            status: change.status,
            customer_refusal_reason: change.customer_refusal_reason,
            client_unavailable_reason: change.client_unavailable_reason,
            needs_rescheduling: change.needs_rescheduling,
            rescheduling_notes: change.rescheduling_notes,
            completed_date: (change.status == ServiceStatus::Completed).then(Utc::now),
            expected_version: detail.service.version,
        };

        let updated = self.store.apply_status_write(service_id, &write).await?;

        info!(
            service_id = %service_id,
            from = %current,
            to = %updated.status,
            actor = %actor.name,
            role = %actor.role,
            "Service status changed"
        );

        detail.service = updated.clone();
        let event = NotificationEvent::StatusChanged {
            from: current,
            to: updated.status,
        };
        self.notify(&detail, &event).await;

        Ok(updated)
    }

    /// Advance a spare part order: pending -> ordered -> delivered.
    pub async fn change_part_status(
        &self,
        part_id: Uuid,
        actor: &Actor,
        requested: PartOrderStatus,
    ) -> ApiResult<SparePartOrder> {
        let _guard = self.locks.acquire(part_id).await;

        let part = match self.store.get_part_order(part_id).await {
            Ok(part) => part,
            Err(super::store::StoreError::NotFound) => {
                return Err(ApiError::not_found("Part order not found"))
            }
            Err(e) => return Err(e.into()),
        };
        let detail = self.store.get_service_detail(part.service_id).await?;

        match actor.role {
            ActorRole::Admin => {}
            ActorRole::Technician => {
                if detail.service.technician_id != Some(actor.id) {
                    return Err(ApiError::role(
                        "technicians can only update parts for services assigned to them",
                    ));
                }
            }
            ActorRole::BusinessPartner => {
                return Err(ApiError::role("business partners cannot update part orders"))
            }
        }

        if requested == part.status {
            return Ok(part);
        }
        if part.status.next() != Some(requested) {
            return Err(ApiError::validation(format!(
                "part orders move pending -> ordered -> delivered, cannot go from '{}' to '{}'",
                part.status, requested
            )));
        }

        let updated = self.store.apply_part_status(part_id, requested).await?;

        info!(
            part_id = %part_id,
            service_id = %part.service_id,
            status = %updated.status,
            actor = %actor.name,
            "Part order status changed"
        );

        let event = match updated.status {
            PartOrderStatus::Ordered => NotificationEvent::PartsOrdered {
                part_name: updated.part_name.clone(),
                urgency: updated.urgency,
            },
            PartOrderStatus::Delivered => NotificationEvent::PartsArrived {
                part_name: updated.part_name.clone(),
                urgency: updated.urgency,
            },
            PartOrderStatus::Pending => return Ok(updated),
        };
        self.notify(&detail, &event).await;

        Ok(updated)
    }

    async fn notify(&self, detail: &crate::domain::services::ServiceDetail, event: &NotificationEvent) {
        let admins = match self.store.get_admin_contacts().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(error = %e, "Could not load admin contacts, notifying without them");
                Vec::new()
            }
        };
        self.dispatcher.dispatch(detail, &admins, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupplierRouting;
    use crate::domain::parts::PartUrgency;
    use crate::domain::services::ServiceDetail;
    use crate::workflow::testkit::{
        routed_brands, sample_admins, sample_detail, sample_part, FakeEmail, FakeSms,
        InMemoryStore, PART_ID, SERVICE_ID, TECH_ID,
    };
    use std::time::Duration;

    struct Harness {
        engine: Arc<WorkflowEngine>,
        store: Arc<InMemoryStore>,
        sms: Arc<FakeSms>,
        email: Arc<FakeEmail>,
    }

    fn harness(detail: ServiceDetail, routing: SupplierRouting, failing_channels: bool) -> Harness {
        let store = Arc::new(InMemoryStore::with_service(detail, sample_admins(2)));
        let (sms, email) = if failing_channels {
            (Arc::new(FakeSms::failing()), Arc::new(FakeEmail::failing()))
        } else {
            (Arc::new(FakeSms::default()), Arc::new(FakeEmail::default()))
        };
        let dispatcher = NotificationDispatcher::new(
            sms.clone(),
            email.clone(),
            routing,
            Duration::from_secs(1),
        );
        Harness {
            engine: Arc::new(WorkflowEngine::new(store.clone(), dispatcher)),
            store,
            sms,
            email,
        }
    }

    fn admin() -> Actor {
        Actor {
            id: Uuid::from_u128(0xAD),
            role: ActorRole::Admin,
            name: "Back office".to_string(),
        }
    }

    fn assigned_technician() -> Actor {
        Actor {
            id: TECH_ID,
            role: ActorRole::Technician,
            name: "Andrei Popa".to_string(),
        }
    }

    fn request(status: ServiceStatus) -> ChangeStatusRequest {
        ChangeStatusRequest {
            status,
            customer_refusal_reason: None,
            client_unavailable_reason: None,
            needs_rescheduling: None,
            rescheduling_notes: None,
        }
    }

    #[tokio::test]
    async fn technician_subset_is_enforced_where_admin_is_not() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);

        // in_progress -> scheduled is not a technician transition
        let err = h
            .engine
            .change_status(SERVICE_ID, &assigned_technician(), &request(ServiceStatus::Scheduled))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Role(_)));

        let updated = h
            .engine
            .change_status(SERVICE_ID, &admin(), &request(ServiceStatus::Scheduled))
            .await
            .unwrap();
        assert_eq!(updated.status, ServiceStatus::Scheduled);
    }

    #[tokio::test]
    async fn refusal_reason_is_required_then_persisted_verbatim() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);

        let err = h
            .engine
            .change_status(
                SERVICE_ID,
                &admin(),
                &request(ServiceStatus::CustomerRefusedRepair),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        // rejected request leaves the service untouched
        assert_eq!(
            h.store.service_snapshot(SERVICE_ID).unwrap().status,
            ServiceStatus::InProgress
        );

        let mut req = request(ServiceStatus::CustomerRefusedRepair);
        req.customer_refusal_reason = Some("Cost too high".to_string());
        let updated = h.engine.change_status(SERVICE_ID, &admin(), &req).await.unwrap();

        assert_eq!(updated.status, ServiceStatus::CustomerRefusedRepair);
        assert_eq!(updated.customer_refusal_reason.as_deref(), Some("Cost too high"));
    }

    #[tokio::test]
    async fn same_status_call_is_idempotent_and_silent() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);

        let first = h
            .engine
            .change_status(SERVICE_ID, &admin(), &request(ServiceStatus::InProgress))
            .await
            .unwrap();
        let second = h
            .engine
            .change_status(SERVICE_ID, &admin(), &request(ServiceStatus::InProgress))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.version, 1);
        assert!(h.sms.sent().is_empty());
        assert!(h.email.sent().is_empty());
    }

    #[tokio::test]
    async fn terminal_states_reject_transitions_without_mutation() {
        let mut detail = sample_detail();
        detail.service.status = ServiceStatus::Completed;
        let h = harness(detail, SupplierRouting::default(), false);

        for target in [ServiceStatus::InProgress, ServiceStatus::Cancelled] {
            let err = h
                .engine
                .change_status(SERVICE_ID, &admin(), &request(target))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::TerminalState(_)), "-> {target}");
        }

        let snapshot = h.store.service_snapshot(SERVICE_ID).unwrap();
        assert_eq!(snapshot.status, ServiceStatus::Completed);
        assert_eq!(snapshot.version, 1);
        assert!(h.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn channel_failures_never_fail_the_status_change() {
        let h = harness(sample_detail(), routed_brands(), true);

        let updated = h
            .engine
            .change_status(SERVICE_ID, &admin(), &request(ServiceStatus::Completed))
            .await
            .unwrap();

        assert_eq!(updated.status, ServiceStatus::Completed);
        assert!(updated.completed_date.is_some());
        assert_eq!(
            h.store.service_snapshot(SERVICE_ID).unwrap().status,
            ServiceStatus::Completed
        );
    }

    #[tokio::test]
    async fn status_change_notifies_client_admins_and_partner() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);

        let mut req = request(ServiceStatus::ClientNotHome);
        req.client_unavailable_reason = Some("nobody answered".to_string());
        req.needs_rescheduling = Some(true);
        req.rescheduling_notes = Some("call after 18:00".to_string());
        let updated = h.engine.change_status(SERVICE_ID, &admin(), &req).await.unwrap();

        assert!(updated.needs_rescheduling);
        assert_eq!(updated.client_unavailable_reason.as_deref(), Some("nobody answered"));

        // client + 2 admins + partner over SMS, client over email
        let sent = h.sms.sent();
        assert_eq!(sent.len(), 4);
        assert!(sent.iter().any(|(to, _)| to == "+15550000001"));
        assert!(sent.iter().any(|(to, _)| to == "+15550000077"));
        assert_eq!(h.email.sent().len(), 1);
    }

    #[tokio::test]
    async fn part_order_routes_supplier_for_routed_brands_only() {
        // Routed manufacturer: supplier phone must be among recipients
        let mut detail = sample_detail();
        detail.appliance_manufacturer = "Arctic".to_string();
        let h = harness(detail, routed_brands(), false);
        h.store
            .insert_part(sample_part(PartOrderStatus::Pending, PartUrgency::Urgent));

        let updated = h
            .engine
            .change_part_status(PART_ID, &assigned_technician(), PartOrderStatus::Ordered)
            .await
            .unwrap();
        assert_eq!(updated.status, PartOrderStatus::Ordered);
        assert!(updated.ordered_at.is_some());

        let supplier_phone = routed_brands().contact_phone.unwrap();
        let sent = h.sms.sent();
        assert!(sent.iter().any(|(to, _)| *to == supplier_phone));
        let supplier_msg = &sent.iter().find(|(to, _)| *to == supplier_phone).unwrap().1;
        assert!(supplier_msg.starts_with("URGENT: "));

        // Non-routed manufacturer: supplier never notified
        let h = harness(sample_detail(), routed_brands(), false);
        h.store
            .insert_part(sample_part(PartOrderStatus::Pending, PartUrgency::Normal));
        h.engine
            .change_part_status(PART_ID, &admin(), PartOrderStatus::Ordered)
            .await
            .unwrap();
        let supplier_phone = routed_brands().contact_phone.unwrap();
        assert!(h.sms.sent().iter().all(|(to, _)| *to != supplier_phone));
    }

    #[tokio::test]
    async fn part_orders_cannot_skip_steps() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);
        h.store
            .insert_part(sample_part(PartOrderStatus::Pending, PartUrgency::Normal));

        let err = h
            .engine
            .change_part_status(PART_ID, &admin(), PartOrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // Same-status call is a quiet no-op
        let part = h
            .engine
            .change_part_status(PART_ID, &admin(), PartOrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(part.status, PartOrderStatus::Pending);
        assert!(h.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);
        let err = h
            .engine
            .change_status(Uuid::from_u128(0xdead), &admin(), &request(ServiceStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_transitions_on_one_service_are_serialized() {
        let h = harness(sample_detail(), SupplierRouting::default(), false);

        let complete = {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .change_status(SERVICE_ID, &admin(), &request(ServiceStatus::Completed))
                    .await
            })
        };
        let cancel = {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .change_status(SERVICE_ID, &admin(), &request(ServiceStatus::Cancelled))
                    .await
            })
        };

        let results = [complete.await.unwrap(), cancel.await.unwrap()];
        let oks = results.iter().filter(|r| r.is_ok()).count();
        let terminal_rejections = results
            .iter()
            .filter(|r| matches!(r, Err(ApiError::TerminalState(_))))
            .count();

        // The loser re-validates against the winner's terminal status
        assert_eq!(oks, 1);
        assert_eq!(terminal_rejections, 1);

        let snapshot = h.store.service_snapshot(SERVICE_ID).unwrap();
        assert!(snapshot.status.is_terminal());
        assert_eq!(snapshot.version, 2);
    }
}

//! Status transition validator.
//!
//! Pure rules, no I/O: given the persisted status, the requested status,
//! the acting role and the reason payload, either produce the normalized
//! field set to persist or reject with a typed error. The engine is the
//! only caller.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Actor, ActorRole};
use crate::domain::services::{ChangeStatusRequest, ServiceStatus};
use crate::error::ApiError;

use ServiceStatus::*;

/// Transitions a technician may apply to a service assigned to them.
/// Everything outside this table is admin-only.
const TECHNICIAN_TRANSITIONS: &[(ServiceStatus, ServiceStatus)] = &[
    (Scheduled, InProgress),
    (Assigned, InProgress),
    (InProgress, Completed),
    (InProgress, WaitingParts),
    (InProgress, ClientNotHome),
    (InProgress, ClientNotAnswering),
    (InProgress, CustomerRefusedRepair),
    (InProgress, RepairFailed),
    (InProgress, DevicePickedUp),
    (WaitingParts, InProgress),
    (DevicePickedUp, InProgress),
    (ClientNotHome, InProgress),
    (ClientNotAnswering, InProgress),
];

/// Rejection reasons, mapped onto the API error taxonomy by the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Role(String),

    #[error("service is in terminal status '{0}'")]
    Terminal(ServiceStatus),
}

impl From<TransitionError> for ApiError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::Validation(msg) => ApiError::Validation(msg),
            TransitionError::Role(msg) => ApiError::Role(msg),
            TransitionError::Terminal(status) => ApiError::TerminalState(status.to_string()),
        }
    }
}

/// Normalized field set for a legal transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedChange {
    pub status: ServiceStatus,
    pub customer_refusal_reason: Option<String>,
    pub client_unavailable_reason: Option<String>,
    pub needs_rescheduling: bool,
    pub rescheduling_notes: Option<String>,
}

/// Validator verdict. `NoOp` means the requested status equals the
/// current one: succeed without persisting or notifying, so duplicate
/// client retries stay harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    NoOp,
    Apply(NormalizedChange),
}

pub fn validate_transition(
    current: ServiceStatus,
    actor: &Actor,
    assigned_technician: Option<Uuid>,
    request: &ChangeStatusRequest,
) -> Result<TransitionOutcome, TransitionError> {
    let requested = request.status;

    // Idempotent re-submit of the current status, checked before the
    // terminal rule so a duplicated final call still succeeds.
    if requested == current {
        return Ok(TransitionOutcome::NoOp);
    }

    if current.is_terminal() {
        return Err(TransitionError::Terminal(current));
    }

    check_role(current, requested, actor, assigned_technician)?;

    let mut change = NormalizedChange {
        status: requested,
        customer_refusal_reason: None,
        client_unavailable_reason: None,
        needs_rescheduling: false,
        rescheduling_notes: None,
    };

    if requested == CustomerRefusedRepair {
        let reason = non_empty(request.customer_refusal_reason.as_deref()).ok_or_else(|| {
            TransitionError::Validation(
                "customer_refusal_reason is required when the customer refuses the repair"
                    .to_string(),
            )
        })?;
        change.customer_refusal_reason = Some(reason);
    }

    if requested.requires_unavailability_reason() {
        let reason = non_empty(request.client_unavailable_reason.as_deref()).ok_or_else(|| {
            TransitionError::Validation(format!(
                "client_unavailable_reason is required for status '{requested}'"
            ))
        })?;
        change.client_unavailable_reason = Some(reason);

        if request.needs_rescheduling.unwrap_or(false) {
            change.needs_rescheduling = true;
            change.rescheduling_notes = non_empty(request.rescheduling_notes.as_deref());
        }
    }

    Ok(TransitionOutcome::Apply(change))
}

fn check_role(
    current: ServiceStatus,
    requested: ServiceStatus,
    actor: &Actor,
    assigned_technician: Option<Uuid>,
) -> Result<(), TransitionError> {
    match actor.role {
        ActorRole::Admin => Ok(()),
        ActorRole::BusinessPartner => Err(TransitionError::Role(
            "business partners cannot change service status".to_string(),
        )),
        ActorRole::Technician => {
            if assigned_technician != Some(actor.id) {
                return Err(TransitionError::Role(
                    "technicians can only update services assigned to them".to_string(),
                ));
            }
            if !TECHNICIAN_TRANSITIONS.contains(&(current, requested)) {
                return Err(TransitionError::Role(format!(
                    "technicians cannot move a service from '{current}' to '{requested}'"
                )));
            }
            Ok(())
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: ActorRole::Admin,
            name: "Admin".to_string(),
        }
    }

    fn technician(id: Uuid) -> Actor {
        Actor {
            id,
            role: ActorRole::Technician,
            name: "Tech".to_string(),
        }
    }

    fn partner() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role: ActorRole::BusinessPartner,
            name: "Partner".to_string(),
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

    #[test]
    fn same_status_is_a_noop_even_when_terminal() {
        let verdict =
            validate_transition(Completed, &admin(), None, &request(Completed)).unwrap();
        assert_eq!(verdict, TransitionOutcome::NoOp);
    }

    #[test]
    fn terminal_statuses_reject_every_outgoing_transition() {
        for terminal in [Completed, Cancelled] {
            for target in ServiceStatus::ALL {
                if target == terminal {
                    continue;
                }
                let err = validate_transition(terminal, &admin(), None, &request(target))
                    .unwrap_err();
                assert_eq!(err, TransitionError::Terminal(terminal), "{terminal} -> {target}");
            }
        }
    }

    #[test]
    fn admin_may_apply_any_non_terminal_transition() {
        let verdict = validate_transition(Pending, &admin(), None, &request(RepairFailed));
        assert!(matches!(verdict, Ok(TransitionOutcome::Apply(_))));
    }

    #[test]
    fn technician_outside_subset_is_rejected_where_admin_succeeds() {
        let tech_id = Uuid::new_v4();
        for from in ServiceStatus::ALL {
            for to in ServiceStatus::ALL {
                if from == to || from.is_terminal() {
                    continue;
                }
                let mut req = request(to);
                req.customer_refusal_reason = Some("too expensive".to_string());
                req.client_unavailable_reason = Some("nobody answered".to_string());

                let as_admin = validate_transition(from, &admin(), Some(tech_id), &req);
                assert!(as_admin.is_ok(), "admin {from} -> {to}");

                let as_tech =
                    validate_transition(from, &technician(tech_id), Some(tech_id), &req);
                if TECHNICIAN_TRANSITIONS.contains(&(from, to)) {
                    assert!(as_tech.is_ok(), "tech {from} -> {to}");
                } else {
                    assert!(
                        matches!(as_tech, Err(TransitionError::Role(_))),
                        "tech {from} -> {to} should be a role error"
                    );
                }
            }
        }
    }

    #[test]
    fn technician_cannot_move_someone_elses_service() {
        let err = validate_transition(
            InProgress,
            &technician(Uuid::new_v4()),
            Some(Uuid::new_v4()),
            &request(Completed),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::Role(_)));
    }

    #[test]
    fn business_partner_cannot_transition_at_all() {
        let err =
            validate_transition(InProgress, &partner(), None, &request(Completed)).unwrap_err();
        assert!(matches!(err, TransitionError::Role(_)));
    }

    #[test]
    fn refusal_requires_a_reason() {
        let err = validate_transition(
            InProgress,
            &admin(),
            None,
            &request(CustomerRefusedRepair),
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::Validation(_)));

        let mut req = request(CustomerRefusedRepair);
        req.customer_refusal_reason = Some("   ".to_string());
        let err = validate_transition(InProgress, &admin(), None, &req).unwrap_err();
        assert!(matches!(err, TransitionError::Validation(_)));
    }

    #[test]
    fn refusal_reason_is_normalized_and_kept_verbatim() {
        let mut req = request(CustomerRefusedRepair);
        req.customer_refusal_reason = Some("  Cost too high  ".to_string());

        let TransitionOutcome::Apply(change) =
            validate_transition(InProgress, &admin(), None, &req).unwrap()
        else {
            panic!("expected an applied change");
        };
        assert_eq!(change.customer_refusal_reason.as_deref(), Some("Cost too high"));
        assert_eq!(change.client_unavailable_reason, None);
    }

    #[test]
    fn unavailability_statuses_require_reason_and_accept_rescheduling() {
        for status in [ClientNotHome, ClientNotAnswering] {
            let err = validate_transition(InProgress, &admin(), None, &request(status))
                .unwrap_err();
            assert!(matches!(err, TransitionError::Validation(_)), "{status}");

            let mut req = request(status);
            req.client_unavailable_reason = Some("no answer at the door".to_string());
            req.needs_rescheduling = Some(true);
            req.rescheduling_notes = Some("call after 18:00".to_string());

            let TransitionOutcome::Apply(change) =
                validate_transition(InProgress, &admin(), None, &req).unwrap()
            else {
                panic!("expected an applied change");
            };
            assert!(change.needs_rescheduling);
            assert_eq!(change.rescheduling_notes.as_deref(), Some("call after 18:00"));
        }
    }

    #[test]
    fn rescheduling_flag_is_ignored_outside_unavailability_statuses() {
        let mut req = request(Scheduled);
        req.needs_rescheduling = Some(true);
        req.rescheduling_notes = Some("should not persist".to_string());

        let TransitionOutcome::Apply(change) =
            validate_transition(Pending, &admin(), None, &req).unwrap()
        else {
            panic!("expected an applied change");
        };
        assert!(!change.needs_rescheduling);
        assert_eq!(change.rescheduling_notes, None);
    }
}

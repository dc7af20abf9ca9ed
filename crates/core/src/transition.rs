//! The transition validator: a pure decision over (status, action, caller).
//!
//! Every mutation of a rental request flows through [`validate`]. It answers
//! two questions and nothing else: is this edge part of the state machine,
//! and does it land the request on which status. It reads the record but
//! never writes it; applying the effects (approval slots, model info, audit
//! trail, version) is the engine's job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::request::{Actor, Direction, RentalRequest, RequestStatus, Side};

// ──────────────────────────────────────────────
// Actions
// ──────────────────────────────────────────────

/// An approval-chain decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// Every action a caller (or the engine itself) can attempt against a
/// request. One closed enum so the edge table below is checked exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum RequestAction {
    /// Record one side's approval or rejection during review.
    Decide { side: Side, decision: Decision },
    /// Exchange initiates the rental payment.
    MarkPaid,
    /// Museum acknowledges payment and releases the artifact.
    Confirm,
    /// Museum hands the artifact to the courier.
    MarkInTransit,
    /// Exchange takes physical custody.
    MarkActive,
    /// Exchange returns the artifact; closes the rental.
    Return,
    /// Requesting side withdraws before transit begins.
    Cancel,
    /// Either side escalates; frozen until manual resolution.
    RaiseDispute,
    /// Automatic entry into the digitization sub-workflow.
    StartDigitization,
    /// Exchange registers the scanned 3D model.
    UploadModel,
    /// Museum signs off on publishing its artifact virtually.
    ApproveModel,
    /// Museum sends the model back for re-scanning.
    RejectModel,
    /// Automatic flag by the overdue scanner.
    MarkOverdue,
    /// Requesting side extends or shortens the custody window.
    AmendEndDate,
    /// Either side adjusts pricing during review.
    AmendPricing,
}

impl RequestAction {
    /// Stable name recorded in audit entries and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            RequestAction::Decide { .. } => "decide",
            RequestAction::MarkPaid => "mark_paid",
            RequestAction::Confirm => "confirm",
            RequestAction::MarkInTransit => "mark_in_transit",
            RequestAction::MarkActive => "mark_active",
            RequestAction::Return => "return",
            RequestAction::Cancel => "cancel",
            RequestAction::RaiseDispute => "raise_dispute",
            RequestAction::StartDigitization => "start_digitization",
            RequestAction::UploadModel => "upload_model",
            RequestAction::ApproveModel => "approve_model",
            RequestAction::RejectModel => "reject_model",
            RequestAction::MarkOverdue => "mark_overdue",
            RequestAction::AmendEndDate => "amend_end_date",
            RequestAction::AmendPricing => "amend_pricing",
        }
    }
}

// ──────────────────────────────────────────────
// Policy
// ──────────────────────────────────────────────

/// External configuration consumed by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionPolicy {
    /// When set, an `ExchangeToMuseum` request whose total amount is strictly
    /// below this value is approved on the exchange decision alone. `None`
    /// means both sides are always required.
    pub single_side_threshold: Option<Decimal>,
}

impl TransitionPolicy {
    fn chain_satisfied(&self, request: &RentalRequest, museum: bool, exchange: bool) -> bool {
        if museum && exchange {
            return true;
        }
        match self.single_side_threshold {
            Some(threshold) => {
                exchange
                    && request.direction == Direction::ExchangeToMuseum
                    && request.pricing.total_amount < threshold
            }
            None => false,
        }
    }
}

// ──────────────────────────────────────────────
// Validation
// ──────────────────────────────────────────────

/// Decide whether `action` by `caller` is a legal edge out of the request's
/// current status, and return the status it lands on.
///
/// Amendments return the current status unchanged: they are accepted
/// transitions (audit entry, version bump) that happen not to move.
///
/// # Errors
///
/// [`TransitionError::NotApplicable`] when a digitization edge is attempted
/// on a non-virtual request; [`TransitionError::InvalidTransition`] for every
/// other illegal (status, action, role) triple, including role mismatches —
/// an edge the caller may not take does not exist for that caller.
pub fn validate(
    request: &RentalRequest,
    action: &RequestAction,
    caller: &Actor,
    policy: &TransitionPolicy,
) -> Result<RequestStatus, TransitionError> {
    if is_digitization(action) && !request.for_virtual_museum {
        return Err(TransitionError::NotApplicable {
            action: action.name(),
        });
    }

    if !authorized(request, action, caller) {
        return Err(invalid(request.status, action));
    }

    use RequestAction as A;
    use RequestStatus as S;

    let target = match (request.status, action) {
        // Review: each side writes its own slot exactly once. A first
        // approval leaves the status in place; the chain decides when the
        // request flips to Approved.
        (
            S::PendingReview,
            A::Decide {
                side,
                decision: Decision::Approve,
            },
        ) => {
            if !request.approvals.slot(*side).is_pending() {
                return Err(invalid(request.status, action));
            }
            let museum = request.approvals.museum.is_approved() || *side == Side::Museum;
            let exchange = request.approvals.exchange.is_approved() || *side == Side::Exchange;
            if policy.chain_satisfied(request, museum, exchange) {
                S::Approved
            } else {
                S::PendingReview
            }
        }

        // Rejection short-circuits the whole review, from either side,
        // before the rental turns financial.
        (
            S::PendingReview | S::Approved,
            A::Decide {
                decision: Decision::Reject,
                ..
            },
        ) => S::Rejected,

        // Canonical custody path.
        (S::Approved, A::MarkPaid) => S::PaymentPending,
        (S::PaymentPending, A::Confirm) => S::Confirmed,
        (S::Confirmed, A::MarkInTransit) => S::InTransit,
        (S::InTransit, A::MarkActive) => S::Active,
        (S::Active | S::Overdue | S::VirtualMuseumReady, A::Return) => S::Completed,

        // Escapes.
        (
            S::PendingReview | S::Approved | S::PaymentPending | S::Confirmed,
            A::Cancel,
        ) => S::Cancelled,
        (S::InTransit | S::Active | S::Overdue, A::RaiseDispute) => S::Dispute,

        // Digitization sub-workflow (virtual requests only, gated above).
        (S::Active, A::StartDigitization) => S::DigitizationInProgress,
        (S::DigitizationInProgress, A::UploadModel) => S::ModelUploaded,
        (S::ModelUploaded, A::ApproveModel) => S::VirtualMuseumReady,
        (S::ModelUploaded, A::RejectModel) => S::DigitizationInProgress,

        // Scanner edge.
        (S::Active, A::MarkOverdue) => S::Overdue,

        // Amendments: accepted, status unchanged.
        (
            S::PendingReview | S::Approved | S::PaymentPending | S::Confirmed,
            A::AmendEndDate,
        ) => request.status,
        (S::PendingReview, A::AmendPricing) => request.status,

        _ => return Err(invalid(request.status, action)),
    };

    Ok(target)
}

fn invalid(from: RequestStatus, action: &RequestAction) -> TransitionError {
    TransitionError::InvalidTransition {
        from,
        action: action.name(),
    }
}

fn is_digitization(action: &RequestAction) -> bool {
    matches!(
        action,
        RequestAction::StartDigitization
            | RequestAction::UploadModel
            | RequestAction::ApproveModel
            | RequestAction::RejectModel
    )
}

/// Role gate: which side (or the system) may take each edge.
///
/// The exchange pays, receives, returns, and scans; the museum confirms,
/// ships, and holds final say over its artifact's virtual publication.
/// Cancellation and window amendments belong to whichever side initiated the
/// request.
fn authorized(request: &RentalRequest, action: &RequestAction, caller: &Actor) -> bool {
    use RequestAction as A;
    match action {
        A::Decide { side, .. } => caller.side() == Some(*side),
        A::MarkPaid | A::MarkActive | A::Return | A::UploadModel => {
            caller.side() == Some(Side::Exchange)
        }
        A::Confirm | A::MarkInTransit | A::ApproveModel | A::RejectModel => {
            caller.side() == Some(Side::Museum)
        }
        A::Cancel | A::AmendEndDate => caller.side() == Some(request.requester()),
        A::RaiseDispute | A::AmendPricing => caller.side().is_some(),
        A::StartDigitization | A::MarkOverdue => matches!(caller, Actor::System),
    }
}

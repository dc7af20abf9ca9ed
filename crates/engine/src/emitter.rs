//! Notification descriptors for accepted transitions.
//!
//! The engine never delivers anything itself — no transition waits on a
//! network call. It returns a descriptor naming the counter-party and a
//! templated message key; the host's dispatcher does the rest.

use curio_core::{Actor, Decision, RentalRequest, RequestAction, RequestStatus, Side};
use serde::Serialize;

/// Who to tell, and which message template to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: Side,
    pub message_key: &'static str,
    pub request_id: String,
}

/// Descriptor for an accepted transition: the counter-party of the actor, or
/// the requesting side for system-driven edges.
pub(crate) fn notification(
    request: &RentalRequest,
    action: &RequestAction,
    caller: &Actor,
) -> Notification {
    let recipient = caller
        .side()
        .map(Side::opposite)
        .unwrap_or_else(|| request.requester());
    Notification {
        recipient,
        message_key: message_key(request, action),
        request_id: request.id.clone(),
    }
}

fn message_key(request: &RentalRequest, action: &RequestAction) -> &'static str {
    match action {
        RequestAction::Decide {
            decision: Decision::Approve,
            ..
        } => {
            if request.status == RequestStatus::Approved {
                "rental.approved"
            } else {
                "rental.approval_recorded"
            }
        }
        RequestAction::Decide {
            decision: Decision::Reject,
            ..
        } => "rental.rejected",
        RequestAction::MarkPaid => "rental.payment_initiated",
        RequestAction::Confirm => "rental.confirmed",
        RequestAction::MarkInTransit => "rental.in_transit",
        RequestAction::MarkActive => "rental.active",
        RequestAction::Return => "rental.completed",
        RequestAction::Cancel => "rental.cancelled",
        RequestAction::RaiseDispute => "rental.dispute_raised",
        RequestAction::StartDigitization => "rental.digitization_started",
        RequestAction::UploadModel => "rental.model_uploaded",
        RequestAction::ApproveModel => "rental.virtual_museum_ready",
        RequestAction::RejectModel => "rental.model_rejected",
        RequestAction::MarkOverdue => "rental.overdue",
        RequestAction::AmendEndDate => "rental.end_date_amended",
        RequestAction::AmendPricing => "rental.pricing_amended",
    }
}

//! Approval-chain effects.
//!
//! The validator decides whether a decision is legal and what status the
//! request lands on; this module writes the slots. A rejection by either
//! side short-circuits the other side's pending slot to `Skipped` in the
//! same write, so a rejected request never shows a half-open chain.

use curio_core::{ApprovalSlot, Decision, RentalRequest, Side};
use time::OffsetDateTime;

pub(crate) fn record(
    request: &mut RentalRequest,
    side: Side,
    decision: Decision,
    actor: &str,
    now: OffsetDateTime,
    comment: Option<String>,
) {
    match decision {
        Decision::Approve => {
            *request.approvals.slot_mut(side) = ApprovalSlot::Approved {
                actor: actor.to_string(),
                decided_at: now,
                comment,
            };
        }
        Decision::Reject => {
            // A slot holds at most one terminal decision. A post-approval
            // rejection keeps the old slot; the audit entry carries the
            // rejection itself.
            if request.approvals.slot(side).is_pending() {
                *request.approvals.slot_mut(side) = ApprovalSlot::Rejected {
                    actor: actor.to_string(),
                    decided_at: now,
                    comment,
                };
            }
            let other = side.opposite();
            if request.approvals.slot(other).is_pending() {
                *request.approvals.slot_mut(other) = ApprovalSlot::Skipped;
            }
        }
    }
}

//! Rental-request records.
//!
//! These are the durable shapes persisted by `curio-storage` and mutated
//! exclusively through the transition validator. Timestamps are
//! `OffsetDateTime` in memory and RFC 3339 strings on the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

// ──────────────────────────────────────────────
// Parties
// ──────────────────────────────────────────────

/// Which party initiated the rental request. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// A museum offers one of its artifacts to the exchange's collection.
    MuseumToExchange,
    /// The exchange requests an artifact from a museum.
    ExchangeToMuseum,
}

impl Direction {
    /// The side that initiated the request. Cancellation and end-date
    /// amendments are reserved to this side.
    pub fn requester(self) -> Side {
        match self {
            Direction::MuseumToExchange => Side::Museum,
            Direction::ExchangeToMuseum => Side::Exchange,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::MuseumToExchange => write!(f, "museum_to_exchange"),
            Direction::ExchangeToMuseum => write!(f, "exchange_to_museum"),
        }
    }
}

/// One of the two administrative parties. Doubles as the caller role: each
/// side's administrators act for that side and no other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Museum,
    Exchange,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Museum => Side::Exchange,
            Side::Exchange => Side::Museum,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Museum => write!(f, "museum"),
            Side::Exchange => write!(f, "exchange"),
        }
    }
}

/// The resolved identity behind a call. Authentication happens outside the
/// engine; by the time an action arrives the host has already mapped the
/// session to an administrator id and side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Actor {
    /// An administrator acting for one side.
    Admin { id: String, side: Side },
    /// The engine itself (overdue scanner, automatic edges).
    System,
}

impl Actor {
    pub fn admin(id: impl Into<String>, side: Side) -> Self {
        Actor::Admin { id: id.into(), side }
    }

    /// The side this actor acts for, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            Actor::Admin { side, .. } => Some(*side),
            Actor::System => None,
        }
    }

    /// Identity string recorded in the audit trail.
    pub fn audit_id(&self) -> &str {
        match self {
            Actor::Admin { id, .. } => id,
            Actor::System => "system",
        }
    }
}

// ──────────────────────────────────────────────
// Status
// ──────────────────────────────────────────────

/// Lifecycle status of a rental request — the single source of truth for
/// where the request sits. Closed enum: every consumer matches exhaustively,
/// so adding a status forces each match to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    PendingReview,
    Approved,
    Rejected,
    PaymentPending,
    Confirmed,
    InTransit,
    Active,
    DigitizationInProgress,
    ModelUploaded,
    VirtualMuseumReady,
    Completed,
    Overdue,
    Cancelled,
    Dispute,
}

impl RequestStatus {
    /// All statuses, in lifecycle order. Used for statistics buckets.
    pub const ALL: [RequestStatus; 14] = [
        RequestStatus::PendingReview,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::PaymentPending,
        RequestStatus::Confirmed,
        RequestStatus::InTransit,
        RequestStatus::Active,
        RequestStatus::DigitizationInProgress,
        RequestStatus::ModelUploaded,
        RequestStatus::VirtualMuseumReady,
        RequestStatus::Completed,
        RequestStatus::Overdue,
        RequestStatus::Cancelled,
        RequestStatus::Dispute,
    ];

    /// Terminal statuses accept no further edges. `Dispute` is terminal to
    /// the engine: resolution happens outside the system boundary.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed
                | RequestStatus::Rejected
                | RequestStatus::Cancelled
                | RequestStatus::Dispute
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::PendingReview => "pending_review",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::PaymentPending => "payment_pending",
            RequestStatus::Confirmed => "confirmed",
            RequestStatus::InTransit => "in_transit",
            RequestStatus::Active => "active",
            RequestStatus::DigitizationInProgress => "digitization_in_progress",
            RequestStatus::ModelUploaded => "model_uploaded",
            RequestStatus::VirtualMuseumReady => "virtual_museum_ready",
            RequestStatus::Completed => "completed",
            RequestStatus::Overdue => "overdue",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Dispute => "dispute",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Value parts
// ──────────────────────────────────────────────

/// Requested custody window. `end_date` may be amended only before the
/// artifact is in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalWindow {
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub requested_days: u32,
}

/// Agreed pricing. Set at creation, adjustable only while the request is
/// still in `pending_review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub total_amount: Decimal,
    pub security_deposit: Decimal,
    pub currency: String,
}

/// One side's approval slot. A slot accepts at most one terminal decision;
/// `Skipped` is written when the other side rejects first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum ApprovalSlot {
    Pending,
    Approved {
        actor: String,
        #[serde(with = "time::serde::rfc3339")]
        decided_at: OffsetDateTime,
        comment: Option<String>,
    },
    Rejected {
        actor: String,
        #[serde(with = "time::serde::rfc3339")]
        decided_at: OffsetDateTime,
        comment: Option<String>,
    },
    Skipped,
}

impl ApprovalSlot {
    pub fn is_pending(&self) -> bool {
        matches!(self, ApprovalSlot::Pending)
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalSlot::Approved { .. })
    }
}

/// Both approval slots of the two-sided review chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalChain {
    pub museum: ApprovalSlot,
    pub exchange: ApprovalSlot,
}

impl ApprovalChain {
    pub fn new() -> Self {
        Self {
            museum: ApprovalSlot::Pending,
            exchange: ApprovalSlot::Pending,
        }
    }

    pub fn slot(&self, side: Side) -> &ApprovalSlot {
        match side {
            Side::Museum => &self.museum,
            Side::Exchange => &self.exchange,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut ApprovalSlot {
        match side {
            Side::Museum => &mut self.museum,
            Side::Exchange => &mut self.exchange,
        }
    }
}

impl Default for ApprovalChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Digitization progress. Present only on virtual-museum requests; populated
/// field by field as the sub-workflow advances. `approved_at` is never set
/// before `uploaded_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_ref: Option<String>,
    pub uploaded_by: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub uploaded_at: Option<OffsetDateTime>,
    pub approved_by: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
}

/// One accepted transition. The trail is append-only: entries are never
/// rewritten, and each accepted transition appends exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub from_status: RequestStatus,
    pub to_status: RequestStatus,
    pub actor: String,
    pub action: String,
    /// Caller-supplied idempotency key. A replay with a token already in the
    /// trail is a no-op returning the stored record.
    pub action_token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    pub comment: Option<String>,
}

// ──────────────────────────────────────────────
// The request record
// ──────────────────────────────────────────────

/// A rental request: the long-lived, multi-party record at the center of the
/// exchange. Never deleted; terminal statuses are retained for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub id: String,
    pub direction: Direction,
    pub artifact_ref: String,
    pub museum_ref: String,
    pub for_virtual_museum: bool,
    pub status: RequestStatus,
    pub window: RentalWindow,
    pub pricing: Pricing,
    pub approvals: ApprovalChain,
    pub model_info: Option<ModelInfo>,
    pub audit_trail: Vec<AuditEntry>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Optimistic-concurrency version: 0 at creation, +1 per accepted
    /// transition.
    pub version: i64,
}

impl RentalRequest {
    /// Whether an idempotency token has already been applied to this record.
    pub fn has_token(&self, token: &str) -> bool {
        self.audit_trail.iter().any(|e| e.action_token == token)
    }

    pub fn requester(&self) -> Side {
        self.direction.requester()
    }
}

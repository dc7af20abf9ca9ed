//! Curio core: the rental-request domain model and the pure transition
//! validator.
//!
//! This crate has no I/O and no async. It defines the `RentalRequest` record,
//! the closed `RequestStatus` state machine, and `transition::validate`, which
//! decides whether a (status, action, caller) triple is a legal edge and what
//! status it lands on. Persistence and orchestration live in `curio-storage`
//! and `curio-engine`.

pub mod error;
pub mod request;
pub mod transition;

pub use error::TransitionError;
pub use request::{
    ApprovalChain, ApprovalSlot, AuditEntry, Actor, Direction, ModelInfo, Pricing, RentalRequest,
    RentalWindow, RequestStatus, Side,
};
pub use transition::{Decision, RequestAction, TransitionPolicy};

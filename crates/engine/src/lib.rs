//! Curio engine: the rental-request lifecycle engine.
//!
//! Sits between callers (whatever transport the host uses) and
//! `curio-storage`. Every operation follows the same path: load the record
//! with its version, check the idempotency token, run the transition
//! validator, apply the effects, write back under compare-and-swap, and hand
//! the caller the updated record plus a notification descriptor for the
//! counter-party. The overdue scanner drives the one automatic edge through
//! the identical path.

mod approval;
mod clock;
mod config;
mod digitization;
mod directory;
mod emitter;
mod engine;
mod error;
mod scanner;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use directory::{DirectoryResolver, PermissiveDirectory, StaticDirectory};
pub use emitter::Notification;
pub use engine::{Engine, NewRequest, TransitionOutcome};
pub use error::EngineError;
pub use scanner::{run_scanner, SweepReport};

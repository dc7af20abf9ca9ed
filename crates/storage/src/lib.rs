//! Durable, keyed storage for rental requests.
//!
//! The [`RequestStore`] trait is the persistence seam of the engine: keyed
//! reads, optimistic-concurrency writes (compare-and-swap on the record
//! version), filtered listing, the overdue-scanner feed, and aggregate
//! statistics. [`MemoryStore`] is the bundled backend; the
//! [`conformance`] module lets any other backend prove the same contract.

pub mod conformance;
mod error;
mod memory;
mod query;
mod traits;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use query::{
    Page, PageRequest, RequestFilter, RequestSummary, Statistics, StatusCount, TimeRange,
};
pub use traits::RequestStore;

use async_trait::async_trait;
use curio_core::RentalRequest;
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::query::{Page, PageRequest, RequestFilter, RequestSummary, Statistics, TimeRange};

/// The storage trait for rental-request backends.
///
/// The request record is the unit of concurrency control: `update` is a
/// compare-and-swap conditioned on the version the caller loaded, and no
/// engine operation ever spans two records, so backends need no cross-record
/// transactions. A failed CAS returns
/// `Err(StorageError::VersionConflict { .. })` and leaves the stored record
/// untouched.
///
/// Implementations must be `Send + Sync + 'static` so they can sit behind an
/// `Arc` in axum state and cross async task boundaries.
#[async_trait]
pub trait RequestStore: Send + Sync + 'static {
    /// Insert a freshly created record.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` if the id is taken.
    async fn insert(&self, request: RentalRequest) -> Result<(), StorageError>;

    /// Load a record by id.
    ///
    /// Returns `Err(StorageError::NotFound)` if no record has the id.
    async fn get(&self, id: &str) -> Result<RentalRequest, StorageError>;

    /// Replace a record, conditioned on its stored version still being
    /// `expected_version`.
    ///
    /// The caller passes the already-advanced record (`request.version ==
    /// expected_version + n` for n applied transitions); the CAS compares the
    /// *stored* version against `expected_version` only.
    async fn update(
        &self,
        request: RentalRequest,
        expected_version: i64,
    ) -> Result<(), StorageError>;

    /// List summaries matching `filter`, ordered by creation time then id.
    async fn list(
        &self,
        filter: &RequestFilter,
        page: &PageRequest,
    ) -> Result<Page<RequestSummary>, StorageError>;

    /// Scanner feed: full records with `status = Active` whose rental window
    /// ended before `deadline`.
    async fn list_active_ending_before(
        &self,
        deadline: OffsetDateTime,
    ) -> Result<Vec<RentalRequest>, StorageError>;

    /// Aggregate counts per status and total rental value, optionally bounded
    /// to records created inside `range`.
    async fn statistics(&self, range: Option<&TimeRange>) -> Result<Statistics, StorageError>;
}

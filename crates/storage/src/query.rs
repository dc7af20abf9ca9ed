//! Query-side types: filters, pages, summaries, statistics.

use curio_core::{Direction, RentalRequest, RequestStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Listing filter. All fields are conjunctive; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub direction: Option<Direction>,
    pub museum_ref: Option<String>,
}

impl RequestFilter {
    pub fn matches(&self, request: &RentalRequest) -> bool {
        self.status.is_none_or(|s| s == request.status)
            && self.direction.is_none_or(|d| d == request.direction)
            && self
                .museum_ref
                .as_deref()
                .is_none_or(|m| m == request.museum_ref)
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl PageRequest {
    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

/// One page of results, with the total match count for pagination UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

/// Listing row: the fields a request list renders, without the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub id: String,
    pub status: RequestStatus,
    pub direction: Direction,
    pub artifact_ref: String,
    pub museum_ref: String,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub version: i64,
}

impl From<&RentalRequest> for RequestSummary {
    fn from(request: &RentalRequest) -> Self {
        Self {
            id: request.id.clone(),
            status: request.status,
            direction: request.direction,
            artifact_ref: request.artifact_ref.clone(),
            museum_ref: request.museum_ref.clone(),
            total_amount: request.pricing.total_amount,
            currency: request.pricing.currency.clone(),
            end_date: request.window.end_date,
            version: request.version,
        }
    }
}

/// Half-open `created_at` range `[from, to)` for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "time::serde::rfc3339")]
    pub from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to: OffsetDateTime,
}

impl TimeRange {
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.from <= instant && instant < self.to
    }
}

/// Per-status bucket of the aggregate view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: RequestStatus,
    pub count: u64,
}

/// Aggregate counts per status plus total rental value. A read-only
/// projection; dashboards consume it, nothing writes through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// One bucket per status, in lifecycle order, zeros included.
    pub counts: Vec<StatusCount>,
    pub total_requests: u64,
    pub total_value: Decimal,
}

impl Statistics {
    /// Fold a set of requests into buckets. Backends with real query engines
    /// aggregate in the database instead; the result shape is the same.
    pub fn from_requests<'a, I>(requests: I) -> Self
    where
        I: IntoIterator<Item = &'a RentalRequest>,
    {
        let mut by_status = std::collections::BTreeMap::new();
        let mut total_requests = 0u64;
        let mut total_value = Decimal::ZERO;
        for request in requests {
            *by_status.entry(request.status).or_insert(0u64) += 1;
            total_requests += 1;
            total_value += request.pricing.total_amount;
        }
        let counts = RequestStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: *status,
                count: by_status.get(status).copied().unwrap_or(0),
            })
            .collect();
        Self {
            counts,
            total_requests,
            total_value,
        }
    }
}

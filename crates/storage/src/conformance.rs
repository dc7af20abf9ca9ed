//! Conformance test suite for `RequestStore` implementations.
//!
//! A backend-agnostic suite any `RequestStore` can run to prove the storage
//! contract:
//!
//! - **Round-trip**: insert/get fidelity, duplicate detection, missing ids
//! - **CAS**: version-conditioned updates, stale-version conflicts
//! - **Races**: two writers from the same version — exactly one winner
//! - **Queries**: filtering, pagination totals, the scanner feed
//! - **Statistics**: per-status counts and total value, time-range bounds
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that builds a
//! fresh, empty store for each case:
//!
//! ```ignore
//! use curio_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         std::sync::Arc::new(create_test_postgres_store().await)
//!     })
//!     .await;
//!     assert_eq!(report.failed, 0, "{report}");
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use curio_core::{
    ApprovalChain, Direction, Pricing, RentalRequest, RentalWindow, RequestStatus,
};
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use crate::error::StorageError;
use crate::query::{PageRequest, RequestFilter, TimeRange};
use crate::traits::RequestStore;

// ──────────────────────────────────────────────
// Report types
// ──────────────────────────────────────────────

/// Result of a single conformance case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// Case category (e.g. "cas", "query").
    pub category: String,
    /// Case name (e.g. "stale_version_conflicts").
    pub name: String,
    pub passed: bool,
    /// Failure message, when failed.
    pub message: Option<String>,
}

impl CaseResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated outcome of a full suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<CaseResult>,
    pub passed: usize,
    pub failed: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "conformance: {} passed, {} failed", self.passed, self.failed)?;
        for result in &self.results {
            if result.passed {
                writeln!(f, "  ok      {}/{}", result.category, result.name)?;
            } else {
                writeln!(
                    f,
                    "  FAILED  {}/{}: {}",
                    result.category,
                    result.name,
                    result.message.as_deref().unwrap_or("")
                )?;
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn base_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_767_225_600).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// A minimal valid record; cases tweak status, dates, and pricing.
pub fn fixture_request(id: &str) -> RentalRequest {
    let created_at = base_time();
    RentalRequest {
        id: id.to_string(),
        direction: Direction::MuseumToExchange,
        artifact_ref: format!("artifact-{id}"),
        museum_ref: "museum-prado".to_string(),
        for_virtual_museum: false,
        status: RequestStatus::PendingReview,
        window: RentalWindow {
            start_date: created_at + Duration::days(10),
            end_date: created_at + Duration::days(40),
            requested_days: 30,
        },
        pricing: Pricing {
            total_amount: Decimal::new(100_000, 2),
            security_deposit: Decimal::new(10_000, 2),
            currency: "EUR".to_string(),
        },
        approvals: ApprovalChain::new(),
        model_info: None,
        audit_trail: vec![],
        created_at,
        version: 0,
    }
}

// ──────────────────────────────────────────────
// Runner
// ──────────────────────────────────────────────

/// Run every conformance case against fresh stores produced by `factory`.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: RequestStore,
    F: Fn() -> Fut,
    Fut: Future<Output = Arc<S>>,
{
    let mut results = Vec::new();

    results.push(CaseResult::from_result(
        "roundtrip",
        "insert_then_get",
        insert_then_get(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "roundtrip",
        "duplicate_insert_rejected",
        duplicate_insert_rejected(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "roundtrip",
        "get_missing_is_not_found",
        get_missing_is_not_found(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "cas",
        "update_applies_at_expected_version",
        update_applies_at_expected_version(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "cas",
        "stale_version_conflicts",
        stale_version_conflicts(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "cas",
        "update_missing_is_not_found",
        update_missing_is_not_found(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "cas",
        "concurrent_writers_one_winner",
        concurrent_writers_one_winner(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "query",
        "filter_and_paginate",
        filter_and_paginate(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "query",
        "scanner_feed",
        scanner_feed(factory().await).await,
    ));
    results.push(CaseResult::from_result(
        "stats",
        "counts_and_total_value",
        counts_and_total_value(factory().await).await,
    ));

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    ConformanceReport {
        results,
        passed,
        failed,
    }
}

// ──────────────────────────────────────────────
// Cases
// ──────────────────────────────────────────────

async fn insert_then_get<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    let request = fixture_request("req-1");
    store.insert(request.clone()).await.map_err(err)?;
    let loaded = store.get("req-1").await.map_err(err)?;
    if loaded != request {
        return Err("loaded record differs from inserted record".to_string());
    }
    Ok(())
}

async fn duplicate_insert_rejected<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    store.insert(fixture_request("req-1")).await.map_err(err)?;
    match store.insert(fixture_request("req-1")).await {
        Err(StorageError::AlreadyExists { id }) if id == "req-1" => Ok(()),
        other => Err(format!("expected AlreadyExists, got {other:?}")),
    }
}

async fn get_missing_is_not_found<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    match store.get("req-missing").await {
        Err(StorageError::NotFound { id }) if id == "req-missing" => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

async fn update_applies_at_expected_version<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    store.insert(fixture_request("req-1")).await.map_err(err)?;
    let mut next = store.get("req-1").await.map_err(err)?;
    next.status = RequestStatus::Approved;
    next.version += 1;
    store.update(next, 0).await.map_err(err)?;
    let loaded = store.get("req-1").await.map_err(err)?;
    if loaded.version != 1 || loaded.status != RequestStatus::Approved {
        return Err(format!(
            "expected version 1 / approved, got version {} / {}",
            loaded.version, loaded.status
        ));
    }
    Ok(())
}

async fn stale_version_conflicts<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    store.insert(fixture_request("req-1")).await.map_err(err)?;
    let mut next = store.get("req-1").await.map_err(err)?;
    next.version += 1;
    store.update(next.clone(), 0).await.map_err(err)?;

    // Second writer still holds version 0.
    let mut stale = fixture_request("req-1");
    stale.version = 1;
    match store.update(stale, 0).await {
        Err(StorageError::VersionConflict { id, expected }) if id == "req-1" && expected == 0 => {}
        other => return Err(format!("expected VersionConflict, got {other:?}")),
    }

    // The winner's write must be intact.
    let loaded = store.get("req-1").await.map_err(err)?;
    if loaded != next {
        return Err("losing write corrupted the stored record".to_string());
    }
    Ok(())
}

async fn update_missing_is_not_found<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    match store.update(fixture_request("req-ghost"), 0).await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

async fn concurrent_writers_one_winner<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    store.insert(fixture_request("req-1")).await.map_err(err)?;

    let mut first = store.get("req-1").await.map_err(err)?;
    first.status = RequestStatus::Approved;
    first.version += 1;
    let mut second = store.get("req-1").await.map_err(err)?;
    second.status = RequestStatus::Rejected;
    second.version += 1;

    let store_a = Arc::clone(&store);
    let store_b = Arc::clone(&store);
    let task_a = tokio::spawn(async move { store_a.update(first, 0).await });
    let task_b = tokio::spawn(async move { store_b.update(second, 0).await });
    let outcome_a = task_a.await.map_err(|e| e.to_string())?;
    let outcome_b = task_b.await.map_err(|e| e.to_string())?;

    match (outcome_a, outcome_b) {
        (Ok(()), Err(StorageError::VersionConflict { .. }))
        | (Err(StorageError::VersionConflict { .. }), Ok(())) => {}
        other => return Err(format!("expected exactly one winner, got {other:?}")),
    }
    let loaded = store.get("req-1").await.map_err(err)?;
    if loaded.version != 1 {
        return Err(format!("expected version 1 after race, got {}", loaded.version));
    }
    Ok(())
}

async fn filter_and_paginate<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    for i in 0..5 {
        let mut request = fixture_request(&format!("req-{i}"));
        request.created_at += Duration::minutes(i);
        if i >= 3 {
            request.status = RequestStatus::Active;
            request.museum_ref = "museum-orsay".to_string();
        }
        store.insert(request).await.map_err(err)?;
    }

    let all = store
        .list(&RequestFilter::default(), &PageRequest { page: 1, page_size: 10 })
        .await
        .map_err(err)?;
    if all.total != 5 || all.items.len() != 5 {
        return Err(format!("expected 5 records, got total {} / {}", all.total, all.items.len()));
    }

    let active = store
        .list(
            &RequestFilter {
                status: Some(RequestStatus::Active),
                museum_ref: Some("museum-orsay".to_string()),
                ..Default::default()
            },
            &PageRequest { page: 1, page_size: 10 },
        )
        .await
        .map_err(err)?;
    if active.total != 2 {
        return Err(format!("expected 2 active records, got {}", active.total));
    }

    let second_page = store
        .list(&RequestFilter::default(), &PageRequest { page: 2, page_size: 2 })
        .await
        .map_err(err)?;
    if second_page.total != 5 || second_page.items.len() != 2 {
        return Err("page 2 of size 2 over 5 records should hold 2 items".to_string());
    }
    if second_page.items[0].id != "req-2" {
        return Err(format!(
            "pagination order broken: expected req-2 first on page 2, got {}",
            second_page.items[0].id
        ));
    }
    Ok(())
}

async fn scanner_feed<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    let deadline = base_time() + Duration::days(60);

    let mut overdue = fixture_request("req-overdue");
    overdue.status = RequestStatus::Active;
    overdue.window.end_date = deadline - Duration::days(1);
    store.insert(overdue).await.map_err(err)?;

    let mut running = fixture_request("req-running");
    running.status = RequestStatus::Active;
    running.window.end_date = deadline + Duration::days(1);
    store.insert(running).await.map_err(err)?;

    let mut inactive = fixture_request("req-inactive");
    inactive.status = RequestStatus::Confirmed;
    inactive.window.end_date = deadline - Duration::days(1);
    store.insert(inactive).await.map_err(err)?;

    let feed = store.list_active_ending_before(deadline).await.map_err(err)?;
    let ids: Vec<&str> = feed.iter().map(|r| r.id.as_str()).collect();
    if ids != ["req-overdue"] {
        return Err(format!("expected only req-overdue in the feed, got {ids:?}"));
    }
    Ok(())
}

async fn counts_and_total_value<S: RequestStore>(store: Arc<S>) -> Result<(), String> {
    let mut early = fixture_request("req-early");
    early.pricing.total_amount = Decimal::new(100_000, 2);
    store.insert(early).await.map_err(err)?;

    let mut late = fixture_request("req-late");
    late.status = RequestStatus::Completed;
    late.created_at += Duration::days(30);
    late.pricing.total_amount = Decimal::new(50_000, 2);
    store.insert(late).await.map_err(err)?;

    let stats = store.statistics(None).await.map_err(err)?;
    if stats.total_requests != 2 || stats.total_value != Decimal::new(150_000, 2) {
        return Err(format!(
            "expected 2 requests worth 1500.00, got {} worth {}",
            stats.total_requests, stats.total_value
        ));
    }
    let pending = stats
        .counts
        .iter()
        .find(|c| c.status == RequestStatus::PendingReview)
        .map(|c| c.count);
    if pending != Some(1) {
        return Err(format!("expected one pending_review bucket, got {pending:?}"));
    }

    let bounded = store
        .statistics(Some(&TimeRange {
            from: base_time() - Duration::days(1),
            to: base_time() + Duration::days(1),
        }))
        .await
        .map_err(err)?;
    if bounded.total_requests != 1 {
        return Err(format!(
            "time-bounded statistics should see 1 request, got {}",
            bounded.total_requests
        ));
    }
    Ok(())
}

fn err(e: StorageError) -> String {
    e.to_string()
}

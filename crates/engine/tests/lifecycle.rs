//! End-to-end lifecycle scenarios against the in-memory backend.
//!
//! Walks the full custody path, the digitization branch, rejection
//! short-circuits, idempotent replays, stale-write conflicts, overdue
//! sweeps, and the amendment windows.

use std::sync::Arc;

use curio_core::{
    ApprovalSlot, Actor, Decision, Direction, Pricing, RentalWindow, RequestStatus, Side,
    TransitionError, TransitionPolicy,
};
use curio_engine::{Engine, EngineConfig, EngineError, FixedClock, NewRequest, StaticDirectory};
use curio_storage::{MemoryStore, RequestStore};
use rust_decimal::Decimal;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

const T0: OffsetDateTime = datetime!(2026-01-01 00:00 UTC);

fn museum() -> Actor {
    Actor::admin("marie", Side::Museum)
}

fn exchange() -> Actor {
    Actor::admin("xavier", Side::Exchange)
}

fn setup() -> (Engine<MemoryStore>, Arc<MemoryStore>, Arc<FixedClock>) {
    setup_with(EngineConfig::default())
}

fn setup_with(config: EngineConfig) -> (Engine<MemoryStore>, Arc<MemoryStore>, Arc<FixedClock>) {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(T0));
    let engine = Engine::new(Arc::clone(&store), config).with_clock(clock.clone());
    (engine, store, clock)
}

fn new_request(direction: Direction, for_virtual_museum: bool) -> NewRequest {
    NewRequest {
        direction,
        artifact_ref: "artifact-a7".to_string(),
        museum_ref: "museum-rijks".to_string(),
        window: RentalWindow {
            start_date: T0 + Duration::days(10),
            end_date: T0 + Duration::days(40),
            requested_days: 30,
        },
        pricing: Pricing {
            total_amount: Decimal::new(120_000, 2),
            security_deposit: Decimal::new(30_000, 2),
            currency: "EUR".to_string(),
        },
        for_virtual_museum,
    }
}

/// Both approvals plus the custody path up to `Active`. Six transitions.
async fn advance_to_active(engine: &Engine<MemoryStore>, id: &str) {
    engine
        .decide(id, &museum(), Decision::Approve, "tok-m", None)
        .await
        .unwrap();
    engine
        .decide(id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    engine.mark_paid(id, &exchange(), "tok-paid").await.unwrap();
    engine.confirm(id, &museum(), "tok-confirm").await.unwrap();
    engine
        .mark_in_transit(id, &museum(), "tok-transit")
        .await
        .unwrap();
    engine
        .mark_active(id, &exchange(), "tok-active")
        .await
        .unwrap();
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_full_custody_path() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    assert_eq!(created.status, RequestStatus::PendingReview);
    assert_eq!(created.version, 0);
    assert!(created.audit_trail.is_empty());

    let first = engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-m", None)
        .await
        .unwrap();
    assert_eq!(first.request.status, RequestStatus::PendingReview);
    assert!(first.request.approvals.museum.is_approved());

    let second = engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    assert_eq!(second.request.status, RequestStatus::Approved);

    let paid = engine
        .mark_paid(&created.id, &exchange(), "tok-paid")
        .await
        .unwrap();
    assert_eq!(paid.request.status, RequestStatus::PaymentPending);

    let confirmed = engine
        .confirm(&created.id, &museum(), "tok-confirm")
        .await
        .unwrap();
    assert_eq!(confirmed.request.status, RequestStatus::Confirmed);

    let transit = engine
        .mark_in_transit(&created.id, &museum(), "tok-transit")
        .await
        .unwrap();
    assert_eq!(transit.request.status, RequestStatus::InTransit);

    let active = engine
        .mark_active(&created.id, &exchange(), "tok-active")
        .await
        .unwrap();
    assert_eq!(active.request.status, RequestStatus::Active);

    let done = engine
        .return_artifact(&created.id, &exchange(), "tok-return")
        .await
        .unwrap();
    assert_eq!(done.request.status, RequestStatus::Completed);
    assert_eq!(done.request.audit_trail.len(), 7);
    assert_eq!(done.request.version, 7);

    // Each entry chains from the previous one's landing status.
    let trail = &done.request.audit_trail;
    assert_eq!(trail[0].from_status, RequestStatus::PendingReview);
    assert_eq!(trail[0].to_status, RequestStatus::PendingReview);
    for pair in trail.windows(2) {
        assert_eq!(pair[0].to_status, pair[1].from_status);
    }
    assert_eq!(trail[6].to_status, RequestStatus::Completed);
}

#[tokio::test]
async fn scenario_b_digitization_branch() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, true))
        .await
        .unwrap();
    advance_to_active(&engine, &created.id).await;

    // Upload from Active walks the automatic start edge first.
    let uploaded = engine
        .upload_model(&created.id, "model-3d-a7", &exchange(), "tok-upload")
        .await
        .unwrap();
    assert_eq!(uploaded.request.status, RequestStatus::ModelUploaded);
    let trail = &uploaded.request.audit_trail;
    assert_eq!(trail[trail.len() - 2].action, "start_digitization");
    assert_eq!(
        trail[trail.len() - 2].to_status,
        RequestStatus::DigitizationInProgress
    );
    assert_eq!(trail[trail.len() - 1].action, "upload_model");
    let info = uploaded.request.model_info.as_ref().unwrap();
    assert_eq!(info.model_ref.as_deref(), Some("model-3d-a7"));
    assert_eq!(info.uploaded_by.as_deref(), Some("xavier"));
    assert!(info.approved_at.is_none());

    // The museum keeps final say over virtual publication.
    let err = engine
        .approve_model(&created.id, &exchange(), "tok-bad")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transition(TransitionError::InvalidTransition { .. })
    ));

    let ready = engine
        .approve_model(&created.id, &museum(), "tok-approve")
        .await
        .unwrap();
    assert_eq!(ready.request.status, RequestStatus::VirtualMuseumReady);
    let info = ready.request.model_info.as_ref().unwrap();
    assert_eq!(info.approved_by.as_deref(), Some("marie"));
    assert!(info.approved_at >= info.uploaded_at);

    let done = engine
        .return_artifact(&created.id, &exchange(), "tok-return")
        .await
        .unwrap();
    assert_eq!(done.request.status, RequestStatus::Completed);
}

#[tokio::test]
async fn model_rejection_loops_back_for_a_rescan() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, true))
        .await
        .unwrap();
    advance_to_active(&engine, &created.id).await;
    engine
        .upload_model(&created.id, "model-blurry", &exchange(), "tok-up1")
        .await
        .unwrap();

    let rejected = engine
        .reject_model(
            &created.id,
            &museum(),
            "tok-reject",
            Some("texture artifacts on the base".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.request.status, RequestStatus::DigitizationInProgress);
    let info = rejected.request.model_info.as_ref().unwrap();
    assert!(info.model_ref.is_none());
    assert!(info.uploaded_at.is_none());

    // Re-upload goes straight from DigitizationInProgress, no extra
    // automatic edge.
    let reuploaded = engine
        .upload_model(&created.id, "model-sharp", &exchange(), "tok-up2")
        .await
        .unwrap();
    assert_eq!(reuploaded.request.status, RequestStatus::ModelUploaded);
    assert_eq!(
        reuploaded.request.audit_trail.last().unwrap().action,
        "upload_model"
    );
}

#[tokio::test]
async fn scenario_c_rejection_short_circuits_review() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();

    let rejected = engine
        .decide(
            &created.id,
            &exchange(),
            Decision::Reject,
            "tok-reject",
            Some("insurance coverage insufficient".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.request.status, RequestStatus::Rejected);
    assert!(matches!(
        rejected.request.approvals.exchange,
        ApprovalSlot::Rejected { .. }
    ));
    assert_eq!(rejected.request.approvals.museum, ApprovalSlot::Skipped);

    let err = engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-late", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transition(TransitionError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn rejection_wins_over_a_prior_approval() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::ExchangeToMuseum, false))
        .await
        .unwrap();
    engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    let rejected = engine
        .decide(&created.id, &museum(), Decision::Reject, "tok-m", None)
        .await
        .unwrap();
    assert_eq!(rejected.request.status, RequestStatus::Rejected);
    assert!(rejected.request.approvals.exchange.is_approved());
}

// ──────────────────────────────────────────────
// Idempotency and concurrency
// ──────────────────────────────────────────────

#[tokio::test]
async fn token_replay_is_a_noop_returning_the_stored_record() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();

    let first = engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-1", None)
        .await
        .unwrap();
    assert!(!first.replayed);

    let replay = engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-1", None)
        .await
        .unwrap();
    assert!(replay.replayed);
    assert!(replay.notification.is_none());
    assert_eq!(replay.request, first.request);
    assert_eq!(replay.request.audit_trail.len(), 1);
    assert_eq!(replay.request.version, 1);
}

#[tokio::test]
async fn a_decided_slot_refuses_a_fresh_token() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-1", None)
        .await
        .unwrap();
    let err = engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-2", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transition(TransitionError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn stale_write_surfaces_concurrent_modification() {
    let (engine, store, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();

    // A second caller loads version 0, then loses the race.
    let stale = store.get(&created.id).await.unwrap();
    engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-1", None)
        .await
        .unwrap();

    let storage_err = store.update(stale.clone(), stale.version).await.unwrap_err();
    assert_eq!(
        EngineError::from(storage_err),
        EngineError::ConcurrentModification {
            id: created.id.clone()
        }
    );

    // The winner's record is intact.
    let loaded = store.get(&created.id).await.unwrap();
    assert_eq!(loaded.version, 1);
    assert!(loaded.approvals.museum.is_approved());
}

// ──────────────────────────────────────────────
// Digitization gating
// ──────────────────────────────────────────────

#[tokio::test]
async fn non_virtual_requests_reject_digitization_edges() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    advance_to_active(&engine, &created.id).await;

    let err = engine
        .upload_model(&created.id, "model-x", &exchange(), "tok-up")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transition(TransitionError::NotApplicable { .. })
    ));
    let err = engine
        .approve_model(&created.id, &museum(), "tok-ap")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Transition(TransitionError::NotApplicable { .. })
    ));
}

// ──────────────────────────────────────────────
// Overdue sweeps
// ──────────────────────────────────────────────

#[tokio::test]
async fn overdue_sweep_flags_elapsed_rentals_once() {
    let (engine, store, clock) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    advance_to_active(&engine, &created.id).await;

    // Still inside the window: nothing to do.
    let report = engine.sweep_overdue().await.unwrap();
    assert_eq!(report.scanned, 0);

    clock.set(T0 + Duration::days(41));
    let report = engine.sweep_overdue().await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.marked_overdue, 1);

    let flagged = store.get(&created.id).await.unwrap();
    assert_eq!(flagged.status, RequestStatus::Overdue);
    let last = flagged.audit_trail.last().unwrap();
    assert_eq!(last.action, "mark_overdue");
    assert_eq!(last.actor, "system");

    // Second pass: the record is no longer active, so nothing is scanned
    // and nothing changes.
    let report = engine.sweep_overdue().await.unwrap();
    assert_eq!(report, curio_engine::SweepReport::default());
    let unchanged = store.get(&created.id).await.unwrap();
    assert_eq!(unchanged, flagged);

    // A late return still closes the rental.
    let done = engine
        .return_artifact(&created.id, &exchange(), "tok-return")
        .await
        .unwrap();
    assert_eq!(done.request.status, RequestStatus::Completed);
}

#[tokio::test]
async fn dispute_freezes_an_overdue_rental() {
    let (engine, _, clock) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    advance_to_active(&engine, &created.id).await;
    clock.set(T0 + Duration::days(41));
    engine.sweep_overdue().await.unwrap();

    let disputed = engine
        .raise_dispute(
            &created.id,
            &museum(),
            "tok-dispute",
            Some("artifact not returned".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(disputed.request.status, RequestStatus::Dispute);

    // Terminal pending manual resolution: nothing moves it.
    let err = engine
        .return_artifact(&created.id, &exchange(), "tok-late")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}

// ──────────────────────────────────────────────
// Threshold, amendments, cancellation
// ──────────────────────────────────────────────

#[tokio::test]
async fn below_threshold_exchange_requests_approve_single_sided() {
    let config = EngineConfig {
        policy: TransitionPolicy {
            single_side_threshold: Some(Decimal::new(500_000, 2)),
        },
        ..EngineConfig::default()
    };
    let (engine, _, _) = setup_with(config);

    let created = engine
        .create_request(new_request(Direction::ExchangeToMuseum, false))
        .await
        .unwrap();
    let outcome = engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Approved);
    assert!(outcome.request.approvals.museum.is_pending());
}

#[tokio::test]
async fn museum_initiated_requests_always_need_both_sides() {
    let config = EngineConfig {
        policy: TransitionPolicy {
            single_side_threshold: Some(Decimal::new(500_000, 2)),
        },
        ..EngineConfig::default()
    };
    let (engine, _, _) = setup_with(config);

    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    let outcome = engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::PendingReview);
}

#[tokio::test]
async fn pricing_amendable_only_during_review() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();

    let new_pricing = Pricing {
        total_amount: Decimal::new(200_000, 2),
        security_deposit: Decimal::new(40_000, 2),
        currency: "EUR".to_string(),
    };
    let amended = engine
        .amend_pricing(&created.id, &new_pricing, &exchange(), "tok-price")
        .await
        .unwrap();
    assert_eq!(amended.request.status, RequestStatus::PendingReview);
    assert_eq!(amended.request.pricing, new_pricing);

    engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-m", None)
        .await
        .unwrap();
    engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    let err = engine
        .amend_pricing(&created.id, &new_pricing, &exchange(), "tok-late")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}

#[tokio::test]
async fn end_date_amendable_until_transit() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-m", None)
        .await
        .unwrap();
    engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();

    let extended = engine
        .amend_end_date(&created.id, T0 + Duration::days(55), &museum(), "tok-extend")
        .await
        .unwrap();
    assert_eq!(extended.request.window.end_date, T0 + Duration::days(55));
    assert_eq!(extended.request.window.requested_days, 45);

    // The counter-party may not move the window.
    let err = engine
        .amend_end_date(&created.id, T0 + Duration::days(60), &exchange(), "tok-x2")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));

    engine.mark_paid(&created.id, &exchange(), "tok-paid").await.unwrap();
    engine.confirm(&created.id, &museum(), "tok-confirm").await.unwrap();
    engine
        .mark_in_transit(&created.id, &museum(), "tok-transit")
        .await
        .unwrap();
    let err = engine
        .amend_end_date(&created.id, T0 + Duration::days(70), &museum(), "tok-late")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));
}

#[tokio::test]
async fn cancellation_belongs_to_the_requester_before_transit() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::ExchangeToMuseum, false))
        .await
        .unwrap();

    let err = engine
        .cancel(&created.id, &museum(), "tok-wrong", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transition(_)));

    let cancelled = engine
        .cancel(
            &created.id,
            &exchange(),
            "tok-cancel",
            Some("exhibit postponed".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.request.status, RequestStatus::Cancelled);
}

// ──────────────────────────────────────────────
// Creation validation and notifications
// ──────────────────────────────────────────────

#[tokio::test]
async fn creation_rejects_malformed_input() {
    let (engine, _, _) = setup();

    let mut inverted = new_request(Direction::MuseumToExchange, false);
    inverted.window.end_date = inverted.window.start_date - Duration::days(1);
    assert!(matches!(
        engine.create_request(inverted).await.unwrap_err(),
        EngineError::Validation(_)
    ));

    let mut negative = new_request(Direction::MuseumToExchange, false);
    negative.pricing.total_amount = Decimal::new(-100, 2);
    assert!(matches!(
        engine.create_request(negative).await.unwrap_err(),
        EngineError::Validation(_)
    ));

    let mut blank = new_request(Direction::MuseumToExchange, false);
    blank.artifact_ref = "  ".to_string();
    assert!(matches!(
        engine.create_request(blank).await.unwrap_err(),
        EngineError::Validation(_)
    ));
}

#[tokio::test]
async fn creation_checks_the_directory() {
    let store = Arc::new(MemoryStore::new());
    let directory = StaticDirectory::new()
        .with_artifact("artifact-a7")
        .with_museum("museum-rijks");
    let engine = Engine::new(store, EngineConfig::default())
        .with_clock(Arc::new(FixedClock::new(T0)))
        .with_directory(Arc::new(directory));

    assert!(engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .is_ok());

    let mut unknown = new_request(Direction::MuseumToExchange, false);
    unknown.artifact_ref = "artifact-unknown".to_string();
    assert!(matches!(
        engine.create_request(unknown).await.unwrap_err(),
        EngineError::Validation(_)
    ));
}

#[tokio::test]
async fn notifications_name_the_counter_party() {
    let (engine, _, _) = setup();
    let created = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();

    let outcome = engine
        .decide(&created.id, &museum(), Decision::Approve, "tok-m", None)
        .await
        .unwrap();
    let note = outcome.notification.unwrap();
    assert_eq!(note.recipient, Side::Exchange);
    assert_eq!(note.message_key, "rental.approval_recorded");

    let outcome = engine
        .decide(&created.id, &exchange(), Decision::Approve, "tok-x", None)
        .await
        .unwrap();
    let note = outcome.notification.unwrap();
    assert_eq!(note.recipient, Side::Museum);
    assert_eq!(note.message_key, "rental.approved");
}

// ──────────────────────────────────────────────
// Queries
// ──────────────────────────────────────────────

#[tokio::test]
async fn listing_and_statistics_reflect_lifecycle_state() {
    use curio_storage::{PageRequest, RequestFilter};

    let (engine, _, _) = setup();
    let first = engine
        .create_request(new_request(Direction::MuseumToExchange, false))
        .await
        .unwrap();
    engine
        .create_request(new_request(Direction::ExchangeToMuseum, false))
        .await
        .unwrap();
    engine
        .decide(&first.id, &exchange(), Decision::Reject, "tok-r", None)
        .await
        .unwrap();

    let rejected = engine
        .list(
            &RequestFilter {
                status: Some(RequestStatus::Rejected),
                ..RequestFilter::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.total, 1);
    assert_eq!(rejected.items[0].id, first.id);

    let stats = engine.statistics(None).await.unwrap();
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_value, Decimal::new(240_000, 2));
    let pending = stats
        .counts
        .iter()
        .find(|c| c.status == RequestStatus::PendingReview)
        .unwrap();
    assert_eq!(pending.count, 1);
}

// ──────────────────────────────────────────────
// Scanner supervision
// ──────────────────────────────────────────────

/// Backend whose every call fails, as if the database went away.
struct FaultyStore;

#[async_trait::async_trait]
impl RequestStore for FaultyStore {
    async fn insert(
        &self,
        _request: curio_core::RentalRequest,
    ) -> Result<(), curio_storage::StorageError> {
        Err(curio_storage::StorageError::Backend("connection lost".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<curio_core::RentalRequest, curio_storage::StorageError> {
        Err(curio_storage::StorageError::Backend("connection lost".to_string()))
    }

    async fn update(
        &self,
        _request: curio_core::RentalRequest,
        _expected_version: i64,
    ) -> Result<(), curio_storage::StorageError> {
        Err(curio_storage::StorageError::Backend("connection lost".to_string()))
    }

    async fn list(
        &self,
        _filter: &curio_storage::RequestFilter,
        _page: &curio_storage::PageRequest,
    ) -> Result<curio_storage::Page<curio_storage::RequestSummary>, curio_storage::StorageError>
    {
        Err(curio_storage::StorageError::Backend("connection lost".to_string()))
    }

    async fn list_active_ending_before(
        &self,
        _deadline: OffsetDateTime,
    ) -> Result<Vec<curio_core::RentalRequest>, curio_storage::StorageError> {
        Err(curio_storage::StorageError::Backend("connection lost".to_string()))
    }

    async fn statistics(
        &self,
        _range: Option<&curio_storage::TimeRange>,
    ) -> Result<curio_storage::Statistics, curio_storage::StorageError> {
        Err(curio_storage::StorageError::Backend("connection lost".to_string()))
    }
}

#[tokio::test]
async fn scanner_loop_surfaces_a_storage_fault() {
    let config = EngineConfig {
        scan_interval: std::time::Duration::from_millis(10),
        ..EngineConfig::default()
    };
    let engine = Arc::new(Engine::new(Arc::new(FaultyStore), config));

    // The loop must resolve with the fault rather than spin forever, so the
    // caller can take the process down.
    let err = curio_engine::run_scanner(engine).await.unwrap_err();
    assert!(matches!(err, EngineError::Storage(_)));
}

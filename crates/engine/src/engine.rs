//! The engine: load → token check → validate → apply effects → CAS write →
//! notify. One record per operation, no cross-record writes, no lock held
//! across anything external.

use std::sync::Arc;

use curio_core::{
    transition, Actor, ApprovalChain, AuditEntry, Decision, Direction, ModelInfo, Pricing,
    RentalRequest, RentalWindow, RequestAction, RequestStatus,
};
use curio_storage::{
    Page, PageRequest, RequestFilter, RequestStore, RequestSummary, Statistics, TimeRange,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::approval;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::digitization;
use crate::directory::{DirectoryResolver, PermissiveDirectory};
use crate::emitter::{self, Notification};
use crate::error::EngineError;

// ──────────────────────────────────────────────
// Inputs and outputs
// ──────────────────────────────────────────────

/// Input to [`Engine::create_request`].
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub direction: Direction,
    pub artifact_ref: String,
    pub museum_ref: String,
    pub window: RentalWindow,
    pub pricing: Pricing,
    pub for_virtual_museum: bool,
}

/// What a mutating operation hands back: the updated record, the
/// notification the host should dispatch, and whether this call was an
/// idempotent replay (in which case there is nothing new to dispatch).
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub request: RentalRequest,
    pub notification: Option<Notification>,
    pub replayed: bool,
}

/// Action-specific payload threaded into the effect application.
pub(crate) enum ActionInput<'a> {
    None,
    Model(&'a str),
    EndDate(OffsetDateTime),
    Pricing(&'a Pricing),
}

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

/// The rental lifecycle engine over a storage backend.
pub struct Engine<S> {
    pub(crate) store: Arc<S>,
    pub(crate) clock: Arc<dyn Clock>,
    directory: Arc<dyn DirectoryResolver>,
    pub(crate) config: EngineConfig,
}

impl<S: RequestStore> Engine<S> {
    /// Engine with the system clock and a permissive directory; hosts swap
    /// both in via the builder methods.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            directory: Arc::new(PermissiveDirectory),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn DirectoryResolver>) -> Self {
        self.directory = directory;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Creation ─────────────────────────────────────────────────────────

    /// Create a request in `PendingReview` at version 0. Creation is not a
    /// transition: the audit trail starts empty.
    pub async fn create_request(&self, input: NewRequest) -> Result<RentalRequest, EngineError> {
        if input.artifact_ref.trim().is_empty() {
            return Err(EngineError::Validation("artifact reference is blank".to_string()));
        }
        if input.museum_ref.trim().is_empty() {
            return Err(EngineError::Validation("museum reference is blank".to_string()));
        }
        validate_window(&input.window)?;
        validate_pricing(&input.pricing)?;
        if !self.directory.artifact_exists(&input.artifact_ref) {
            return Err(EngineError::Validation(format!(
                "unknown artifact: {}",
                input.artifact_ref
            )));
        }
        if !self.directory.museum_exists(&input.museum_ref) {
            return Err(EngineError::Validation(format!(
                "unknown museum: {}",
                input.museum_ref
            )));
        }

        let request = RentalRequest {
            id: new_request_id(),
            direction: input.direction,
            artifact_ref: input.artifact_ref,
            museum_ref: input.museum_ref,
            for_virtual_museum: input.for_virtual_museum,
            status: RequestStatus::PendingReview,
            window: input.window,
            pricing: input.pricing,
            approvals: ApprovalChain::new(),
            model_info: input.for_virtual_museum.then(ModelInfo::default),
            audit_trail: vec![],
            created_at: self.clock.now(),
            version: 0,
        };
        self.store.insert(request.clone()).await?;
        tracing::info!(request = %request.id, direction = %request.direction, "rental request created");
        Ok(request)
    }

    // ── Review ───────────────────────────────────────────────────────────

    /// Record one side's approval or rejection. The deciding side is the
    /// caller's own; nobody writes the other side's slot.
    pub async fn decide(
        &self,
        id: &str,
        actor: &Actor,
        decision: Decision,
        token: &str,
        comment: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        let side = actor.side().ok_or_else(|| {
            EngineError::Validation("decisions require an administrator caller".to_string())
        })?;
        self.transition(
            id,
            RequestAction::Decide { side, decision },
            actor,
            token,
            comment,
            ActionInput::None,
        )
        .await
    }

    // ── Custody path ─────────────────────────────────────────────────────

    pub async fn mark_paid(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::MarkPaid, actor, token, None, ActionInput::None)
            .await
    }

    pub async fn confirm(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::Confirm, actor, token, None, ActionInput::None)
            .await
    }

    pub async fn mark_in_transit(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::MarkInTransit, actor, token, None, ActionInput::None)
            .await
    }

    pub async fn mark_active(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::MarkActive, actor, token, None, ActionInput::None)
            .await
    }

    /// Physical return of the artifact; closes the rental.
    pub async fn return_artifact(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::Return, actor, token, None, ActionInput::None)
            .await
    }

    // ── Escapes ──────────────────────────────────────────────────────────

    pub async fn cancel(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::Cancel, actor, token, reason, ActionInput::None)
            .await
    }

    pub async fn raise_dispute(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::RaiseDispute, actor, token, reason, ActionInput::None)
            .await
    }

    // ── Digitization ─────────────────────────────────────────────────────

    /// Register a scanned model. From `Active` this first walks the
    /// automatic edge into `DigitizationInProgress`, then uploads — two
    /// transitions, two audit entries, one atomic write.
    pub async fn upload_model(
        &self,
        id: &str,
        model_ref: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(
            id,
            RequestAction::UploadModel,
            actor,
            token,
            None,
            ActionInput::Model(model_ref),
        )
        .await
    }

    pub async fn approve_model(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::ApproveModel, actor, token, None, ActionInput::None)
            .await
    }

    pub async fn reject_model(
        &self,
        id: &str,
        actor: &Actor,
        token: &str,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(id, RequestAction::RejectModel, actor, token, reason, ActionInput::None)
            .await
    }

    // ── Amendments ───────────────────────────────────────────────────────

    pub async fn amend_end_date(
        &self,
        id: &str,
        new_end_date: OffsetDateTime,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(
            id,
            RequestAction::AmendEndDate,
            actor,
            token,
            None,
            ActionInput::EndDate(new_end_date),
        )
        .await
    }

    pub async fn amend_pricing(
        &self,
        id: &str,
        pricing: &Pricing,
        actor: &Actor,
        token: &str,
    ) -> Result<TransitionOutcome, EngineError> {
        self.transition(
            id,
            RequestAction::AmendPricing,
            actor,
            token,
            None,
            ActionInput::Pricing(pricing),
        )
        .await
    }

    // ── Reads ────────────────────────────────────────────────────────────

    pub async fn get_request(&self, id: &str) -> Result<RentalRequest, EngineError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list(
        &self,
        filter: &RequestFilter,
        page: &PageRequest,
    ) -> Result<Page<RequestSummary>, EngineError> {
        let page = PageRequest {
            page: page.page.max(1),
            page_size: page.page_size.clamp(1, self.config.max_page_size),
        };
        Ok(self.store.list(filter, &page).await?)
    }

    pub async fn statistics(
        &self,
        range: Option<&TimeRange>,
    ) -> Result<Statistics, EngineError> {
        Ok(self.store.statistics(range).await?)
    }

    // ── Shared transition path ───────────────────────────────────────────

    pub(crate) async fn transition(
        &self,
        id: &str,
        action: RequestAction,
        caller: &Actor,
        token: &str,
        comment: Option<String>,
        input: ActionInput<'_>,
    ) -> Result<TransitionOutcome, EngineError> {
        if token.trim().is_empty() {
            return Err(EngineError::Validation("action token is blank".to_string()));
        }

        let stored = self.store.get(id).await?;
        if stored.has_token(token) {
            tracing::debug!(request = %stored.id, token, "idempotent replay, returning stored record");
            return Ok(TransitionOutcome {
                request: stored,
                notification: None,
                replayed: true,
            });
        }

        let now = self.clock.now();
        let mut next = stored.clone();

        // uploadModel out of Active enters the digitization sub-workflow
        // through the automatic edge first.
        if matches!(action, RequestAction::UploadModel)
            && next.status == RequestStatus::Active
            && next.for_virtual_museum
        {
            let start = RequestAction::StartDigitization;
            let to = transition::validate(&next, &start, &Actor::System, &self.config.policy)?;
            record(&mut next, to, &Actor::System, &start, &format!("digitize:{id}"), now, None);
        }

        let to = transition::validate(&next, &action, caller, &self.config.policy)?;
        apply_effects(&mut next, &action, caller, now, &input, comment.clone())?;
        record(&mut next, to, caller, &action, token, now, comment);

        self.store.update(next.clone(), stored.version).await?;

        let notification = emitter::notification(&next, &action, caller);
        tracing::info!(
            request = %next.id,
            action = action.name(),
            from = %stored.status,
            to = %next.status,
            version = next.version,
            "transition applied"
        );
        Ok(TransitionOutcome {
            request: next,
            notification: Some(notification),
            replayed: false,
        })
    }
}

// ──────────────────────────────────────────────
// Effects and helpers
// ──────────────────────────────────────────────

/// Append the audit entry, move the status, bump the version. The one place
/// a record advances.
fn record(
    next: &mut RentalRequest,
    to: RequestStatus,
    caller: &Actor,
    action: &RequestAction,
    token: &str,
    now: OffsetDateTime,
    comment: Option<String>,
) {
    next.audit_trail.push(AuditEntry {
        from_status: next.status,
        to_status: to,
        actor: caller.audit_id().to_string(),
        action: action.name().to_string(),
        action_token: token.to_string(),
        recorded_at: now,
        comment,
    });
    next.status = to;
    next.version += 1;
}

fn apply_effects(
    next: &mut RentalRequest,
    action: &RequestAction,
    caller: &Actor,
    now: OffsetDateTime,
    input: &ActionInput<'_>,
    comment: Option<String>,
) -> Result<(), EngineError> {
    match action {
        RequestAction::Decide { side, decision } => {
            approval::record(next, *side, *decision, caller.audit_id(), now, comment);
        }
        RequestAction::UploadModel => {
            let ActionInput::Model(model_ref) = input else {
                return Err(EngineError::Validation("model reference required".to_string()));
            };
            digitization::record_upload(next, model_ref, caller.audit_id(), now)?;
        }
        RequestAction::ApproveModel => {
            digitization::record_approval(next, caller.audit_id(), now)?;
        }
        RequestAction::RejectModel => {
            digitization::record_rejection(next);
        }
        RequestAction::AmendEndDate => {
            let ActionInput::EndDate(end_date) = input else {
                return Err(EngineError::Validation("end date required".to_string()));
            };
            let amended = RentalWindow {
                start_date: next.window.start_date,
                end_date: *end_date,
                requested_days: days_between(next.window.start_date, *end_date),
            };
            validate_window(&amended)?;
            next.window = amended;
        }
        RequestAction::AmendPricing => {
            let ActionInput::Pricing(pricing) = input else {
                return Err(EngineError::Validation("pricing required".to_string()));
            };
            validate_pricing(pricing)?;
            next.pricing = (*pricing).clone();
        }
        // Pure status moves.
        RequestAction::MarkPaid
        | RequestAction::Confirm
        | RequestAction::MarkInTransit
        | RequestAction::MarkActive
        | RequestAction::Return
        | RequestAction::Cancel
        | RequestAction::RaiseDispute
        | RequestAction::StartDigitization
        | RequestAction::MarkOverdue => {}
    }
    Ok(())
}

fn validate_window(window: &RentalWindow) -> Result<(), EngineError> {
    if window.end_date <= window.start_date {
        return Err(EngineError::Validation(
            "end date must fall after start date".to_string(),
        ));
    }
    if window.requested_days == 0 {
        return Err(EngineError::Validation(
            "requested days must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_pricing(pricing: &Pricing) -> Result<(), EngineError> {
    if pricing.total_amount < Decimal::ZERO {
        return Err(EngineError::Validation("total amount is negative".to_string()));
    }
    if pricing.security_deposit < Decimal::ZERO {
        return Err(EngineError::Validation("security deposit is negative".to_string()));
    }
    if pricing.currency.trim().is_empty() {
        return Err(EngineError::Validation("currency is blank".to_string()));
    }
    Ok(())
}

fn days_between(start: OffsetDateTime, end: OffsetDateTime) -> u32 {
    let days = (end - start).whole_days();
    u32::try_from(days).unwrap_or(0).max(1)
}

fn new_request_id() -> String {
    format!("req-{:016x}", rand::random::<u64>())
}

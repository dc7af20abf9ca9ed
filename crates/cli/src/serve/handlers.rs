//! HTTP route handlers for the rental lifecycle API.
//!
//! Mutating routes identify the caller through two headers: `X-Curio-Actor`
//! (administrator id) and `X-Curio-Role` (`museum` or `exchange`). Engine
//! outcomes map onto status codes: unknown id 404, version conflict 409,
//! refused edge or malformed input 422.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use curio_core::{
    Actor, Decision, Direction, Pricing, RentalRequest, RentalWindow, RequestStatus, Side,
};
use curio_engine::{EngineError, Notification, NewRequest, TransitionOutcome};
use curio_storage::{PageRequest, RequestFilter, RequestStore, TimeRange};

use super::json_error;
use super::state::AppState;

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct CreateRequestBody {
    direction: Direction,
    artifact_ref: String,
    museum_ref: String,
    #[serde(with = "time::serde::rfc3339")]
    start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end_date: OffsetDateTime,
    requested_days: Option<u32>,
    pricing: Pricing,
    #[serde(default)]
    for_virtual_museum: bool,
}

#[derive(Deserialize)]
pub(crate) struct DecisionBody {
    decision: Decision,
    token: String,
    comment: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct TransitionBody {
    #[serde(flatten)]
    kind: TransitionKind,
    token: String,
    comment: Option<String>,
}

/// Custody and escape edges reachable over HTTP. Review and digitization
/// decisions have dedicated routes; the scanner owns `mark_overdue`.
#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum TransitionKind {
    MarkPaid,
    Confirm,
    MarkInTransit,
    MarkActive,
    Return,
    Cancel,
    RaiseDispute,
    AmendEndDate {
        #[serde(with = "time::serde::rfc3339")]
        new_end_date: OffsetDateTime,
    },
    AmendPricing {
        pricing: Pricing,
    },
}

#[derive(Deserialize)]
pub(crate) struct ModelUploadBody {
    model_ref: String,
    token: String,
}

#[derive(Deserialize)]
pub(crate) struct ListQuery {
    status: Option<RequestStatus>,
    direction: Option<Direction>,
    museum: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Deserialize)]
pub(crate) struct StatisticsQuery {
    #[serde(default, with = "time::serde::rfc3339::option")]
    from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    to: Option<OffsetDateTime>,
}

#[derive(Serialize)]
struct OutcomeBody {
    request: RentalRequest,
    notification: Option<Notification>,
    replayed: bool,
}

impl From<TransitionOutcome> for OutcomeBody {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            request: outcome.request,
            notification: outcome.notification,
            replayed: outcome.replayed,
        }
    }
}

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let id = headers
        .get("x-curio-actor")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let role = headers.get("x-curio-role").and_then(|v| v.to_str().ok());

    let (Some(id), Some(role)) = (id, role) else {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "X-Curio-Actor and X-Curio-Role headers are required",
        )
        .into_response());
    };
    let side = match role {
        "museum" => Side::Museum,
        "exchange" => Side::Exchange,
        _ => {
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                "X-Curio-Role must be 'museum' or 'exchange'",
            )
            .into_response())
        }
    };
    Ok(Actor::admin(id, side))
}

fn engine_error(err: EngineError) -> Response {
    let status = match &err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        EngineError::Transition(_) | EngineError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, &err.to_string()).into_response()
}

fn outcome_response(result: Result<TransitionOutcome, EngineError>) -> Response {
    match result {
        Ok(outcome) => (StatusCode::OK, Json(OutcomeBody::from(outcome))).into_response(),
        Err(e) => engine_error(e),
    }
}

// ──────────────────────────────────────────────
// Routes
// ──────────────────────────────────────────────

pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// POST /requests
pub(crate) async fn handle_create<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<CreateRequestBody>,
) -> Response {
    let requested_days = body.requested_days.unwrap_or_else(|| {
        let days = (body.end_date - body.start_date).whole_days();
        u32::try_from(days).unwrap_or(0).max(1)
    });
    let input = NewRequest {
        direction: body.direction,
        artifact_ref: body.artifact_ref,
        museum_ref: body.museum_ref,
        window: RentalWindow {
            start_date: body.start_date,
            end_date: body.end_date,
            requested_days,
        },
        pricing: body.pricing,
        for_virtual_museum: body.for_virtual_museum,
    };
    match state.engine.create_request(input).await {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(e) => engine_error(e),
    }
}

/// GET /requests
pub(crate) async fn handle_list<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let filter = RequestFilter {
        status: query.status,
        direction: query.direction,
        museum_ref: query.museum,
    };
    let mut page = PageRequest::default();
    if let Some(p) = query.page {
        page.page = p;
    }
    if let Some(size) = query.page_size {
        page.page_size = size;
    }
    match state.engine.list(&filter, &page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => engine_error(e),
    }
}

/// GET /requests/{id}
pub(crate) async fn handle_get<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Response {
    match state.engine.get_request(&id).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => engine_error(e),
    }
}

/// POST /requests/{id}/decision
pub(crate) async fn handle_decision<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DecisionBody>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    outcome_response(
        state
            .engine
            .decide(&id, &actor, body.decision, &body.token, body.comment)
            .await,
    )
}

/// POST /requests/{id}/transition
pub(crate) async fn handle_transition<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<TransitionBody>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let engine = &state.engine;
    let token = &body.token;
    let result = match body.kind {
        TransitionKind::MarkPaid => engine.mark_paid(&id, &actor, token).await,
        TransitionKind::Confirm => engine.confirm(&id, &actor, token).await,
        TransitionKind::MarkInTransit => engine.mark_in_transit(&id, &actor, token).await,
        TransitionKind::MarkActive => engine.mark_active(&id, &actor, token).await,
        TransitionKind::Return => engine.return_artifact(&id, &actor, token).await,
        TransitionKind::Cancel => engine.cancel(&id, &actor, token, body.comment).await,
        TransitionKind::RaiseDispute => {
            engine.raise_dispute(&id, &actor, token, body.comment).await
        }
        TransitionKind::AmendEndDate { new_end_date } => {
            engine.amend_end_date(&id, new_end_date, &actor, token).await
        }
        TransitionKind::AmendPricing { pricing } => {
            engine.amend_pricing(&id, &pricing, &actor, token).await
        }
    };
    outcome_response(result)
}

/// POST /requests/{id}/model
pub(crate) async fn handle_model_upload<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ModelUploadBody>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    outcome_response(
        state
            .engine
            .upload_model(&id, &body.model_ref, &actor, &body.token)
            .await,
    )
}

/// POST /requests/{id}/model/decision
pub(crate) async fn handle_model_decision<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DecisionBody>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let result = match body.decision {
        Decision::Approve => state.engine.approve_model(&id, &actor, &body.token).await,
        Decision::Reject => {
            state
                .engine
                .reject_model(&id, &actor, &body.token, body.comment)
                .await
        }
    };
    outcome_response(result)
}

/// GET /statistics
pub(crate) async fn handle_statistics<S: RequestStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<StatisticsQuery>,
) -> Response {
    let range = match (query.from, query.to) {
        (None, None) => None,
        (Some(from), Some(to)) => Some(TimeRange { from, to }),
        _ => {
            return json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "'from' and 'to' must be given together",
            )
            .into_response()
        }
    };
    match state.engine.statistics(range.as_ref()).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => engine_error(e),
    }
}

//! `curio serve` -- HTTP JSON API for the rental lifecycle engine.
//!
//! Exposes the engine over `axum` + `tokio` with concurrent request
//! handling. A background task runs the overdue scanner on the configured
//! interval; a fatal scanner error takes the server down so the host
//! restarts the process.
//!
//! Security:
//! - CORS headers on all responses (permissive for local dev)
//! - Optional API key authentication via CURIO_API_KEY env var
//!
//! Endpoints:
//! - GET  /health                          - Server status (exempt from auth)
//! - POST /requests                        - Create a rental request
//! - GET  /requests                        - List requests (filter + paginate)
//! - GET  /requests/{id}                   - Fetch one request with its trail
//! - POST /requests/{id}/decision          - Record a side's approve/reject
//! - POST /requests/{id}/transition        - Custody, escape, amendment edges
//! - POST /requests/{id}/model             - Upload a digitized model
//! - POST /requests/{id}/model/decision    - Museum review of the model
//! - GET  /statistics                      - Aggregate counts and value
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod middleware;
mod state;

use std::future::IntoFuture;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use curio_engine::{run_scanner, Engine, EngineConfig};
use curio_storage::{MemoryStore, RequestStore};

use self::handlers::{
    handle_create, handle_decision, handle_get, handle_health, handle_list, handle_model_decision,
    handle_model_upload, handle_not_found, handle_statistics, handle_transition,
};
use self::middleware::auth_middleware;
use self::state::AppState;

/// Maximum request body size: 1 MB. Lifecycle payloads are small.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// The full route table with auth, CORS, and body limits.
fn app<S: RequestStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/requests", post(handle_create).get(handle_list))
        .route("/requests/{id}", get(handle_get))
        .route("/requests/{id}/decision", post(handle_decision))
        .route("/requests/{id}/transition", post(handle_transition))
        .route("/requests/{id}/model", post(handle_model_upload))
        .route("/requests/{id}/model/decision", post(handle_model_decision))
        .route("/statistics", get(handle_statistics))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server on the given port with an in-memory backend, and
/// run the overdue scanner alongside it.
///
/// The scanner task only resolves on a fatal storage fault; when that
/// happens the server returns the error instead of serving on without
/// overdue detection.
pub(crate) async fn start_server(
    port: u16,
    config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let engine = Arc::new(Engine::new(store, config));

    let api_key = std::env::var("CURIO_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }

    let state = Arc::new(AppState {
        engine: Arc::clone(&engine),
        api_key,
    });

    let mut scanner = tokio::spawn(run_scanner(Arc::clone(&engine)));

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("curio listening on http://{addr}");
    let server = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        served = server => {
            scanner.abort();
            served?;
            tracing::info!("server shut down");
            Ok(())
        }
        joined = &mut scanner => {
            let message = match joined {
                Ok(Err(e)) => e.to_string(),
                Ok(Ok(())) => "overdue scanner loop ended unexpectedly".to_string(),
                Err(e) => e.to_string(),
            };
            tracing::error!(error = %message, "overdue scanner failed, shutting down");
            Err(message.into())
        }
    }
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

//! Application state shared across request handlers.

use std::sync::Arc;

use curio_engine::Engine;
use curio_storage::RequestStore;

/// State shared across request handlers, generic over the storage backend so
/// tests can swap in instrumented stores.
pub(crate) struct AppState<S: RequestStore> {
    pub(crate) engine: Arc<Engine<S>>,
    /// Optional API key. None = no auth required.
    pub(crate) api_key: Option<String>,
}

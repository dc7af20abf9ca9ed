//! Overdue/expiry scanner.
//!
//! A stateless periodic sweep over active requests whose rental window has
//! elapsed. Each hit goes through the ordinary transition path, so the audit
//! trail and version bump look exactly like a manual action, and a second
//! scanner instance racing on the same record loses the version check (or
//! replays the derived token) and moves on.

use std::sync::Arc;

use curio_core::{Actor, RequestAction};
use curio_storage::RequestStore;

use crate::engine::{ActionInput, Engine};
use crate::error::EngineError;

/// Outcome of one sweep pass. `scanned = marked_overdue + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub marked_overdue: usize,
    pub skipped: usize,
}

impl<S: RequestStore> Engine<S> {
    /// One sweep pass: flag every active request whose `end_date` lies in
    /// the past.
    ///
    /// Per-record failures (a concurrent return, another scanner winning the
    /// race) are logged and skipped; only a storage fault aborts the sweep.
    pub async fn sweep_overdue(&self) -> Result<SweepReport, EngineError> {
        let now = self.clock.now();
        let due = self.store.list_active_ending_before(now).await?;

        let mut report = SweepReport {
            scanned: due.len(),
            ..SweepReport::default()
        };
        for request in due {
            // Derived token: a redundant sweep replays instead of re-applying.
            let token = format!(
                "overdue:{}:{}",
                request.id,
                request.window.end_date.unix_timestamp()
            );
            match self
                .transition(
                    &request.id,
                    RequestAction::MarkOverdue,
                    &Actor::System,
                    &token,
                    None,
                    ActionInput::None,
                )
                .await
            {
                Ok(outcome) if outcome.replayed => report.skipped += 1,
                Ok(_) => report.marked_overdue += 1,
                Err(
                    EngineError::Transition(_)
                    | EngineError::ConcurrentModification { .. }
                    | EngineError::NotFound { .. },
                ) => {
                    tracing::warn!(request = %request.id, "overdue sweep skipped record");
                    report.skipped += 1;
                }
                Err(fatal) => return Err(fatal),
            }
        }
        tracing::info!(
            scanned = report.scanned,
            marked_overdue = report.marked_overdue,
            skipped = report.skipped,
            "overdue sweep complete"
        );
        Ok(report)
    }
}

/// Run sweeps forever on the engine's configured interval. Returns only on a
/// fatal storage error; the host is expected to restart the process.
pub async fn run_scanner<S: RequestStore>(engine: Arc<Engine<S>>) -> Result<(), EngineError> {
    let mut ticker = tokio::time::interval(engine.config().scan_interval);
    loop {
        ticker.tick().await;
        engine.sweep_overdue().await?;
    }
}

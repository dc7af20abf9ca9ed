use curio_core::TransitionPolicy;
use std::time::Duration;

/// Engine configuration. All values are host-supplied; nothing here is
/// derived from request data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Validator policy, including the single-side approval threshold.
    pub policy: TransitionPolicy,
    /// Overdue sweep interval for [`crate::run_scanner`].
    pub scan_interval: Duration,
    /// Hard cap on `page_size` for listing calls.
    pub max_page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: TransitionPolicy::default(),
            scan_interval: Duration::from_secs(24 * 60 * 60),
            max_page_size: 200,
        }
    }
}

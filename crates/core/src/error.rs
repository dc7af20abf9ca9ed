use crate::request::RequestStatus;

/// Rejections produced by the transition validator.
///
/// Both variants are recoverable: the caller picked an action the current
/// status (or their role) does not allow, and can choose another. Neither
/// touches the stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The (status, action, role) triple is not an edge of the state machine.
    #[error("invalid transition: '{action}' is not legal from status '{from}' for this caller")]
    InvalidTransition {
        from: RequestStatus,
        action: &'static str,
    },

    /// A digitization edge was attempted on a request that was not flagged
    /// for the virtual museum at creation.
    #[error("not applicable: '{action}' requires a virtual-museum request")]
    NotApplicable { action: &'static str },
}

//! Digitization sub-workflow effects: progressive population of `model_info`.
//!
//! The invariant protected here: `approved_at` is only ever written after
//! `uploaded_at`, and a model rejection clears the upload fields so a fresh
//! scan repopulates them.

use curio_core::{ModelInfo, RentalRequest};
use time::OffsetDateTime;

use crate::error::EngineError;

pub(crate) fn record_upload(
    request: &mut RentalRequest,
    model_ref: &str,
    actor: &str,
    now: OffsetDateTime,
) -> Result<(), EngineError> {
    if model_ref.trim().is_empty() {
        return Err(EngineError::Validation("model reference is blank".to_string()));
    }
    let info = request.model_info.get_or_insert_with(ModelInfo::default);
    info.model_ref = Some(model_ref.to_string());
    info.uploaded_by = Some(actor.to_string());
    info.uploaded_at = Some(now);
    info.approved_by = None;
    info.approved_at = None;
    Ok(())
}

pub(crate) fn record_approval(
    request: &mut RentalRequest,
    actor: &str,
    now: OffsetDateTime,
) -> Result<(), EngineError> {
    let info = request
        .model_info
        .as_mut()
        .filter(|info| info.uploaded_at.is_some())
        .ok_or_else(|| {
            EngineError::Validation("cannot approve a model that was never uploaded".to_string())
        })?;
    info.approved_by = Some(actor.to_string());
    info.approved_at = Some(now);
    Ok(())
}

pub(crate) fn record_rejection(request: &mut RentalRequest) {
    if let Some(info) = request.model_info.as_mut() {
        *info = ModelInfo::default();
    }
}

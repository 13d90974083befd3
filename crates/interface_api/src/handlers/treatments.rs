//! Hospital treatment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{Identity, TreatmentId};

use crate::dto::treatments::{SubmitTreatmentRequest, TreatmentDetailsRequest, TreatmentResponse};
use crate::{error::ApiError, AppState};

/// Hospital records a treatment against a policy number
///
/// Managers of several hospitals name the hospital; otherwise their
/// lowest-id hospital is used.
pub async fn submit_treatment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<SubmitTreatmentRequest>,
) -> Result<(StatusCode, Json<TreatmentResponse>), ApiError> {
    request.validate()?;
    let record = state
        .engine
        .submit_treatment(&identity, request.hospital_id, &request.policy_number, request.treatment.into())
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Hospital edits one of its own treatment records
pub async fn update_treatment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<TreatmentId>,
    Json(request): Json<TreatmentDetailsRequest>,
) -> Result<Json<TreatmentResponse>, ApiError> {
    request.validate()?;
    let record = state
        .engine
        .update_treatment(&identity, id, request.into())
        .await?;
    Ok(Json(record.into()))
}

/// Treatment records visible to the caller, newest first
pub async fn list_treatments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<TreatmentResponse>>, ApiError> {
    let records = state.engine.list_treatments(&identity).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

//! Policy lifecycle handlers: enrollment, renewal and suspension

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use core_kernel::{Identity, PolicyId};

use crate::dto::policies::{EnrollPolicyRequest, PolicyResponse};
use crate::{error::ApiError, AppState};

/// Agent enrolls a customer; the policy is unpaid until the first premium
pub async fn enroll_policy(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<EnrollPolicyRequest>,
) -> Result<(StatusCode, Json<PolicyResponse>), ApiError> {
    let policy = state.engine.enroll_policy(&identity, request.into()).await?;
    Ok((StatusCode::CREATED, Json(policy.into())))
}

pub async fn renew_policy(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(policy_id): Path<PolicyId>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let policy = state.engine.renew_policy(&identity, policy_id).await?;
    Ok(Json(policy.into()))
}

pub async fn toggle_policy_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(policy_id): Path<PolicyId>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let policy = state.engine.toggle_policy_status(&identity, policy_id).await?;
    Ok(Json(policy.into()))
}

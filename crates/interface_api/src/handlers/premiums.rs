//! Premium payment handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{Identity, PolicyId};

use crate::dto::premiums::{PayPremiumRequest, PaymentResponse};
use crate::{error::ApiError, AppState};

/// Records the premium payment that makes a policy claimable
pub async fn pay_premium(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(policy_id): Path<PolicyId>,
    Json(request): Json<PayPremiumRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    request.validate()?;
    let payment = state
        .engine
        .pay_premium(&identity, policy_id, request.amount, request.payment_method)
        .await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}

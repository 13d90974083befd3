//! Claims handlers
//!
//! Thin adapters over [`domain_claims::ClaimsEngine`]: validate the body, hand the
//! verified identity and typed inputs to the engine, map the result.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ClaimId, Identity};
use domain_claims::ClaimListQuery;

use crate::dto::claims::*;
use crate::dto::treatments::TreatmentDetailsRequest;
use crate::{error::ApiError, AppState};

/// Customer opens a claim before the hospital has entered treatment details
pub async fn initiate_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<InitiateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let claim = state
        .engine
        .initiate_claim(&identity, request.policy_id, request.hospital_id, request.description)
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Customer submits a claim directly against an existing treatment record
pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<SubmitClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let claim = state
        .engine
        .submit_claim(&identity, request.policy_id, request.treatment_id, request.claim_amount)
        .await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Hospital manager records treatment details on an initiated claim
pub async fn hospital_update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
    Json(request): Json<TreatmentDetailsRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    request.validate()?;
    let claim = state
        .engine
        .hospital_update(&identity, id, request.into())
        .await?;
    Ok(Json(claim.into()))
}

/// Customer binds a policy and sends the claim for review
pub async fn finalize_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
    Json(request): Json<FinalizeClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .engine
        .finalize_claim(&identity, id, request.policy_id)
        .await?;
    Ok(Json(claim.into()))
}

/// Claims officer picks up a submitted claim
pub async fn begin_review(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.engine.begin_review(&identity, id).await?;
    Ok(Json(claim.into()))
}

/// Claims officer approves (and settles) or rejects a claim
pub async fn review_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
    Json(request): Json<ReviewClaimRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    request.validate()?;
    let outcome = state
        .engine
        .review_claim(&identity, id, request.into())
        .await?;
    Ok(Json(outcome.into()))
}

/// Deletes a claim together with any payout recorded against it
pub async fn delete_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
) -> Result<Json<DeleteClaimResponse>, ApiError> {
    let payments_removed = state.engine.delete_claim(&identity, id).await?;
    Ok(Json(DeleteClaimResponse {
        claim_id: id,
        payments_removed,
    }))
}

pub async fn update_description(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
    Json(request): Json<UpdateDescriptionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    request.validate()?;
    let claim = state
        .engine
        .update_description(&identity, id, request.description)
        .await?;
    Ok(Json(claim.into()))
}

/// Gets a claim visible to the caller
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<ClaimId>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.engine.get_claim(&identity, id).await?;
    Ok(Json(claim.into()))
}

/// Lists claims visible to the caller
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListClaimsParams>,
) -> Result<Json<ClaimPageResponse>, ApiError> {
    let query = ClaimListQuery::try_from(params)?;
    let page = state.engine.list_claims(&identity, &query).await?;
    Ok(Json(page.into()))
}

//! Claims DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ClaimId, HospitalId, PolicyId, TreatmentId, UserId};
use domain_claims::{
    Claim, ClaimListQuery, ClaimSortField, ClaimStatus, Page, ReviewDecision, ReviewOutcome,
    SortDirection,
};

use crate::error::ApiError;
use super::premiums::PaymentResponse;
use super::{not_blank, positive_amount};

#[derive(Debug, Deserialize, Validate)]
pub struct InitiateClaimRequest {
    pub policy_id: PolicyId,
    pub hospital_id: HospitalId,
    #[validate(length(max = 2000), custom(function = "not_blank"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeClaimRequest {
    pub policy_id: PolicyId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitClaimRequest {
    pub policy_id: PolicyId,
    pub treatment_id: TreatmentId,
    #[validate(custom(function = "positive_amount"))]
    pub claim_amount: Decimal,
}

/// Officer review form; amount and reason are checked by the domain
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewClaimRequest {
    pub approve: bool,
    pub approved_amount: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub rejection_reason: Option<String>,
}

impl From<ReviewClaimRequest> for ReviewDecision {
    fn from(request: ReviewClaimRequest) -> Self {
        ReviewDecision::from_form(request.approve, request.approved_amount, request.rejection_reason)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDescriptionRequest {
    #[validate(length(max = 2000), custom(function = "not_blank"))]
    pub description: String,
}

/// Query string of the claim listing
#[derive(Debug, Default, Deserialize)]
pub struct ListClaimsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub archived: Option<bool>,
    pub sort_by: Option<String>,
    pub direction: Option<String>,
}

impl TryFrom<ListClaimsParams> for ClaimListQuery {
    type Error = ApiError;

    fn try_from(params: ListClaimsParams) -> Result<Self, Self::Error> {
        let defaults = ClaimListQuery::default();
        let status = params
            .status
            .as_deref()
            .map(str::parse::<ClaimStatus>)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let sort_by = match params.sort_by.as_deref() {
            Some(field) => field
                .parse::<ClaimSortField>()
                .map_err(|violation| ApiError::BadRequest(violation.to_string()))?,
            None => defaults.sort_by,
        };
        let direction = match params.direction.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None => defaults.direction,
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(ApiError::BadRequest(format!("unknown sort direction '{}'", other)))
            }
        };

        Ok(ClaimListQuery {
            page: params.page.unwrap_or(defaults.page),
            page_size: params.page_size.unwrap_or(defaults.page_size),
            status,
            search: params.search,
            archived: params.archived,
            sort_by,
            direction,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: ClaimId,
    pub claim_number: String,
    pub status: ClaimStatus,
    pub customer_id: UserId,
    pub policy_id: Option<PolicyId>,
    pub hospital_id: Option<HospitalId>,
    pub treatment_id: Option<TreatmentId>,
    pub treatment_description: Option<String>,
    pub treatment_date: Option<NaiveDate>,
    pub treatment_details: Option<String>,
    pub claim_amount: Option<Decimal>,
    pub approved_amount: Decimal,
    pub reviewed_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id,
            claim_number: claim.claim_number,
            status: claim.status,
            customer_id: claim.customer_id,
            policy_id: claim.policy_id,
            hospital_id: claim.hospital_id,
            treatment_id: claim.treatment_id,
            treatment_description: claim.treatment_description,
            treatment_date: claim.treatment_date,
            treatment_details: claim.treatment_details,
            claim_amount: claim.claim_amount,
            approved_amount: claim.approved_amount,
            reviewed_by: claim.reviewed_by,
            rejection_reason: claim.rejection_reason,
            submitted_at: claim.submitted_at,
            reviewed_at: claim.reviewed_at,
            processed_at: claim.processed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub claim: ClaimResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentResponse>,
}

impl From<ReviewOutcome> for ReviewResponse {
    fn from(outcome: ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::Rejected(claim) => Self {
                claim: claim.into(),
                payment: None,
            },
            ReviewOutcome::Paid { claim, payment } => Self {
                claim: claim.into(),
                payment: Some(payment.into()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimPageResponse {
    pub items: Vec<ClaimResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<Page<Claim>> for ClaimPageResponse {
    fn from(page: Page<Claim>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items.into_iter().map(ClaimResponse::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteClaimResponse {
    pub claim_id: ClaimId,
    pub payments_removed: u64,
}

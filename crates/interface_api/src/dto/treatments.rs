//! Treatment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{HospitalId, PolicyId, TreatmentId, UserId};
use domain_claims::{TreatmentInput, TreatmentRecord};

use super::{not_blank, positive_amount};

/// Hospital-entered treatment facts
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TreatmentDetailsRequest {
    #[validate(length(max = 255), custom(function = "not_blank"))]
    pub diagnosis: String,
    #[validate(length(max = 4000))]
    #[serde(default)]
    pub treatment_details: String,
    #[validate(custom(function = "positive_amount"))]
    pub cost: Decimal,
    pub treatment_date: NaiveDate,
}

impl From<TreatmentDetailsRequest> for TreatmentInput {
    fn from(request: TreatmentDetailsRequest) -> Self {
        TreatmentInput {
            diagnosis: request.diagnosis,
            treatment_details: request.treatment_details,
            cost: request.cost,
            treatment_date: request.treatment_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTreatmentRequest {
    #[validate(length(max = 32), custom(function = "not_blank"))]
    pub policy_number: String,
    /// Required only to pick between several managed hospitals
    #[serde(default)]
    pub hospital_id: Option<HospitalId>,
    #[validate(nested)]
    pub treatment: TreatmentDetailsRequest,
}

#[derive(Debug, Serialize)]
pub struct TreatmentResponse {
    pub id: TreatmentId,
    pub hospital_id: HospitalId,
    pub policy_id: Option<PolicyId>,
    pub customer_id: UserId,
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub treatment_details: String,
    pub cost: Decimal,
    pub submitted_at: DateTime<Utc>,
}

impl From<TreatmentRecord> for TreatmentResponse {
    fn from(record: TreatmentRecord) -> Self {
        Self {
            id: record.id,
            hospital_id: record.hospital_id,
            policy_id: record.policy_id,
            customer_id: record.customer_id,
            treatment_date: record.treatment_date,
            diagnosis: record.diagnosis,
            treatment_details: record.treatment_details,
            cost: record.cost,
            submitted_at: record.submitted_at,
        }
    }
}

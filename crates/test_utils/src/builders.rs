//! Test Data Builders
//!
//! Builders for domain entities with sensible defaults, so tests only spell out
//! the fields they care about.

use chrono::{NaiveDate, Utc};
use core_kernel::{ClaimId, HospitalId, PlanId, PolicyId, TreatmentId, UserId};
use domain_claims::{
    Claim, ClaimStatus, Hospital, Plan, Policy, PolicyStatus, TreatmentInput, TreatmentRecord,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{DateFixtures, Users};

/// Builder for insurance plans
pub struct PlanBuilder {
    plan: Plan,
}

impl PlanBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            plan: Plan {
                id: PlanId::new(id),
                name: "Standard Health".to_string(),
                premium_amount: dec!(1200.00),
                coverage_limit: dec!(10000.00),
                duration_in_months: 12,
                is_active: true,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.plan.name = name.into();
        self
    }

    pub fn with_premium(mut self, premium: Decimal) -> Self {
        self.plan.premium_amount = premium;
        self
    }

    pub fn with_coverage_limit(mut self, limit: Decimal) -> Self {
        self.plan.coverage_limit = limit;
        self
    }

    pub fn with_duration_months(mut self, months: u32) -> Self {
        self.plan.duration_in_months = months;
        self
    }

    /// Withdrawn from sale; existing policies keep working
    pub fn inactive(mut self) -> Self {
        self.plan.is_active = false;
        self
    }

    pub fn build(self) -> Plan {
        self.plan
    }
}

/// Builder for policies
///
/// Defaults to an active, unpaid policy for [`Users::CUSTOMER`] whose term is
/// derived from the plan duration.
pub struct PolicyBuilder {
    policy: Policy,
    duration_in_months: u32,
}

impl PolicyBuilder {
    pub fn new(id: i64, plan: &Plan) -> Self {
        let start = DateFixtures::policy_start();
        Self {
            policy: Policy {
                id: PolicyId::new(id),
                policy_number: format!("POL-{:08X}", id),
                customer_id: Users::CUSTOMER,
                agent_id: Some(Users::AGENT),
                plan_id: plan.id,
                start_date: start,
                end_date: start,
                status: PolicyStatus::Active,
                premium_paid: false,
                premium_amount: plan.premium_amount,
            },
            duration_in_months: plan.duration_in_months,
        }
    }

    pub fn with_customer(mut self, customer: UserId) -> Self {
        self.policy.customer_id = customer;
        self
    }

    pub fn with_agent(mut self, agent: Option<UserId>) -> Self {
        self.policy.agent_id = agent;
        self
    }

    pub fn with_status(mut self, status: PolicyStatus) -> Self {
        self.policy.status = status;
        self
    }

    pub fn with_policy_number(mut self, number: impl Into<String>) -> Self {
        self.policy.policy_number = number.into();
        self
    }

    pub fn with_start_date(mut self, start: NaiveDate) -> Self {
        self.policy.start_date = start;
        self
    }

    /// Marks the premium flag as paid; the matching Premium payment is seeded separately
    pub fn paid(mut self) -> Self {
        self.policy.premium_paid = true;
        self
    }

    pub fn build(mut self) -> Policy {
        self.policy.end_date = Policy::term_end(self.policy.start_date, self.duration_in_months)
            .unwrap_or(self.policy.start_date);
        self.policy
    }
}

/// Builder for treatment form input
pub struct TreatmentInputBuilder {
    input: TreatmentInput,
}

impl Default for TreatmentInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreatmentInputBuilder {
    pub fn new() -> Self {
        Self {
            input: TreatmentInput {
                diagnosis: "Fracture".to_string(),
                treatment_details: "Cast applied to left forearm".to_string(),
                cost: dec!(5000),
                treatment_date: DateFixtures::treatment_date(),
            },
        }
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.input.diagnosis = diagnosis.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.input.treatment_details = details.into();
        self
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.input.cost = cost;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.input.treatment_date = date;
        self
    }

    pub fn build(self) -> TreatmentInput {
        self.input
    }
}

/// Builder for stored treatment records
pub struct TreatmentBuilder {
    record: TreatmentRecord,
}

impl TreatmentBuilder {
    pub fn new(id: i64, hospital_id: HospitalId) -> Self {
        let input = TreatmentInputBuilder::new().build();
        Self {
            record: TreatmentRecord {
                id: TreatmentId::new(id),
                hospital_id,
                policy_id: None,
                customer_id: Users::CUSTOMER,
                treatment_date: input.treatment_date,
                diagnosis: input.diagnosis,
                treatment_details: input.treatment_details,
                cost: input.cost,
                submitted_at: Utc::now(),
            },
        }
    }

    pub fn with_policy(mut self, policy_id: PolicyId) -> Self {
        self.record.policy_id = Some(policy_id);
        self
    }

    pub fn with_customer(mut self, customer: UserId) -> Self {
        self.record.customer_id = customer;
        self
    }

    pub fn with_cost(mut self, cost: Decimal) -> Self {
        self.record.cost = cost;
        self
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.record.diagnosis = diagnosis.into();
        self
    }

    pub fn build(self) -> TreatmentRecord {
        self.record
    }
}

pub struct HospitalBuilder {
    hospital: Hospital,
}

impl HospitalBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            hospital: Hospital {
                id: HospitalId::new(id),
                name: "City General Hospital".to_string(),
                manager_id: Some(Users::HOSPITAL_MANAGER),
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.hospital.name = name.into();
        self
    }

    pub fn with_manager(mut self, manager: Option<UserId>) -> Self {
        self.hospital.manager_id = manager;
        self
    }

    pub fn build(self) -> Hospital {
        self.hospital
    }
}

/// Builder for claims placed directly into a ledger
///
/// Useful for states that are tedious to reach through the engine, such as a
/// claim a query test only needs to find.
pub struct ClaimBuilder {
    claim: Claim,
}

impl ClaimBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            claim: Claim {
                id: ClaimId::new(id),
                claim_number: format!("CLM-{:08X}", id),
                treatment_description: Some("Emergency visit".to_string()),
                policy_id: None,
                customer_id: Users::CUSTOMER,
                hospital_id: None,
                treatment_id: None,
                claim_amount: None,
                approved_amount: Decimal::ZERO,
                treatment_date: None,
                treatment_details: None,
                status: ClaimStatus::Initiated,
                reviewed_by: None,
                rejection_reason: None,
                submitted_at: Utc::now(),
                reviewed_at: None,
                processed_at: None,
            },
        }
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.claim.status = status;
        self
    }

    pub fn with_customer(mut self, customer: UserId) -> Self {
        self.claim.customer_id = customer;
        self
    }

    pub fn with_policy(mut self, policy_id: PolicyId) -> Self {
        self.claim.policy_id = Some(policy_id);
        self
    }

    pub fn with_hospital(mut self, hospital_id: HospitalId) -> Self {
        self.claim.hospital_id = Some(hospital_id);
        self
    }

    pub fn with_treatment(mut self, treatment: &TreatmentRecord) -> Self {
        self.claim.treatment_id = Some(treatment.id);
        self.claim.hospital_id = Some(treatment.hospital_id);
        self.claim.claim_amount = Some(treatment.cost);
        self.claim.treatment_date = Some(treatment.treatment_date);
        self.claim.treatment_details = Some(treatment.treatment_details.clone());
        self
    }

    pub fn with_claim_amount(mut self, amount: Decimal) -> Self {
        self.claim.claim_amount = Some(amount);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.claim.treatment_description = Some(description.into());
        self
    }

    pub fn with_claim_number(mut self, number: impl Into<String>) -> Self {
        self.claim.claim_number = number.into();
        self
    }

    pub fn build(self) -> Claim {
        self.claim
    }
}

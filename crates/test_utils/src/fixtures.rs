//! Pre-built Test Fixtures
//!
//! Well-known users and dates, plus [`ClaimsScenario`]: a claims engine wired to
//! in-memory adapters and seeded with paid and unpaid policies.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{Identity, PaymentId, PolicyId, Role, TreatmentId, UserId};
use domain_claims::ports::mock::{InMemoryDirectory, InMemoryLedger, RecordingNotifier};
use domain_claims::{
    Claim, ClaimsEngine, Hospital, NewPayment, Plan, PolicyStatus, ReviewDecision, TreatmentInput,
    TreatmentRecord,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::builders::{HospitalBuilder, PlanBuilder, PolicyBuilder, TreatmentBuilder, TreatmentInputBuilder};

/// Well-known user ids
pub struct Users;

impl Users {
    pub const CUSTOMER: UserId = UserId::new(1);
    pub const OFFICER: UserId = UserId::new(2);
    pub const HOSPITAL_MANAGER: UserId = UserId::new(3);
    pub const AGENT: UserId = UserId::new(4);
    pub const ADMIN: UserId = UserId::new(5);
    pub const OTHER_CUSTOMER: UserId = UserId::new(6);
    pub const OTHER_MANAGER: UserId = UserId::new(7);
    pub const SECOND_OFFICER: UserId = UserId::new(8);

    pub fn customer() -> Identity {
        Identity::customer(Self::CUSTOMER)
    }

    pub fn other_customer() -> Identity {
        Identity::customer(Self::OTHER_CUSTOMER)
    }

    pub fn officer() -> Identity {
        Identity::claims_officer(Self::OFFICER)
    }

    pub fn second_officer() -> Identity {
        Identity::claims_officer(Self::SECOND_OFFICER)
    }

    pub fn hospital_manager() -> Identity {
        Identity::hospital_manager(Self::HOSPITAL_MANAGER)
    }

    pub fn other_manager() -> Identity {
        Identity::hospital_manager(Self::OTHER_MANAGER)
    }

    pub fn agent() -> Identity {
        Identity::new(Self::AGENT, Role::InsuranceAgent)
    }

    pub fn admin() -> Identity {
        Identity::admin(Self::ADMIN)
    }
}

/// Fixed dates
pub struct DateFixtures;

impl DateFixtures {
    /// Jan 1, 2025
    pub fn policy_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    /// Mar 1, 2025
    pub fn treatment_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }
}

pub const MAIN_HOSPITAL: i64 = 10;
pub const OTHER_HOSPITAL: i64 = 11;

/// Claims engine over in-memory adapters with seeded reference data
///
/// | policy            | coverage limit | premium            | owner           |
/// |-------------------|----------------|--------------------|-----------------|
/// | `basic_policy`    | 4000           | paid               | CUSTOMER        |
/// | `gold_policy`     | 10000          | paid               | CUSTOMER        |
/// | `unpaid_policy`   | 10000          | unpaid             | CUSTOMER        |
/// | `other_policy`    | 10000          | paid               | OTHER_CUSTOMER  |
/// | `suspended_policy`| 10000          | paid, suspended    | CUSTOMER        |
pub struct ClaimsScenario {
    pub engine: ClaimsEngine,
    pub ledger: InMemoryLedger,
    pub directory: Arc<InMemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub hospital: Hospital,
    pub other_hospital: Hospital,
    pub basic_plan: Plan,
    pub gold_plan: Plan,
    pub basic_policy: PolicyId,
    pub gold_policy: PolicyId,
    pub unpaid_policy: PolicyId,
    pub other_policy: PolicyId,
    pub suspended_policy: PolicyId,
}

impl ClaimsScenario {
    pub async fn seeded() -> Self {
        Self::with_notifier(RecordingNotifier::new()).await
    }

    pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
        let ledger = InMemoryLedger::new();
        let directory = Arc::new(InMemoryDirectory::new());
        let notifier = Arc::new(notifier);

        let hospital = HospitalBuilder::new(MAIN_HOSPITAL).build();
        let other_hospital = HospitalBuilder::new(OTHER_HOSPITAL)
            .with_name("Riverside Clinic")
            .with_manager(Some(Users::OTHER_MANAGER))
            .build();
        directory.add_hospital(hospital.clone()).await;
        directory.add_hospital(other_hospital.clone()).await;
        directory.add_officer(Users::OFFICER, true).await;
        directory.add_officer(Users::SECOND_OFFICER, true).await;
        for (user, role) in [
            (Users::CUSTOMER, Role::Customer),
            (Users::OTHER_CUSTOMER, Role::Customer),
            (Users::HOSPITAL_MANAGER, Role::HospitalManager),
            (Users::OTHER_MANAGER, Role::HospitalManager),
            (Users::AGENT, Role::InsuranceAgent),
            (Users::ADMIN, Role::Admin),
        ] {
            directory.add_user(user, role).await;
        }

        let basic_plan = PlanBuilder::new(20)
            .with_name("Basic Care")
            .with_premium(dec!(600.00))
            .with_coverage_limit(dec!(4000))
            .build();
        let gold_plan = PlanBuilder::new(21)
            .with_name("Gold Care")
            .with_coverage_limit(dec!(10000))
            .build();
        ledger.add_plan(basic_plan.clone()).await;
        ledger.add_plan(gold_plan.clone()).await;

        let basic = PolicyBuilder::new(30, &basic_plan).paid().build();
        let gold = PolicyBuilder::new(31, &gold_plan).paid().build();
        let unpaid = PolicyBuilder::new(32, &gold_plan).build();
        let other = PolicyBuilder::new(33, &gold_plan)
            .with_customer(Users::OTHER_CUSTOMER)
            .paid()
            .build();
        let suspended = PolicyBuilder::new(34, &gold_plan)
            .with_status(PolicyStatus::Suspended)
            .paid()
            .build();

        let ids = (basic.id, gold.id, unpaid.id, other.id, suspended.id);
        for policy in [basic, gold, unpaid, other, suspended] {
            if policy.premium_paid {
                let premium = NewPayment::premium(policy.id, policy.premium_amount, "Card")
                    .into_payment(PaymentId::new(100 + policy.id.get()));
                ledger.add_payment(premium).await;
            }
            ledger.add_policy(policy).await;
        }

        let engine = ClaimsEngine::new(
            Arc::new(ledger.clone()),
            directory.clone(),
            notifier.clone(),
        );

        Self {
            engine,
            ledger,
            directory,
            notifier,
            hospital,
            other_hospital,
            basic_plan,
            gold_plan,
            basic_policy: ids.0,
            gold_policy: ids.1,
            unpaid_policy: ids.2,
            other_policy: ids.3,
            suspended_policy: ids.4,
        }
    }

    /// Customer claim in `Initiated` at the main hospital
    pub async fn initiated_claim(&self) -> Claim {
        self.engine
            .initiate_claim(
                &Users::customer(),
                self.gold_policy,
                self.hospital.id,
                "Fell from a ladder".to_string(),
            )
            .await
            .expect("initiate claim")
    }

    /// Claim in `AwaitingPolicy` with the given treatment cost
    pub async fn awaiting_policy_claim(&self, cost: Decimal) -> Claim {
        let claim = self.initiated_claim().await;
        self.engine
            .hospital_update(
                &Users::hospital_manager(),
                claim.id,
                TreatmentInputBuilder::new().with_cost(cost).build(),
            )
            .await
            .expect("hospital update")
    }

    /// Claim finalized against the gold policy, in `Submitted`
    pub async fn submitted_claim(&self, cost: Decimal) -> Claim {
        let claim = self.awaiting_policy_claim(cost).await;
        self.engine
            .finalize_claim(&Users::customer(), claim.id, self.gold_policy)
            .await
            .expect("finalize claim")
    }

    /// Claim approved for its full amount and settled
    pub async fn paid_claim(&self, cost: Decimal) -> Claim {
        let claim = self.submitted_claim(cost).await;
        self.engine
            .review_claim(&Users::officer(), claim.id, ReviewDecision::Approve { amount: cost })
            .await
            .expect("approve claim")
            .claim()
            .clone()
    }

    /// Stores a treatment record for the customer at the main hospital
    pub async fn recorded_treatment(&self, id: i64, policy: Option<PolicyId>) -> TreatmentRecord {
        let mut builder = TreatmentBuilder::new(id, self.hospital.id);
        if let Some(policy) = policy {
            builder = builder.with_policy(policy);
        }
        let record = builder.build();
        self.ledger.add_treatment(record.clone()).await;
        record
    }

    pub fn treatment_input(&self, cost: Decimal) -> TreatmentInput {
        TreatmentInputBuilder::new().with_cost(cost).build()
    }

    pub async fn treatment(&self, id: TreatmentId) -> Option<TreatmentRecord> {
        self.ledger.treatment(id).await
    }

    /// Registers a further hospital run by [`Users::HOSPITAL_MANAGER`]
    pub async fn second_managed_hospital(&self, id: i64) -> Hospital {
        let hospital = HospitalBuilder::new(id)
            .with_name("Northgate Infirmary")
            .with_manager(Some(Users::HOSPITAL_MANAGER))
            .build();
        self.directory.add_hospital(hospital.clone()).await;
        hospital
    }
}

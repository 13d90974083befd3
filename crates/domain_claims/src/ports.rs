//! Claims Domain Ports
//!
//! The engine reaches its collaborators only through these traits:
//!
//! - [`LedgerStore`] / [`LedgerTransaction`]: transactional storage for policies,
//!   treatment records, claims and payments
//! - [`CapabilityDirectory`]: hospital and claims-officer lookups with defined tie-breaks
//! - [`NotificationSink`]: fire-and-forget user notifications
//! - [`NotificationInbox`]: reading and acknowledging stored notifications
//!
//! # Transactions
//!
//! Every lifecycle operation runs inside one `LedgerTransaction`. Reads made through
//! `*_for_update` methods lock the row until commit. Dropping a transaction without
//! calling [`LedgerTransaction::commit`] rolls it back.
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! let claim = tx.claim_for_update(id).await?;
//! // validate against the freshly loaded claim, then write
//! tx.update_claim(&claim, loaded_status).await?;
//! tx.commit().await?;
//! ```

use async_trait::async_trait;

use core_kernel::{
    ClaimId, DomainPort, HealthCheckable, HospitalId, NotificationId, PlanId, PolicyId, PortError,
    Role, TreatmentId, UserId,
};

use crate::claim::{Claim, ClaimStatus, NewClaim};
use crate::hospital::Hospital;
use crate::notifier::Notification;
use crate::payment::{NewPayment, Payment};
use crate::policy::{NewPolicy, Plan, Policy, PolicyWithPlan};
use crate::query::{ClaimListQuery, ClaimScope, Page};
use crate::treatment::{NewTreatment, TreatmentRecord};

/// Durable ledger of policies, treatments, claims, and payments
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    /// Opens a transaction
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError>;

    /// Reads a claim outside any transaction, if visible in `scope`
    async fn get_claim(&self, id: ClaimId, scope: ClaimScope) -> Result<Option<Claim>, PortError>;

    /// Lists claims visible in `scope`
    async fn find_claims(
        &self,
        scope: ClaimScope,
        query: &ClaimListQuery,
    ) -> Result<Page<Claim>, PortError>;

    /// Treatment records visible in `scope`, newest first
    async fn find_treatments(&self, scope: ClaimScope) -> Result<Vec<TreatmentRecord>, PortError>;
}

/// One unit of work against the ledger
#[async_trait]
pub trait LedgerTransaction: Send {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Loads and locks a policy together with its plan
    async fn policy_with_plan(&mut self, id: PolicyId) -> Result<Option<PolicyWithPlan>, PortError>;

    async fn plan(&mut self, id: PlanId) -> Result<Option<Plan>, PortError>;

    /// True if the customer holds an Active policy on the plan
    async fn active_policy_exists(&mut self, customer: UserId, plan: PlanId) -> Result<bool, PortError>;

    /// Case-insensitive lookup by `POL-` number
    async fn policy_by_number(&mut self, number: &str) -> Result<Option<Policy>, PortError>;

    /// True if a completed Premium payment exists for the policy
    async fn has_completed_premium(&mut self, policy_id: PolicyId) -> Result<bool, PortError>;

    /// Loads and locks a claim
    async fn claim_for_update(&mut self, id: ClaimId) -> Result<Option<Claim>, PortError>;

    async fn claim_exists_for_treatment(&mut self, treatment_id: TreatmentId) -> Result<bool, PortError>;

    /// Loads and locks a treatment record
    async fn treatment_for_update(&mut self, id: TreatmentId) -> Result<Option<TreatmentRecord>, PortError>;

    // ========================================================================
    // Writes
    // ========================================================================

    async fn insert_claim(&mut self, claim: NewClaim) -> Result<Claim, PortError>;

    /// Writes `claim` only if the stored status still equals `expected`.
    ///
    /// Returns `false` when the stored status differs; nothing is written.
    async fn update_claim(&mut self, claim: &Claim, expected: ClaimStatus) -> Result<bool, PortError>;

    async fn delete_claim(&mut self, id: ClaimId) -> Result<(), PortError>;

    async fn insert_treatment(&mut self, treatment: NewTreatment) -> Result<TreatmentRecord, PortError>;

    async fn update_treatment(&mut self, treatment: &TreatmentRecord) -> Result<(), PortError>;

    async fn insert_policy(&mut self, policy: NewPolicy) -> Result<Policy, PortError>;

    /// Persists status, term, cached premium and premium-paid flag
    async fn update_policy(&mut self, policy: &Policy) -> Result<(), PortError>;

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Payment, PortError>;

    /// Returns the number of payments removed
    async fn delete_payments_for_claim(&mut self, claim_id: ClaimId) -> Result<u64, PortError>;

    async fn commit(self: Box<Self>) -> Result<(), PortError>;
}

/// Explicit capability lookups
#[async_trait]
pub trait CapabilityDirectory: DomainPort + HealthCheckable {
    async fn hospital(&self, id: HospitalId) -> Result<Option<Hospital>, PortError>;

    /// Every hospital managed by `user`, ascending by id
    async fn hospitals_managed_by(&self, user: UserId) -> Result<Vec<Hospital>, PortError>;

    /// Role of an active user account
    async fn role_of(&self, user: UserId) -> Result<Option<Role>, PortError>;

    /// Officer to notify about a newly submitted claim; lowest active officer id
    async fn pick_reviewing_officer(&self) -> Result<Option<UserId>, PortError>;
}

/// Per-user notification delivery
#[async_trait]
pub trait NotificationSink: DomainPort {
    async fn notify(&self, user: UserId, message: &str) -> Result<(), PortError>;
}

/// Per-user access to stored notifications
///
/// Every method is keyed by the owning user; another user's notification
/// behaves as if it did not exist.
#[async_trait]
pub trait NotificationInbox: DomainPort {
    /// Newest first
    async fn notifications_for(&self, user: UserId, unread_only: bool) -> Result<Vec<Notification>, PortError>;

    /// Returns `false` if `user` owns no notification `id`
    async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<bool, PortError>;

    /// Returns how many notifications changed
    async fn mark_all_read(&self, user: UserId) -> Result<u64, PortError>;
}

/// In-memory adapters for testing
///
/// The ledger serializes transactions behind an owned mutex and stages writes on
/// a copy of the state, which replaces the shared state only on commit.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

    use core_kernel::{HealthCheckResult, PaymentId};

    #[derive(Debug, Clone, Default)]
    pub struct LedgerState {
        pub plans: BTreeMap<PlanId, Plan>,
        pub policies: BTreeMap<PolicyId, Policy>,
        pub treatments: BTreeMap<TreatmentId, TreatmentRecord>,
        pub claims: BTreeMap<ClaimId, Claim>,
        pub payments: BTreeMap<PaymentId, Payment>,
        next_id: i64,
    }

    impl LedgerState {
        fn allocate(&mut self) -> i64 {
            self.next_id += 1;
            self.next_id
        }

        fn reserve(&mut self, raw: i64) {
            self.next_id = self.next_id.max(raw);
        }

        fn agent_of(&self, claim: &Claim) -> Option<UserId> {
            self.agent_of_policy(claim.policy_id)
        }

        fn agent_of_policy(&self, policy_id: Option<PolicyId>) -> Option<UserId> {
            policy_id
                .and_then(|id| self.policies.get(&id))
                .and_then(|policy| policy.agent_id)
        }

        fn diagnosis_of(&self, claim: &Claim) -> Option<&str> {
            claim
                .treatment_id
                .and_then(|id| self.treatments.get(&id))
                .map(|t| t.diagnosis.as_str())
        }
    }

    /// In-memory ledger
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryLedger {
        state: Arc<Mutex<LedgerState>>,
        fail_payment_inserts: Arc<AtomicBool>,
    }

    impl InMemoryLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent payment insert fail with a connection error
        pub fn fail_payment_inserts(&self, fail: bool) {
            self.fail_payment_inserts.store(fail, Ordering::SeqCst);
        }

        pub async fn add_plan(&self, plan: Plan) {
            let mut state = self.state.lock().await;
            state.reserve(plan.id.get());
            state.plans.insert(plan.id, plan);
        }

        pub async fn add_policy(&self, policy: Policy) {
            let mut state = self.state.lock().await;
            state.reserve(policy.id.get());
            state.policies.insert(policy.id, policy);
        }

        pub async fn add_treatment(&self, treatment: TreatmentRecord) {
            let mut state = self.state.lock().await;
            state.reserve(treatment.id.get());
            state.treatments.insert(treatment.id, treatment);
        }

        pub async fn add_claim(&self, claim: Claim) {
            let mut state = self.state.lock().await;
            state.reserve(claim.id.get());
            state.claims.insert(claim.id, claim);
        }

        pub async fn add_payment(&self, payment: Payment) {
            let mut state = self.state.lock().await;
            state.reserve(payment.id.get());
            state.payments.insert(payment.id, payment);
        }

        /// Copy of the committed state
        pub async fn snapshot(&self) -> LedgerState {
            self.state.lock().await.clone()
        }

        pub async fn claim(&self, id: ClaimId) -> Option<Claim> {
            self.state.lock().await.claims.get(&id).cloned()
        }

        pub async fn policy(&self, id: PolicyId) -> Option<Policy> {
            self.state.lock().await.policies.get(&id).cloned()
        }

        pub async fn treatment(&self, id: TreatmentId) -> Option<TreatmentRecord> {
            self.state.lock().await.treatments.get(&id).cloned()
        }

        pub async fn payouts_for(&self, claim_id: ClaimId) -> Vec<Payment> {
            self.state
                .lock()
                .await
                .payments
                .values()
                .filter(|p| p.is_payout_for(claim_id))
                .cloned()
                .collect()
        }
    }

    impl DomainPort for InMemoryLedger {}

    #[async_trait]
    impl HealthCheckable for InMemoryLedger {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-ledger", 0)
        }
    }

    #[async_trait]
    impl LedgerStore for InMemoryLedger {
        async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            let staged = guard.clone();
            Ok(Box::new(InMemoryTransaction {
                guard,
                staged,
                fail_payment_inserts: self.fail_payment_inserts.load(Ordering::SeqCst),
            }))
        }

        async fn get_claim(&self, id: ClaimId, scope: ClaimScope) -> Result<Option<Claim>, PortError> {
            let state = self.state.lock().await;
            Ok(state
                .claims
                .get(&id)
                .filter(|claim| scope.admits(claim, state.agent_of(claim)))
                .cloned())
        }

        async fn find_claims(
            &self,
            scope: ClaimScope,
            query: &ClaimListQuery,
        ) -> Result<Page<Claim>, PortError> {
            let state = self.state.lock().await;
            let mut matched: Vec<Claim> = state
                .claims
                .values()
                .filter(|claim| scope.admits(claim, state.agent_of(claim)))
                .filter(|claim| query.matches(claim, state.diagnosis_of(claim)))
                .cloned()
                .collect();
            matched.sort_by(|a, b| query.compare(a, b));

            let total = matched.len() as u64;
            let items = matched
                .into_iter()
                .skip(query.offset() as usize)
                .take(query.page_size as usize)
                .collect();
            Ok(Page {
                items,
                page: query.page,
                page_size: query.page_size,
                total,
            })
        }

        async fn find_treatments(&self, scope: ClaimScope) -> Result<Vec<TreatmentRecord>, PortError> {
            let state = self.state.lock().await;
            let mut records: Vec<TreatmentRecord> = state
                .treatments
                .values()
                .filter(|record| scope.admits_treatment(record, state.agent_of_policy(record.policy_id)))
                .cloned()
                .collect();
            records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then_with(|| b.id.cmp(&a.id)));
            Ok(records)
        }
    }

    /// Holds the ledger lock for its whole lifetime
    pub struct InMemoryTransaction {
        guard: OwnedMutexGuard<LedgerState>,
        staged: LedgerState,
        fail_payment_inserts: bool,
    }

    #[async_trait]
    impl LedgerTransaction for InMemoryTransaction {
        async fn policy_with_plan(&mut self, id: PolicyId) -> Result<Option<PolicyWithPlan>, PortError> {
            let Some(policy) = self.staged.policies.get(&id).cloned() else {
                return Ok(None);
            };
            let plan = self
                .staged
                .plans
                .get(&policy.plan_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Plan", policy.plan_id))?;
            Ok(Some(PolicyWithPlan { policy, plan }))
        }

        async fn plan(&mut self, id: PlanId) -> Result<Option<Plan>, PortError> {
            Ok(self.staged.plans.get(&id).cloned())
        }

        async fn active_policy_exists(&mut self, customer: UserId, plan: PlanId) -> Result<bool, PortError> {
            Ok(self
                .staged
                .policies
                .values()
                .any(|p| p.customer_id == customer && p.plan_id == plan && p.is_active()))
        }

        async fn policy_by_number(&mut self, number: &str) -> Result<Option<Policy>, PortError> {
            let wanted = number.trim();
            Ok(self
                .staged
                .policies
                .values()
                .find(|p| p.policy_number.eq_ignore_ascii_case(wanted))
                .cloned())
        }

        async fn has_completed_premium(&mut self, policy_id: PolicyId) -> Result<bool, PortError> {
            Ok(self
                .staged
                .payments
                .values()
                .any(|p| p.is_completed_premium_for(policy_id)))
        }

        async fn claim_for_update(&mut self, id: ClaimId) -> Result<Option<Claim>, PortError> {
            Ok(self.staged.claims.get(&id).cloned())
        }

        async fn claim_exists_for_treatment(&mut self, treatment_id: TreatmentId) -> Result<bool, PortError> {
            Ok(self
                .staged
                .claims
                .values()
                .any(|c| c.treatment_id == Some(treatment_id)))
        }

        async fn treatment_for_update(&mut self, id: TreatmentId) -> Result<Option<TreatmentRecord>, PortError> {
            Ok(self.staged.treatments.get(&id).cloned())
        }

        async fn insert_claim(&mut self, claim: NewClaim) -> Result<Claim, PortError> {
            if let Some(treatment_id) = claim.treatment_id {
                if self.claim_exists_for_treatment(treatment_id).await? {
                    return Err(PortError::conflict(format!(
                        "treatment {} already has a claim",
                        treatment_id
                    )));
                }
            }
            let id = ClaimId::new(self.staged.allocate());
            let claim = claim.into_claim(id);
            self.staged.claims.insert(id, claim.clone());
            Ok(claim)
        }

        async fn update_claim(&mut self, claim: &Claim, expected: ClaimStatus) -> Result<bool, PortError> {
            match self.staged.claims.get_mut(&claim.id) {
                Some(stored) if stored.status == expected => {
                    *stored = claim.clone();
                    Ok(true)
                }
                Some(_) => Ok(false),
                None => Err(PortError::not_found("Claim", claim.id)),
            }
        }

        async fn delete_claim(&mut self, id: ClaimId) -> Result<(), PortError> {
            if self.staged.payments.values().any(|p| p.claim_id == Some(id)) {
                return Err(PortError::conflict(format!("claim {} still has payments", id)));
            }
            self.staged
                .claims
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn insert_treatment(&mut self, treatment: NewTreatment) -> Result<TreatmentRecord, PortError> {
            let id = TreatmentId::new(self.staged.allocate());
            let record = treatment.into_record(id);
            self.staged.treatments.insert(id, record.clone());
            Ok(record)
        }

        async fn update_treatment(&mut self, treatment: &TreatmentRecord) -> Result<(), PortError> {
            let stored = self
                .staged
                .treatments
                .get_mut(&treatment.id)
                .ok_or_else(|| PortError::not_found("TreatmentRecord", treatment.id))?;
            *stored = treatment.clone();
            Ok(())
        }

        async fn insert_policy(&mut self, policy: NewPolicy) -> Result<Policy, PortError> {
            if self
                .staged
                .policies
                .values()
                .any(|p| p.policy_number.eq_ignore_ascii_case(&policy.policy_number))
            {
                return Err(PortError::conflict(format!(
                    "policy number {} already exists",
                    policy.policy_number
                )));
            }
            let id = PolicyId::new(self.staged.allocate());
            let policy = policy.into_policy(id);
            self.staged.policies.insert(id, policy.clone());
            Ok(policy)
        }

        async fn update_policy(&mut self, policy: &Policy) -> Result<(), PortError> {
            let stored = self
                .staged
                .policies
                .get_mut(&policy.id)
                .ok_or_else(|| PortError::not_found("Policy", policy.id))?;
            stored.status = policy.status;
            stored.start_date = policy.start_date;
            stored.end_date = policy.end_date;
            stored.premium_paid = policy.premium_paid;
            stored.premium_amount = policy.premium_amount;
            Ok(())
        }

        async fn insert_payment(&mut self, payment: NewPayment) -> Result<Payment, PortError> {
            if self.fail_payment_inserts {
                return Err(PortError::connection("payment insert failed"));
            }
            if let Some(claim_id) = payment.claim_id {
                if self.staged.payments.values().any(|p| p.is_payout_for(claim_id)) {
                    return Err(PortError::conflict(format!(
                        "claim {} already has a payout",
                        claim_id
                    )));
                }
            }
            let id = PaymentId::new(self.staged.allocate());
            let payment = payment.into_payment(id);
            self.staged.payments.insert(id, payment.clone());
            Ok(payment)
        }

        async fn delete_payments_for_claim(&mut self, claim_id: ClaimId) -> Result<u64, PortError> {
            let before = self.staged.payments.len();
            self.staged.payments.retain(|_, p| p.claim_id != Some(claim_id));
            Ok((before - self.staged.payments.len()) as u64)
        }

        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            let InMemoryTransaction { mut guard, staged, .. } = *self;
            *guard = staged;
            Ok(())
        }
    }

    /// In-memory directory of users, hospitals and claims officers
    #[derive(Debug, Default)]
    pub struct InMemoryDirectory {
        hospitals: RwLock<BTreeMap<HospitalId, Hospital>>,
        /// Officer user id to active flag
        officers: RwLock<BTreeMap<UserId, bool>>,
        users: RwLock<BTreeMap<UserId, Role>>,
    }

    impl InMemoryDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_hospital(&self, hospital: Hospital) {
            self.hospitals.write().await.insert(hospital.id, hospital);
        }

        /// Registers an officer; inactive officers have no role on record
        pub async fn add_officer(&self, user: UserId, active: bool) {
            self.officers.write().await.insert(user, active);
            if active {
                self.add_user(user, Role::ClaimsOfficer).await;
            }
        }

        pub async fn add_user(&self, user: UserId, role: Role) {
            self.users.write().await.insert(user, role);
        }
    }

    impl DomainPort for InMemoryDirectory {}

    #[async_trait]
    impl HealthCheckable for InMemoryDirectory {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("memory-directory", 0)
        }
    }

    #[async_trait]
    impl CapabilityDirectory for InMemoryDirectory {
        async fn hospital(&self, id: HospitalId) -> Result<Option<Hospital>, PortError> {
            Ok(self.hospitals.read().await.get(&id).cloned())
        }

        async fn hospitals_managed_by(&self, user: UserId) -> Result<Vec<Hospital>, PortError> {
            Ok(self
                .hospitals
                .read()
                .await
                .values()
                .filter(|h| h.is_managed_by(user))
                .cloned()
                .collect())
        }

        async fn role_of(&self, user: UserId) -> Result<Option<Role>, PortError> {
            Ok(self.users.read().await.get(&user).copied())
        }

        async fn pick_reviewing_officer(&self) -> Result<Option<UserId>, PortError> {
            Ok(self
                .officers
                .read()
                .await
                .iter()
                .find(|(_, active)| **active)
                .map(|(user, _)| *user))
        }
    }

    /// Records every notification and serves them back as an inbox; can be
    /// switched to fail
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        sent: RwLock<Vec<Notification>>,
        failing: AtomicBool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            let notifier = Self::default();
            notifier.failing.store(true, Ordering::SeqCst);
            notifier
        }

        pub async fn sent(&self) -> Vec<(UserId, String)> {
            self.sent
                .read()
                .await
                .iter()
                .map(|n| (n.user_id, n.message.clone()))
                .collect()
        }

        pub async fn messages_for(&self, user: UserId) -> Vec<String> {
            self.sent
                .read()
                .await
                .iter()
                .filter(|n| n.user_id == user)
                .map(|n| n.message.clone())
                .collect()
        }
    }

    impl DomainPort for RecordingNotifier {}

    #[async_trait]
    impl NotificationSink for RecordingNotifier {
        async fn notify(&self, user: UserId, message: &str) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("notification sink unavailable"));
            }
            let mut sent = self.sent.write().await;
            let id = NotificationId::new(sent.len() as i64 + 1);
            sent.push(Notification {
                id,
                user_id: user,
                message: message.to_string(),
                is_read: false,
                created_at: Utc::now(),
            });
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationInbox for RecordingNotifier {
        async fn notifications_for(&self, user: UserId, unread_only: bool) -> Result<Vec<Notification>, PortError> {
            Ok(self
                .sent
                .read()
                .await
                .iter()
                .rev()
                .filter(|n| n.user_id == user && !(unread_only && n.is_read))
                .cloned()
                .collect())
        }

        async fn mark_read(&self, user: UserId, id: NotificationId) -> Result<bool, PortError> {
            let mut sent = self.sent.write().await;
            match sent.iter_mut().find(|n| n.id == id && n.user_id == user) {
                Some(notification) => {
                    notification.is_read = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn mark_all_read(&self, user: UserId) -> Result<u64, PortError> {
            let mut changed = 0;
            for notification in self.sent.write().await.iter_mut() {
                if notification.user_id == user && !notification.is_read {
                    notification.is_read = true;
                    changed += 1;
                }
            }
            Ok(changed)
        }
    }

}

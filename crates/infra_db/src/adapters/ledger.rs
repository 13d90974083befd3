//! PostgreSQL Ledger Adapter
//!
//! Implements `LedgerStore` over a `PgPool`. Each `LedgerTransaction` owns one
//! `sqlx::Transaction`; `*_for_update` reads take `FOR UPDATE` row locks, claim
//! writes are conditional on the loaded status, and dropping the transaction
//! without commit rolls it back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PlanId, PolicyId, PortError,
    TreatmentId, UserId,
};
use domain_claims::{
    Claim, ClaimListQuery, ClaimScope, ClaimSortField, ClaimStatus, LedgerStore,
    LedgerTransaction, NewClaim, NewPayment, NewPolicy, NewTreatment, Page, Payment, Plan, Policy,
    PolicyWithPlan, TreatmentRecord,
};

use crate::error::port_error;
use crate::repositories::claims::{
    ClaimRow, DbClaimStatus, DbPaymentStatus, DbPaymentType, DbPolicyStatus, PaymentRow, PlanRow,
    PolicyPlanRow, PolicyRow, TreatmentRow, CLAIM_COLUMNS, PAYMENT_COLUMNS, PLAN_COLUMNS,
    POLICY_COLUMNS, TREATMENT_COLUMNS,
};

/// PostgreSQL-backed claims ledger
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PgLedgerStore {}

#[async_trait]
impl HealthCheckable for PgLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => HealthCheckResult::healthy(
                "postgres-ledger",
                start.elapsed().as_millis() as u64,
            ),
            Err(e) => HealthCheckResult::unhealthy("postgres-ledger", format!("Database error: {}", e)),
        }
    }
}

/// Appends the visibility predicate for rows of `alias` joined to policies as `p`
fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &ClaimScope, alias: &str) {
    match scope {
        ClaimScope::All => {}
        ClaimScope::Customer(user) => {
            builder.push(format!(" AND {}.customer_id = ", alias)).push_bind(user.get());
        }
        ClaimScope::Hospitals(hospitals) => {
            let ids: Vec<i64> = hospitals.iter().map(|id| id.get()).collect();
            builder
                .push(format!(" AND {}.hospital_id = ANY(", alias))
                .push_bind(ids)
                .push(")");
        }
        ClaimScope::Agent(agent) => {
            builder.push(" AND p.agent_id = ").push_bind(agent.get());
        }
        ClaimScope::Nothing => {
            builder.push(" AND FALSE");
        }
    }
}

/// Appends the scope and filter predicates shared by listing, counting and single reads
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, scope: &ClaimScope, query: Option<&ClaimListQuery>) {
    push_scope(builder, scope, "c");

    let Some(query) = query else { return };
    if let Some(status) = query.status {
        builder.push(" AND c.status = ").push_bind(DbClaimStatus::from(status));
    }
    match query.archived {
        Some(true) => {
            builder.push(" AND c.status IN ('paid', 'rejected')");
        }
        Some(false) => {
            builder.push(" AND c.status NOT IN ('paid', 'rejected')");
        }
        None => {}
    }
    if let Some(term) = query.search_term() {
        let pattern = format!("%{}%", escape_like(&term));
        builder
            .push(" AND (LOWER(c.claim_number) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(c.treatment_description, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(t.diagnosis, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// ORDER BY expression for an allow-listed sort field
fn sort_expression(field: ClaimSortField) -> String {
    match field {
        ClaimSortField::Status => "c.status::text".to_string(),
        other => format!("c.{}", other.column()),
    }
}

const CLAIM_JOINS: &str = " FROM claims c \
    LEFT JOIN policies p ON p.id = c.policy_id \
    LEFT JOIN treatment_records t ON t.id = c.treatment_id \
    WHERE TRUE";

const TREATMENT_JOINS: &str = " FROM treatment_records t \
    LEFT JOIN policies p ON p.id = t.policy_id \
    WHERE TRUE";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PortError> {
        let tx = self.pool.begin().await.map_err(port_error)?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get_claim(&self, id: ClaimId, scope: ClaimScope) -> Result<Option<Claim>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {}{}", CLAIM_COLUMNS, CLAIM_JOINS));
        builder.push(" AND c.id = ").push_bind(id.get());
        push_filters(&mut builder, &scope, None);
        let row = builder
            .build_query_as::<ClaimRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(port_error)?;
        Ok(row.map(Claim::from))
    }

    #[instrument(skip(self, query), fields(page = query.page, page_size = query.page_size))]
    async fn find_claims(
        &self,
        scope: ClaimScope,
        query: &ClaimListQuery,
    ) -> Result<Page<Claim>, PortError> {
        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*){}", CLAIM_JOINS));
        push_filters(&mut count, &scope, Some(query));
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(port_error)?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {}{}", CLAIM_COLUMNS, CLAIM_JOINS));
        push_filters(&mut select, &scope, Some(query));
        let direction = query.direction.as_sql();
        select
            .push(format!(
                " ORDER BY {} {}, c.id {}",
                sort_expression(query.sort_by),
                direction,
                direction
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(query.page_size))
            .push(" OFFSET ")
            .push_bind(query.offset() as i64);
        let rows = select
            .build_query_as::<ClaimRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(port_error)?;
        debug!(total, returned = rows.len(), "Claims listed");

        Ok(Page {
            items: rows.into_iter().map(Claim::from).collect(),
            page: query.page,
            page_size: query.page_size,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn find_treatments(&self, scope: ClaimScope) -> Result<Vec<TreatmentRecord>, PortError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {}{}",
            qualified(TREATMENT_COLUMNS, "t"),
            TREATMENT_JOINS
        ));
        push_scope(&mut builder, &scope, "t");
        builder.push(" ORDER BY t.submitted_at DESC, t.id DESC");
        let rows = builder
            .build_query_as::<TreatmentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(port_error)?;
        debug!(returned = rows.len(), "Treatments listed");
        Ok(rows.into_iter().map(TreatmentRecord::from).collect())
    }
}

/// Prefixes every column of a column list with `alias.`
fn qualified(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|column| format!("{}.{}", alias, column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One PostgreSQL transaction over the ledger tables
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn policy_with_plan(&mut self, id: PolicyId) -> Result<Option<PolicyWithPlan>, PortError> {
        let row = sqlx::query_as::<_, PolicyPlanRow>(
            r#"
            SELECT p.id, p.policy_number, p.customer_id, p.agent_id, p.plan_id,
                   p.start_date, p.end_date, p.status, p.premium_paid, p.premium_amount,
                   pl.name AS plan_name,
                   pl.premium_amount AS plan_premium_amount,
                   pl.coverage_limit,
                   pl.duration_in_months,
                   pl.is_active AS plan_is_active
            FROM policies p
            JOIN plans pl ON pl.id = p.plan_id
            WHERE p.id = $1
            FOR UPDATE OF p
            "#,
        )
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.map(PolicyWithPlan::from))
    }

    async fn plan(&mut self, id: PlanId) -> Result<Option<Plan>, PortError> {
        let row = sqlx::query_as::<_, PlanRow>(&format!("SELECT {} FROM plans WHERE id = $1", PLAN_COLUMNS))
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(port_error)?;
        Ok(row.map(Plan::from))
    }

    async fn active_policy_exists(&mut self, customer: UserId, plan: PlanId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM policies \
             WHERE customer_id = $1 AND plan_id = $2 AND status = $3)",
        )
        .bind(customer.get())
        .bind(plan.get())
        .bind(DbPolicyStatus::Active)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)
    }

    async fn policy_by_number(&mut self, number: &str) -> Result<Option<Policy>, PortError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {} FROM policies WHERE UPPER(policy_number) = UPPER($1)",
            POLICY_COLUMNS
        ))
        .bind(number.trim())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.map(Policy::from))
    }

    async fn has_completed_premium(&mut self, policy_id: PolicyId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM payments \
             WHERE policy_id = $1 AND payment_type = $2 AND status = $3)",
        )
        .bind(policy_id.get())
        .bind(DbPaymentType::Premium)
        .bind(DbPaymentStatus::Completed)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)
    }

    async fn claim_for_update(&mut self, id: ClaimId) -> Result<Option<Claim>, PortError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {} FROM claims c WHERE c.id = $1 FOR UPDATE",
            CLAIM_COLUMNS
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.map(Claim::from))
    }

    async fn claim_exists_for_treatment(&mut self, treatment_id: TreatmentId) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM claims WHERE treatment_id = $1)")
            .bind(treatment_id.get())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(port_error)
    }

    async fn treatment_for_update(&mut self, id: TreatmentId) -> Result<Option<TreatmentRecord>, PortError> {
        let row = sqlx::query_as::<_, TreatmentRow>(&format!(
            "SELECT {} FROM treatment_records WHERE id = $1 FOR UPDATE",
            TREATMENT_COLUMNS
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.map(TreatmentRecord::from))
    }

    async fn insert_claim(&mut self, claim: NewClaim) -> Result<Claim, PortError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            r#"
            INSERT INTO claims AS c (
                claim_number, treatment_description, policy_id, customer_id, hospital_id,
                treatment_id, claim_amount, treatment_date, treatment_details, status, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        ))
        .bind(&claim.claim_number)
        .bind(&claim.treatment_description)
        .bind(claim.policy_id.map(|id| id.get()))
        .bind(claim.customer_id.get())
        .bind(claim.hospital_id.map(|id| id.get()))
        .bind(claim.treatment_id.map(|id| id.get()))
        .bind(claim.claim_amount)
        .bind(claim.treatment_date)
        .bind(&claim.treatment_details)
        .bind(DbClaimStatus::from(claim.status))
        .bind(claim.submitted_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.into())
    }

    async fn update_claim(&mut self, claim: &Claim, expected: ClaimStatus) -> Result<bool, PortError> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                treatment_description = $2,
                policy_id = $3,
                hospital_id = $4,
                treatment_id = $5,
                claim_amount = $6,
                approved_amount = $7,
                treatment_date = $8,
                treatment_details = $9,
                status = $10,
                reviewed_by = $11,
                rejection_reason = $12,
                reviewed_at = $13,
                processed_at = $14
            WHERE id = $1 AND status = $15
            "#,
        )
        .bind(claim.id.get())
        .bind(&claim.treatment_description)
        .bind(claim.policy_id.map(|id| id.get()))
        .bind(claim.hospital_id.map(|id| id.get()))
        .bind(claim.treatment_id.map(|id| id.get()))
        .bind(claim.claim_amount)
        .bind(claim.approved_amount)
        .bind(claim.treatment_date)
        .bind(&claim.treatment_details)
        .bind(DbClaimStatus::from(claim.status))
        .bind(claim.reviewed_by.map(|id| id.get()))
        .bind(&claim.rejection_reason)
        .bind(claim.reviewed_at)
        .bind(claim.processed_at)
        .bind(DbClaimStatus::from(expected))
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_claim(&mut self, id: ClaimId) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM claims WHERE id = $1")
            .bind(id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(port_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Claim", id));
        }
        Ok(())
    }

    async fn insert_treatment(&mut self, treatment: NewTreatment) -> Result<TreatmentRecord, PortError> {
        let row = sqlx::query_as::<_, TreatmentRow>(&format!(
            r#"
            INSERT INTO treatment_records (
                hospital_id, policy_id, customer_id, treatment_date, diagnosis,
                treatment_details, cost, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TREATMENT_COLUMNS
        ))
        .bind(treatment.hospital_id.get())
        .bind(treatment.policy_id.map(|id| id.get()))
        .bind(treatment.customer_id.get())
        .bind(treatment.input.treatment_date)
        .bind(&treatment.input.diagnosis)
        .bind(&treatment.input.treatment_details)
        .bind(treatment.input.cost)
        .bind(treatment.submitted_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.into())
    }

    async fn update_treatment(&mut self, treatment: &TreatmentRecord) -> Result<(), PortError> {
        sqlx::query(
            r#"
            UPDATE treatment_records SET
                policy_id = $2,
                treatment_date = $3,
                diagnosis = $4,
                treatment_details = $5,
                cost = $6
            WHERE id = $1
            "#,
        )
        .bind(treatment.id.get())
        .bind(treatment.policy_id.map(|id| id.get()))
        .bind(treatment.treatment_date)
        .bind(&treatment.diagnosis)
        .bind(&treatment.treatment_details)
        .bind(treatment.cost)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(())
    }

    async fn insert_policy(&mut self, policy: NewPolicy) -> Result<Policy, PortError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            r#"
            INSERT INTO policies (
                policy_number, customer_id, agent_id, plan_id, start_date, end_date,
                status, premium_paid, premium_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8)
            RETURNING {}
            "#,
            POLICY_COLUMNS
        ))
        .bind(&policy.policy_number)
        .bind(policy.customer_id.get())
        .bind(policy.agent_id.map(|id| id.get()))
        .bind(policy.plan_id.get())
        .bind(policy.start_date)
        .bind(policy.end_date)
        .bind(DbPolicyStatus::Active)
        .bind(policy.premium_amount)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.into())
    }

    async fn update_policy(&mut self, policy: &Policy) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE policies SET
                start_date = $2,
                end_date = $3,
                status = $4,
                premium_paid = $5,
                premium_amount = $6
            WHERE id = $1
            "#,
        )
        .bind(policy.id.get())
        .bind(policy.start_date)
        .bind(policy.end_date)
        .bind(DbPolicyStatus::from(policy.status))
        .bind(policy.premium_paid)
        .bind(policy.premium_amount)
        .execute(&mut *self.tx)
        .await
        .map_err(port_error)?;
        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Policy", policy.id));
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Payment, PortError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (
                reference, policy_id, claim_id, amount, payment_type, status,
                payment_date, payment_method
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(&payment.reference)
        .bind(payment.policy_id.get())
        .bind(payment.claim_id.map(|id| id.get()))
        .bind(payment.amount)
        .bind(DbPaymentType::from(payment.payment_type))
        .bind(DbPaymentStatus::from(payment.status))
        .bind(payment.payment_date)
        .bind(&payment.payment_method)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(port_error)?;
        Ok(row.into())
    }

    async fn delete_payments_for_claim(&mut self, claim_id: ClaimId) -> Result<u64, PortError> {
        let result = sqlx::query("DELETE FROM payments WHERE claim_id = $1")
            .bind(claim_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(port_error)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(port_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::HospitalId;

    #[test]
    fn test_like_escaping() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_sort_expressions_come_from_allow_list() {
        assert_eq!(sort_expression(ClaimSortField::ClaimNumber), "c.claim_number");
        assert_eq!(sort_expression(ClaimSortField::Status), "c.status::text");
    }

    #[test]
    fn test_scope_predicates() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        let managed = ClaimScope::hospitals(vec![HospitalId::new(4), HospitalId::new(50)]);
        push_filters(&mut builder, &managed, None);
        assert!(builder.sql().contains("c.hospital_id = ANY($1)"));

        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_scope(&mut builder, &managed, "t");
        assert!(builder.sql().contains("t.hospital_id = ANY($1)"));

        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_filters(&mut builder, &ClaimScope::Agent(UserId::new(4)), None);
        assert!(builder.sql().contains("p.agent_id = $1"));

        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_filters(&mut builder, &ClaimScope::hospitals(Vec::new()), None);
        assert!(builder.sql().ends_with("AND FALSE"));
    }

    #[test]
    fn test_treatment_columns_are_qualified() {
        let columns = qualified(TREATMENT_COLUMNS, "t");
        assert!(columns.starts_with("t.id, t.hospital_id"));
        assert!(columns.ends_with("t.submitted_at"));
    }

    #[test]
    fn test_search_binds_three_patterns() {
        let query = ClaimListQuery {
            search: Some("Fracture".into()),
            archived: Some(true),
            ..ClaimListQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_filters(&mut builder, &ClaimScope::All, Some(&query));
        let sql = builder.sql();
        assert!(sql.contains("IN ('paid', 'rejected')"));
        assert!(sql.contains("$3"));
        assert!(!sql.contains("$4"));
    }
}

//! Database Test Utilities
//!
//! Testcontainer management for PostgreSQL integration tests, plus seeding of
//! the reference rows (users, hospitals, plans, policies) the claims engine
//! expects to exist.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

use core_kernel::{HospitalId, PlanId, PolicyId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::DateFixtures;

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "claims_test";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A PostgreSQL test container with the claims schema migrated
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container and runs the migrations
    pub async fn new() -> Result<Self, BoxError> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            host,
            port,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        infra_db::run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all data while preserving the schema
    pub async fn clear_data(&self) -> Result<(), BoxError> {
        sqlx::query(
            "TRUNCATE TABLE notifications, payments, claims, treatment_records, policies, plans, \
             hospitals, users RESTART IDENTITY CASCADE",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Shared container for tests that only read or use disjoint rows
///
/// # Panics
///
/// Panics if the database fails to initialize
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}

/// Ids of the rows inserted by [`seed_reference_data`]
#[derive(Debug, Clone, Copy)]
pub struct SeededIds {
    pub customer: UserId,
    /// Customer with no policies yet
    pub new_customer: UserId,
    pub officer: UserId,
    pub manager: UserId,
    pub agent: UserId,
    pub hospital: HospitalId,
    /// Second hospital run by the same manager
    pub second_hospital: HospitalId,
    pub plan: PlanId,
    /// Paid policy with a 10000 coverage limit
    pub paid_policy: PolicyId,
    /// Unpaid policy on the same plan
    pub unpaid_policy: PolicyId,
}

async fn insert_user(pool: &PgPool, name: &str, role: &str) -> Result<UserId, BoxError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (full_name, email, role) VALUES ($1, $2, $3::user_role) RETURNING id",
    )
    .bind(name)
    .bind(format!("{}@example.test", name.to_lowercase().replace(' ', ".")))
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(UserId::new(id))
}

async fn insert_policy(
    pool: &PgPool,
    number: &str,
    customer: UserId,
    agent: UserId,
    plan_id: i64,
    premium: Decimal,
    paid: bool,
) -> Result<PolicyId, BoxError> {
    let start = DateFixtures::policy_start();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO policies (policy_number, customer_id, agent_id, plan_id, start_date, end_date,
                              premium_paid, premium_amount)
        VALUES ($1, $2, $3, $4, $5, $5 + INTERVAL '12 months', $6, $7)
        RETURNING id
        "#,
    )
    .bind(number)
    .bind(customer.get())
    .bind(agent.get())
    .bind(plan_id)
    .bind(start)
    .bind(paid)
    .bind(premium)
    .fetch_one(pool)
    .await?;
    if paid {
        sqlx::query(
            "INSERT INTO payments (reference, policy_id, amount, payment_type, payment_date, payment_method) \
             VALUES ($1, $2, $3, 'premium', NOW(), 'Card')",
        )
        .bind(format!("PAY-{:08X}", id))
        .bind(id)
        .bind(premium)
        .execute(pool)
        .await?;
    }
    Ok(PolicyId::new(id))
}

async fn insert_hospital(pool: &PgPool, name: &str, manager: UserId) -> Result<HospitalId, BoxError> {
    let id: i64 = sqlx::query_scalar("INSERT INTO hospitals (name, user_id) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(manager.get())
        .fetch_one(pool)
        .await?;
    Ok(HospitalId::new(id))
}

/// Inserts users, two hospitals under one manager, one plan and a paid and an
/// unpaid policy
pub async fn seed_reference_data(pool: &PgPool) -> Result<SeededIds, BoxError> {
    let customer = insert_user(pool, "Dana Customer", "customer").await?;
    let new_customer = insert_user(pool, "Noor Customer", "customer").await?;
    let officer = insert_user(pool, "Omar Officer", "claims_officer").await?;
    let manager = insert_user(pool, "Mia Manager", "hospital_manager").await?;
    let agent = insert_user(pool, "Alex Agent", "insurance_agent").await?;

    let hospital = insert_hospital(pool, "City General Hospital", manager).await?;
    let second_hospital = insert_hospital(pool, "Northgate Infirmary", manager).await?;

    let premium = dec!(1200.00);
    let plan_id: i64 = sqlx::query_scalar(
        "INSERT INTO plans (name, premium_amount, coverage_limit, duration_in_months) \
         VALUES ('Gold Care', $1, $2, 12) RETURNING id",
    )
    .bind(premium)
    .bind(dec!(10000))
    .fetch_one(pool)
    .await?;

    let paid_policy = insert_policy(pool, "POL-0000A001", customer, agent, plan_id, premium, true).await?;
    let unpaid_policy = insert_policy(pool, "POL-0000A002", customer, agent, plan_id, premium, false).await?;

    Ok(SeededIds {
        customer,
        new_customer,
        officer,
        manager,
        agent,
        hospital,
        second_hospital,
        plan: PlanId::new(plan_id),
        paid_policy,
        unpaid_policy,
    })
}

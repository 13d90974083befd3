//! PostgreSQL Capability Directory
//!
//! Resolves hospitals, user roles and claims officers from the `hospitals` and
//! `users` tables.
//! Ties are broken by lowest id so the same question always yields the same answer.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, HospitalId, PortError, Role, UserId};
use domain_claims::{CapabilityDirectory, Hospital};

use crate::error::port_error;
use crate::repositories::claims::HospitalRow;

#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgDirectory {}

#[async_trait]
impl HealthCheckable for PgDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => HealthCheckResult::healthy(
                "postgres-directory",
                start.elapsed().as_millis() as u64,
            ),
            Err(e) => HealthCheckResult::unhealthy("postgres-directory", format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl CapabilityDirectory for PgDirectory {
    #[instrument(skip(self), fields(hospital_id = %id))]
    async fn hospital(&self, id: HospitalId) -> Result<Option<Hospital>, PortError> {
        let row = sqlx::query_as::<_, HospitalRow>("SELECT id, name, user_id FROM hospitals WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(port_error)?;
        Ok(row.map(Hospital::from))
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn hospitals_managed_by(&self, user: UserId) -> Result<Vec<Hospital>, PortError> {
        let rows = sqlx::query_as::<_, HospitalRow>(
            "SELECT id, name, user_id FROM hospitals WHERE user_id = $1 ORDER BY id",
        )
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(rows.into_iter().map(Hospital::from).collect())
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn role_of(&self, user: UserId) -> Result<Option<Role>, PortError> {
        let role = sqlx::query_scalar::<_, String>("SELECT role::text FROM users WHERE id = $1 AND is_active")
            .bind(user.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(port_error)?;
        role.map(|raw| {
            raw.parse::<Role>()
                .map_err(|e| PortError::internal(format!("user {} has unreadable role: {}", user, e)))
        })
        .transpose()
    }

    async fn pick_reviewing_officer(&self) -> Result<Option<UserId>, PortError> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE role = 'claims_officer' AND is_active ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?;
        Ok(id.map(UserId::new))
    }
}

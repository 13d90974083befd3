//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the claims ledger using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`]: row types, PostgreSQL enum mappings and column lists
//! - [`adapters`]: implementations of the `domain_claims` ports
//! - [`pool`]: connection pool configuration and migrations
//!
//! Lifecycle operations run in a single database transaction. Claims and
//! policies are read with `FOR UPDATE`, and claim writes are conditional on
//! the status that was read, so concurrent transitions of one claim serialize.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! run_migrations(&pool).await?;
//! let ledger = PgLedgerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PgDirectory, PgLedgerStore, PgNotificationSink};

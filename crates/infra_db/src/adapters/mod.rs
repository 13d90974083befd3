//! Domain Adapters
//!
//! PostgreSQL implementations of the claims domain ports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_claims::ClaimsEngine;
//! use infra_db::adapters::{PgDirectory, PgLedgerStore, PgNotificationSink};
//!
//! let engine = ClaimsEngine::new(
//!     Arc::new(PgLedgerStore::new(pool.clone())),
//!     Arc::new(PgDirectory::new(pool.clone())),
//!     Arc::new(PgNotificationSink::new(pool)),
//! );
//! ```

pub mod directory;
pub mod ledger;
pub mod notifications;

pub use directory::PgDirectory;
pub use ledger::{PgLedgerStore, PgLedgerTransaction};
pub use notifications::PgNotificationSink;

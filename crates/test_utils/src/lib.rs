//! Test Utilities Crate
//!
//! Shared test infrastructure for the claims workspace.
//!
//! # Modules
//!
//! - `fixtures`: well-known users and a seeded in-memory claims scenario
//! - `builders`: builders for plans, policies, treatments, hospitals and claims
//! - `database`: PostgreSQL testcontainers and reference-data seeding
//! - `assertions`: error and ledger-invariant assertions
//! - `generators`: property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

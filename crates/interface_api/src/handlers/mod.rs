//! Request handlers

pub mod claims;
pub mod health;
pub mod notifications;
pub mod policies;
pub mod premiums;
pub mod treatments;

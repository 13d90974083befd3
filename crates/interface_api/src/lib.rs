//! HTTP API Layer
//!
//! This crate exposes the claims lifecycle engine over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Thin adapters over `ClaimsEngine` operations
//! - **Middleware**: JWT authentication producing the caller `Identity`, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Domain error kinds mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(ledger, directory, notifier, inbox, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_claims::{
    CapabilityDirectory, ClaimsEngine, Inbox, LedgerStore, NotificationInbox, NotificationSink,
};

use crate::config::ApiConfig;
use crate::handlers::{claims, health, notifications, policies, premiums, treatments};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: ClaimsEngine,
    pub inbox: Inbox,
    pub ledger: Arc<dyn LedgerStore>,
    pub directory: Arc<dyn CapabilityDirectory>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the engine over the given adapters
    ///
    /// `notifier` may queue deliveries; `inbox` reads the store they land in.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        directory: Arc<dyn CapabilityDirectory>,
        notifier: Arc<dyn NotificationSink>,
        inbox: Arc<dyn NotificationInbox>,
        config: ApiConfig,
    ) -> Self {
        let engine = ClaimsEngine::new(ledger.clone(), directory.clone(), notifier);
        Self {
            engine,
            inbox: Inbox::new(inbox),
            ledger,
            directory,
            config,
        }
    }
}

/// Creates the main API router
///
/// Public health routes sit at the root; everything under `/api/v1` requires a
/// bearer token.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Claims routes
    let claims_routes = Router::new()
        .route("/", post(claims::initiate_claim).get(claims::list_claims))
        .route("/submit", post(claims::submit_claim))
        .route("/:id", get(claims::get_claim).delete(claims::delete_claim))
        .route("/:id/description", put(claims::update_description))
        .route("/:id/treatment", put(claims::hospital_update))
        .route("/:id/finalize", post(claims::finalize_claim))
        .route("/:id/review/start", post(claims::begin_review))
        .route("/:id/review", post(claims::review_claim));

    // Policy lifecycle and premium routes
    let policy_routes = Router::new()
        .route("/", post(policies::enroll_policy))
        .route("/:id/premium", post(premiums::pay_premium))
        .route("/:id/renew", post(policies::renew_policy))
        .route("/:id/toggle-status", post(policies::toggle_policy_status));

    // Hospital treatment routes
    let treatment_routes = Router::new()
        .route("/", post(treatments::submit_treatment).get(treatments::list_treatments))
        .route("/:id", put(treatments::update_treatment));

    // Caller's notification inbox
    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/read-all", put(notifications::mark_all_read))
        .route("/:id/read", put(notifications::mark_read));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/policies", policy_routes)
        .nest("/treatments", treatment_routes)
        .nest("/notifications", notification_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

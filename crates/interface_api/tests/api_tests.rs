//! HTTP API tests
//!
//! Drive the full router (auth, audit, handlers) over the in-memory adapters.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::Identity;
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{assert_ledger_consistent, ClaimsScenario, Users};

static CONFIG: Lazy<ApiConfig> = Lazy::new(|| ApiConfig {
    jwt_secret: "api-test-secret".to_string(),
    ..ApiConfig::default()
});

async fn app() -> (Router, ClaimsScenario) {
    let s = ClaimsScenario::seeded().await;
    let state = AppState::new(
        Arc::new(s.ledger.clone()),
        s.directory.clone(),
        s.notifier.clone(),
        s.notifier.clone(),
        CONFIG.clone(),
    );
    (create_router(state), s)
}

fn bearer(identity: &Identity) -> String {
    format!(
        "Bearer {}",
        create_token(identity, &CONFIG.jwt_secret, 300).unwrap()
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    identity: Option<Identity>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder.header("authorization", bearer(&identity));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Reads a decimal that may be serialized as a string or a number
fn amount(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

fn treatment_body(cost: &str) -> Value {
    json!({
        "diagnosis": "Fracture",
        "treatment_details": "Cast applied",
        "cost": cost,
        "treatment_date": "2025-03-01"
    })
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_adapters() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["adapters"].as_array().unwrap().len(), 2);
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let (app, _) = app().await;
        let (status, body) = send(&app, Method::GET, "/api/v1/claims", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_token_signed_with_another_secret_is_rejected() {
        let (app, _) = app().await;
        let forged = create_token(&Users::admin(), "not-the-secret", 300).unwrap();
        let request = Request::builder()
            .uri("/api/v1/claims")
            .header("authorization", format!("Bearer {}", forged))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_identity_comes_from_token_not_payload() {
        let (app, s) = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/claims",
            Some(Users::customer()),
            Some(json!({
                "policy_id": s.gold_policy.get(),
                "hospital_id": s.hospital.id.get(),
                "description": "Sprained ankle",
                "customer_id": Users::OTHER_CUSTOMER.get()
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["customer_id"], Users::CUSTOMER.get());
    }
}

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_initiate_to_paid_over_http() {
        let (app, s) = app().await;

        let (status, claim) = send(
            &app,
            Method::POST,
            "/api/v1/claims",
            Some(Users::customer()),
            Some(json!({
                "policy_id": s.gold_policy.get(),
                "hospital_id": s.hospital.id.get(),
                "description": "Fell from a ladder"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(claim["status"], "Initiated");
        assert!(claim["claim_number"].as_str().unwrap().starts_with("CLM-"));
        let id = claim["id"].as_i64().unwrap();

        let (status, claim) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/claims/{}/treatment", id),
            Some(Users::hospital_manager()),
            Some(treatment_body("5000.00")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claim["status"], "AwaitingPolicy");
        assert_eq!(claim["treatment_date"], "2025-03-01");

        let (status, claim) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/finalize", id),
            Some(Users::customer()),
            Some(json!({ "policy_id": s.gold_policy.get() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claim["status"], "Submitted");
        assert_eq!(amount(&claim["claim_amount"]), dec!(5000));

        let (status, claim) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/review/start", id),
            Some(Users::officer()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claim["status"], "InReview");

        let (status, review) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/review", id),
            Some(Users::officer()),
            Some(json!({ "approve": true, "approved_amount": "4500.00" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(review["claim"]["status"], "Paid");
        assert_eq!(amount(&review["payment"]["amount"]), dec!(4500));
        assert_eq!(review["payment"]["payment_type"], "Payout");

        let (status, claim) = send(
            &app,
            Method::GET,
            &format!("/api/v1/claims/{}", id),
            Some(Users::customer()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claim["status"], "Paid");

        assert_ledger_consistent(&s.ledger.snapshot().await);
    }

    #[tokio::test]
    async fn test_rejection_over_http() {
        let (app, s) = app().await;
        let claim = s.submitted_claim(dec!(2000)).await;

        let (status, review) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/review", claim.id),
            Some(Users::officer()),
            Some(json!({ "approve": false, "rejection_reason": "Pre-existing condition" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(review["claim"]["status"], "Rejected");
        assert_eq!(review["claim"]["rejection_reason"], "Pre-existing condition");
        assert!(review.get("payment").is_none());
    }

    #[tokio::test]
    async fn test_delete_and_describe() {
        let (app, s) = app().await;
        let claim = s.initiated_claim().await;

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/claims/{}/description", claim.id),
            Some(Users::customer()),
            Some(json!({ "description": "Fell from a tall ladder" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["treatment_description"], "Fell from a tall ladder");

        let (status, deleted) = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/claims/{}", claim.id),
            Some(Users::customer()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["payments_removed"], 0);
        assert!(s.ledger.claim(claim.id).await.is_none());
    }
}

mod error_mapping_tests {
    use super::*;

    #[tokio::test]
    async fn test_wrong_role_is_forbidden() {
        let (app, s) = app().await;
        let claim = s.submitted_claim(dec!(1000)).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/review", claim.id),
            Some(Users::customer()),
            Some(json!({ "approve": true, "approved_amount": "1000" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_reviewing_paid_claim_conflicts() {
        let (app, s) = app().await;
        let claim = s.paid_claim(dec!(3000)).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/review", claim.id),
            Some(Users::officer()),
            Some(json!({ "approve": true, "approved_amount": "3000" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "invalid_state");
        assert_eq!(s.ledger.payouts_for(claim.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_business_rule_is_unprocessable() {
        let (app, s) = app().await;
        let claim = s.submitted_claim(dec!(4000)).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/claims/{}/review", claim.id),
            Some(Users::officer()),
            Some(json!({ "approve": true, "approved_amount": "5000" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "business_rule_violation");
        assert!(body["message"].as_str().unwrap().contains("exceeds the claimed amount"));
    }

    #[tokio::test]
    async fn test_foreign_claim_reads_as_missing() {
        let (app, s) = app().await;
        let claim = s.initiated_claim().await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/v1/claims/{}", claim.id),
            Some(Users::other_customer()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_invalid_body_lists_fields() {
        let (app, s) = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/claims",
            Some(Users::customer()),
            Some(json!({
                "policy_id": s.gold_policy.get(),
                "hospital_id": s.hospital.id.get(),
                "description": "   "
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"], json!(["description: must not be blank"]));
        assert!(s.ledger.snapshot().await.claims.is_empty());
    }
}

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_filters_and_scopes() {
        let (app, s) = app().await;
        s.paid_claim(dec!(3000)).await;
        s.submitted_claim(dec!(4000)).await;
        s.initiated_claim().await;

        let (status, page) = send(&app, Method::GET, "/api/v1/claims", Some(Users::customer()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 3);
        assert_eq!(page["page"], 1);

        let (_, page) = send(
            &app,
            Method::GET,
            "/api/v1/claims?archived=true",
            Some(Users::customer()),
            None,
        )
        .await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["items"][0]["status"], "Paid");

        let (_, page) = send(
            &app,
            Method::GET,
            "/api/v1/claims?page_size=2&sort_by=id&direction=asc",
            Some(Users::officer()),
            None,
        )
        .await;
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
        assert_eq!(page["total_pages"], 2);

        let (_, page) = send(&app, Method::GET, "/api/v1/claims", Some(Users::other_customer()), None).await;
        assert_eq!(page["total"], 0);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_parameters() {
        let (app, _) = app().await;
        let (status, _) = send(
            &app,
            Method::GET,
            "/api/v1/claims?sort_by=password",
            Some(Users::officer()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/v1/claims?page=0", Some(Users::officer()), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod self_service_tests {
    use super::*;

    #[tokio::test]
    async fn test_pay_premium_once() {
        let (app, s) = app().await;
        let uri = format!("/api/v1/policies/{}/premium", s.unpaid_policy);
        let body = json!({ "amount": "1200.00", "payment_method": "Card" });

        let (status, payment) = send(&app, Method::POST, &uri, Some(Users::customer()), Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(payment["reference"].as_str().unwrap().starts_with("PAY-"));
        assert_eq!(payment["payment_type"], "Premium");

        let (status, _) = send(&app, Method::POST, &uri, Some(Users::customer()), Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(Users::customer()),
            Some(json!({ "amount": "0", "payment_method": "Card" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_hospital_treatment_entry_and_edit() {
        let (app, s) = app().await;
        let number = s.ledger.policy(s.gold_policy).await.unwrap().policy_number;

        let (status, record) = send(
            &app,
            Method::POST,
            "/api/v1/treatments",
            Some(Users::hospital_manager()),
            Some(json!({
                "policy_number": number.to_lowercase(),
                "treatment": treatment_body("750.00")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["policy_id"], s.gold_policy.get());
        assert_eq!(record["customer_id"], Users::CUSTOMER.get());
        let uri = format!("/api/v1/treatments/{}", record["id"].as_i64().unwrap());

        let (status, edited) = send(
            &app,
            Method::PUT,
            &uri,
            Some(Users::hospital_manager()),
            Some(treatment_body("900.00")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount(&edited["cost"]), dec!(900));

        let (status, _) = send(&app, Method::PUT, &uri, Some(Users::other_manager()), Some(treatment_body("1.00"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/treatments",
            Some(Users::hospital_manager()),
            Some(json!({
                "policy_number": number,
                "treatment": treatment_body("-5")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_manager_picks_hospital_and_lists_treatments() {
        let (app, s) = app().await;
        let northgate = s.second_managed_hospital(50).await;
        let number = s.ledger.policy(s.gold_policy).await.unwrap().policy_number;

        let (status, record) = send(
            &app,
            Method::POST,
            "/api/v1/treatments",
            Some(Users::hospital_manager()),
            Some(json!({
                "policy_number": number,
                "hospital_id": northgate.id.get(),
                "treatment": treatment_body("120.00")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["hospital_id"], northgate.id.get());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/treatments",
            Some(Users::hospital_manager()),
            Some(json!({
                "policy_number": number,
                "hospital_id": s.other_hospital.id.get(),
                "treatment": treatment_body("120.00")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, listed) = send(&app, Method::GET, "/api/v1/treatments", Some(Users::hospital_manager()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        let (_, foreign) = send(&app, Method::GET, "/api/v1/treatments", Some(Users::other_manager()), None).await;
        assert!(foreign.as_array().unwrap().is_empty());
    }
}

mod policy_tests {
    use super::*;

    #[tokio::test]
    async fn test_enroll_renew_and_toggle() {
        let (app, s) = app().await;

        let (status, policy) = send(
            &app,
            Method::POST,
            "/api/v1/policies",
            Some(Users::agent()),
            Some(json!({
                "customer_id": Users::OTHER_CUSTOMER.get(),
                "plan_id": s.basic_plan.id.get(),
                "start_date": "2025-01-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(policy["status"], "Active");
        assert_eq!(policy["premium_paid"], false);
        assert_eq!(policy["agent_id"], Users::AGENT.get());
        let id = policy["id"].as_i64().unwrap();

        let (status, renewed) = send(
            &app,
            Method::POST,
            &format!("/api/v1/policies/{}/renew", id),
            Some(Users::agent()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount(&renewed["premium_amount"]), dec!(648.00));

        let toggle = format!("/api/v1/policies/{}/toggle-status", id);
        let (status, suspended) = send(&app, Method::POST, &toggle, Some(Users::agent()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(suspended["status"], "Suspended");

        let (status, _) = send(&app, Method::POST, &toggle, Some(Users::customer()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_enrollment_errors() {
        let (app, s) = app().await;
        let enroll = |customer: i64| {
            json!({
                "customer_id": customer,
                "plan_id": s.basic_plan.id.get(),
                "start_date": "2025-01-01"
            })
        };

        let (status, body) = send(&app, Method::POST, "/api/v1/policies", Some(Users::agent()), Some(enroll(Users::CUSTOMER.get()))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "business_rule_violation");

        let (status, _) = send(&app, Method::POST, "/api/v1/policies", Some(Users::agent()), Some(enroll(Users::ADMIN.get()))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, Method::POST, "/api/v1/policies", Some(Users::agent()), Some(enroll(999))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::POST, "/api/v1/policies", Some(Users::customer()), Some(enroll(Users::OTHER_CUSTOMER.get()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

mod notification_tests {
    use super::*;

    #[tokio::test]
    async fn test_inbox_routes_are_scoped_to_caller() {
        let (app, s) = app().await;
        s.initiated_claim().await;
        let customer = Some(Users::customer());

        let (status, inbox) = send(&app, Method::GET, "/api/v1/notifications", customer, None).await;
        assert_eq!(status, StatusCode::OK);
        let items = inbox.as_array().unwrap().clone();
        assert!(!items.is_empty());
        assert!(items.iter().all(|n| n["is_read"] == false));
        let first = items[0]["id"].as_i64().unwrap();

        let (_, manager_inbox) = send(&app, Method::GET, "/api/v1/notifications", Some(Users::hospital_manager()), None).await;
        let manager_first = manager_inbox[0]["id"].as_i64().unwrap();
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/notifications/{}/read", manager_first),
            customer,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::PUT, &format!("/api/v1/notifications/{}/read", first), customer, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, unread) = send(&app, Method::GET, "/api/v1/notifications?unread=true", customer, None).await;
        assert_eq!(unread.as_array().unwrap().len(), items.len() - 1);

        let (status, marked) = send(&app, Method::PUT, "/api/v1/notifications/read-all", customer, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(marked["marked"], (items.len() - 1) as u64);
        let (_, unread) = send(&app, Method::GET, "/api/v1/notifications?unread=true", customer, None).await;
        assert!(unread.as_array().unwrap().is_empty());

        let (_, manager_unread) = send(&app, Method::GET, "/api/v1/notifications?unread=true", Some(Users::hospital_manager()), None).await;
        assert_eq!(manager_unread.as_array().unwrap().len(), manager_inbox.as_array().unwrap().len());

        let (status, _) = send(&app, Method::GET, "/api/v1/notifications", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

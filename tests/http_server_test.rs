//! HTTP Server Integration Tests

mod fixtures;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use fixtures::{base_time, test_config, Harness};
use portfolio_guard::clock::Clock;
use portfolio_guard::http_server::{build_router, AppState};
use portfolio_guard::session::{
    hash_password, AdminAccount, AdminCredentials, AdminRepository, InMemoryAdminRepository,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "correct-horse-battery";

async fn app_with(harness: &Harness) -> Router {
    let admins = InMemoryAdminRepository::new();
    admins
        .insert(AdminCredentials {
            account: AdminAccount::new(1, "owner"),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        })
        .await;
    let admins: Arc<dyn AdminRepository> = Arc::new(admins);
    let clock: Arc<dyn Clock> = harness.clock.clone();

    let state = AppState::new(
        Arc::clone(&harness.config),
        clock,
        harness.logger.clone(),
        admins,
    );
    build_router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-real-ip", "198.51.100.23")
        .header(header::USER_AGENT, "Mozilla/5.0")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn contact_body(consent: Value) -> Value {
    json!({
        "name": "  Lucía Fernández ",
        "email": "lucia@example.es",
        "message": "We need a new brand identity.\n",
        "consent": consent,
        "captcha": "03AGdBq24",
        "_csrf": "token",
    })
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::default();
    let response = app_with(&harness)
        .await
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_privacy_notice_route() {
    let harness = Harness::new(test_config(&[("DATA_RETENTION_DAYS", "180")]));
    let response = app_with(&harness)
        .await
        .oneshot(
            Request::get("/api/privacy/es-AR/retention")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["locale"], "es");
    assert_eq!(body["key"], "retention");
    assert!(body["text"].as_str().unwrap().contains("180 días"));
}

#[tokio::test]
async fn test_contact_without_consent_is_rejected() {
    let harness = Harness::default();
    let mut body = contact_body(Value::Null);
    body.as_object_mut().unwrap().remove("consent");

    let response = app_with(&harness)
        .await
        .oneshot(json_request("POST", "/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CONSENT_REQUIRED");
    assert!(harness.sink.is_empty());
}

#[tokio::test]
async fn test_contact_with_stale_consent_is_rejected() {
    let harness = Harness::default();
    let stale = (base_time() - chrono::Duration::hours(25)).to_rfc3339();
    let body = contact_body(json!({ "contact_form": true, "timestamp": stale }));

    let response = app_with(&harness)
        .await
        .oneshot(json_request("POST", "/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CONSENT_EXPIRED");
}

#[tokio::test]
async fn test_contact_missing_required_field() {
    let harness = Harness::default();
    let mut body = contact_body(json!({ "contact_form": true }));
    body["email"] = json!("   ");

    let response = app_with(&harness)
        .await
        .oneshot(json_request("POST", "/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_contact_submission_is_sanitized_and_logged_masked() {
    let harness = Harness::default();
    let body = contact_body(json!({
        "contact_form": true,
        "timestamp": base_time().to_rfc3339(),
    }));

    let response = app_with(&harness)
        .await
        .oneshot(json_request("POST", "/api/contact", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let submission = &body["submission"];
    assert_eq!(submission["name"], "Lucía Fernández");
    assert_eq!(submission["message"], "We need a new brand identity.");
    assert!(submission.get("consent").is_none());
    assert!(submission.get("captcha").is_none());
    assert!(submission.get("_csrf").is_none());

    let proof = &body["consent"];
    assert_eq!(proof["consentType"], "contact_form");
    assert_eq!(proof["version"], "1.0");
    assert_eq!(proof["ipHash"].as_str().unwrap().len(), 16);

    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    let log = &records[0];
    assert_eq!(log["action"], "contact_submitted");
    assert_eq!(log["metadata"]["email"], "l********s");
    assert_eq!(log["metadata"]["name"], "L********z");
    let line = &harness.sink.lines()[0].1;
    assert!(!line.contains("lucia@example.es"));
}

#[tokio::test]
async fn test_contact_accepts_epoch_millis_and_checkbox_consent() {
    let fresh = (base_time() - chrono::Duration::minutes(5)).timestamp_millis();
    let shapes = [
        json!({ "contact_form": true, "timestamp": fresh }),
        json!({ "contact_form": "on", "timestamp": fresh }),
        json!({ "contact_form": 1, "timestamp": "2026-06-15T13:00:00" }),
        json!({ "contact_form": true, "timestamp": "2026-06-15T13:00:00.000" }),
        json!({ "contact_form": true, "timestamp": "2026-06-15" }),
    ];

    for consent in shapes {
        let harness = Harness::default();
        let response = app_with(&harness)
            .await
            .oneshot(json_request("POST", "/api/contact", contact_body(consent.clone())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED, "{consent}");
    }
}

#[tokio::test]
async fn test_contact_numeric_timestamp_still_expires() {
    let stale = (base_time() - chrono::Duration::hours(25)).timestamp_millis();
    let harness = Harness::default();
    let response = app_with(&harness)
        .await
        .oneshot(json_request(
            "POST",
            "/api/contact",
            contact_body(json!({ "contact_form": true, "timestamp": stale })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CONSENT_EXPIRED");
}

#[tokio::test]
async fn test_contact_falsy_checkbox_is_rejected() {
    let harness = Harness::default();
    let response = app_with(&harness)
        .await
        .oneshot(json_request(
            "POST",
            "/api/contact",
            contact_body(json!({ "contact_form": "", "timestamp": base_time().timestamp_millis() })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "CONSENT_REQUIRED");
}

async fn login(app: Router, password: &str) -> Response {
    app.oneshot(json_request(
        "POST",
        "/api/admin/login",
        json!({ "username": "owner", "password": password }),
    ))
    .await
    .unwrap()
}

#[tokio::test]
async fn test_login_sets_cookie_that_opens_admin_routes() {
    let harness = Harness::default();
    let app = app_with(&harness).await;

    let response = login(app.clone(), ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("admin_session="));
    assert!(set_cookie.contains("HttpOnly"));

    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let response = app
        .oneshot(
            Request::get("/api/admin/session")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["username"], "owner");

    let audits: Vec<Value> = harness
        .sink
        .records()
        .into_iter()
        .filter(|r| r["type"] == "AUDIT")
        .collect();
    assert_eq!(audits.len(), 2);
    assert_eq!(audits[0]["action"], "login");
    assert_eq!(audits[1]["outcome"], "accessed");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let harness = Harness::default();
    let response = login(app_with(&harness).await, "guess").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(response).await["error"], "Invalid credentials");

    let records = harness.sink.records();
    assert_eq!(records[0]["action"], "admin_login_failed");
    assert_eq!(records[0]["actor"], "anonymous");
}

#[tokio::test]
async fn test_admin_session_route_requires_login() {
    let harness = Harness::default();
    let response = app_with(&harness)
        .await
        .oneshot(
            Request::get("/api/admin/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let harness = Harness::default();
    let response = app_with(&harness)
        .await
        .oneshot(json_request("POST", "/api/admin/logout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.starts_with("admin_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

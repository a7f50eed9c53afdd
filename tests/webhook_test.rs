mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp, TEST_CALLBACK_TOKEN};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_payment_provider() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payment_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pr_123",
            "payment_method": {
                "id": "pm_456",
                "qr_code": {
                    "channel_properties": { "qr_string": "QR-PAYLOAD" }
                }
            }
        })))
        .mount(&server)
        .await;

    server
}

async fn create_order(app: &TestApp) -> String {
    let category = app.seed_category("Drinks").await;
    let coffee = app.seed_product(category.id, "Coffee", dec!(10000)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "product_id": coffee.id, "quantity": 1 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    created["order"]["id"].as_str().unwrap().to_string()
}

fn webhook_body(event_id: &str, reference_id: &str, status: &str) -> Value {
    json!({
        "event": "payment.succeeded",
        "data": {
            "id": event_id,
            "reference_id": reference_id,
            "status": status
        }
    })
}

#[tokio::test]
async fn webhook_rejects_missing_or_wrong_token() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let order_id = create_order(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-1", &order_id, "SUCCEEDED")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-1", &order_id, "SUCCEEDED")),
            &[("x-callback-token", "wrong-token")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The rejected deliveries must not have touched the order
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}/payment-status", order_id),
            None,
        )
        .await;
    let status = read_json(response).await;
    assert_eq!(status["paid"], false);
}

#[tokio::test]
async fn webhook_rejects_everything_when_no_token_is_configured() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider_without_webhook_token(&provider.uri()).await;
    let order_id = create_order(&app).await;

    // No header, then an arbitrary header; both must fail closed
    let response = app
        .request(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-open", &order_id, "SUCCEEDED")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-open", &order_id, "SUCCEEDED")),
            &[("x-callback-token", "anything")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}/payment-status", order_id),
            None,
        )
        .await;
    let status = read_json(response).await;
    assert_eq!(status["paid"], false);
}

#[tokio::test]
async fn webhook_only_accepts_post() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;

    let response = app
        .request(Method::GET, "/api/v1/payments/webhook", None)
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn webhook_with_unknown_reference_returns_not_found() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;

    for reference in ["00000000-0000-0000-0000-000000000000", "not-a-uuid"] {
        let response = app
            .request_with_headers(
                Method::POST,
                "/api/v1/payments/webhook",
                Some(webhook_body("evt-unknown", reference, "SUCCEEDED")),
                &[("x-callback-token", TEST_CALLBACK_TOKEN)],
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn non_success_status_leaves_the_order_unpaid() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let order_id = create_order(&app).await;

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-failed", &order_id, "FAILED")),
            &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ignored");

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let order = read_json(response).await;
    assert_eq!(order["status"], "AWAITING_PAYMENT");
    assert!(order["paid_at"].is_null());
}

#[tokio::test]
async fn replayed_delivery_is_not_applied_twice() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let order_id = create_order(&app).await;

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-replay", &order_id, "SUCCEEDED")),
            &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "payment applied");

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let first_paid_at = read_json(response).await["paid_at"]
        .as_str()
        .unwrap()
        .to_string();

    // Same provider event id delivered again
    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-replay", &order_id, "SUCCEEDED")),
            &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "already processed");

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let order = read_json(response).await;
    assert_eq!(order["status"], "PROCESSING");
    assert_eq!(order["paid_at"].as_str().unwrap(), first_paid_at);
}

#[tokio::test]
async fn concurrent_duplicate_deliveries_both_acknowledge() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let order_id = create_order(&app).await;

    let deliver = || {
        app.request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-race", &order_id, "SUCCEEDED")),
            &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        )
    };

    let (first, second) = tokio::join!(deliver(), deliver());
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let bodies = [read_json(first).await, read_json(second).await];
    let applied = bodies
        .iter()
        .filter(|b| b["status"] == "payment applied")
        .count();
    assert_eq!(applied, 1, "exactly one delivery applies the payment");

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let order = read_json(response).await;
    assert_eq!(order["status"], "PROCESSING");
}

#[tokio::test]
async fn success_after_processing_is_ignored() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let order_id = create_order(&app).await;

    app.request_with_headers(
        Method::POST,
        "/api/v1/payments/webhook",
        Some(webhook_body("evt-a", &order_id, "SUCCEEDED")),
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
    )
    .await;

    // A different event id for the same, already-paid order
    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(webhook_body("evt-b", &order_id, "SUCCEEDED")),
            &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ignored");
}

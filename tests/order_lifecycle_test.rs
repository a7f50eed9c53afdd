mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp, TEST_CALLBACK_TOKEN};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn decimal_field(value: &Value, key: &str) -> Decimal {
    Decimal::from_str(value[key].as_str().expect("decimal field should be a string"))
        .expect("decimal field should parse")
}

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

async fn seeded_order_payload(app: &TestApp) -> Value {
    let category = app.seed_category("Drinks").await;
    let coffee = app.seed_product(category.id, "Coffee", dec!(10000)).await;
    let cake = app.seed_product(category.id, "Cake", dec!(5000)).await;

    json!({
        "items": [
            { "product_id": coffee.id, "quantity": 2 },
            { "product_id": cake.id, "quantity": 1 }
        ]
    })
}

async fn deliver_success_webhook(app: &TestApp, order_id: &str, event_id: &str) -> StatusCode {
    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/payments/webhook",
            Some(json!({
                "event": "payment.succeeded",
                "data": {
                    "id": event_id,
                    "reference_id": order_id,
                    "status": "SUCCEEDED"
                }
            })),
            &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        )
        .await;
    response.status()
}

#[tokio::test]
async fn order_creation_computes_totals_and_returns_qr() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let payload = seeded_order_payload(&app).await;

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;

    let order = &created["order"];
    assert_eq!(decimal_field(order, "subtotal"), dec!(25000));
    assert_eq!(decimal_field(order, "tax"), dec!(2500));
    assert_eq!(decimal_field(order, "grand_total"), dec!(27500));
    assert_eq!(order["status"], "AWAITING_PAYMENT");
    assert_eq!(order["external_transaction_id"], "pr_123");
    assert_eq!(created["qr_string"], "QR-PAYLOAD");
    assert_eq!(created["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn order_with_empty_items_is_rejected() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(json!({ "items": [] })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_with_unknown_product_is_rejected() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [
                    { "product_id": "00000000-0000-0000-0000-000000000000", "quantity": 1 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn provider_failure_surfaces_as_bad_gateway_but_keeps_the_order() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_requests"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&provider)
        .await;

    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let payload = seeded_order_payload(&app).await;

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The order row survives the provider failure, without a payment reference.
    let response = app.request(Method::GET, "/api/v1/orders", None).await;
    let orders = read_json(response).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "AWAITING_PAYMENT");
}

#[tokio::test]
async fn full_lifecycle_from_checkout_to_done() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let payload = seeded_order_payload(&app).await;

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    let created = read_json(response).await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    // Not paid yet
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}/payment-status", order_id),
            None,
        )
        .await;
    let status = read_json(response).await;
    assert_eq!(status["paid"], false);

    // Finishing an unpaid order is rejected
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/finish", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Provider settles the payment
    assert_eq!(
        deliver_success_webhook(&app, &order_id, "evt-1").await,
        StatusCode::OK
    );

    let response = app
        .request(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    let order = read_json(response).await;
    assert_eq!(order["status"], "PROCESSING");
    assert!(order["paid_at"].is_string());

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}/payment-status", order_id),
            None,
        )
        .await;
    let status = read_json(response).await;
    assert_eq!(status["paid"], true);

    // Complete the order
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/finish", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let finished = read_json(response).await;
    assert_eq!(finished["status"], "DONE");

    // DONE is terminal
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/finish", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn order_listing_filters_by_status() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let payload = seeded_order_payload(&app).await;

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(payload.clone()))
        .await;
    let first = read_json(response).await;
    let first_id = first["order"]["id"].as_str().unwrap().to_string();
    app.request(Method::POST, "/api/v1/orders", Some(payload))
        .await;

    deliver_success_webhook(&app, &first_id, "evt-filter").await;

    let response = app
        .request(Method::GET, "/api/v1/orders?status=PROCESSING", None)
        .await;
    let processing = read_json(response).await;
    let processing = processing.as_array().unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0]["id"], first_id.as_str());
    assert_eq!(processing[0]["item_count"], 2);

    let response = app
        .request(Method::GET, "/api/v1/orders?status=ALL", None)
        .await;
    let all = read_json(response).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sales_report_counts_revenue_from_paid_orders() {
    let provider = mock_payment_provider().await;
    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let payload = seeded_order_payload(&app).await;

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    let created = read_json(response).await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    deliver_success_webhook(&app, &order_id, "evt-report").await;
    app.request(
        Method::POST,
        &format!("/api/v1/orders/{}/finish", order_id),
        None,
    )
    .await;

    let response = app.request(Method::GET, "/api/v1/reports/sales", None).await;
    let report = read_json(response).await;
    assert_eq!(decimal_field(&report, "total_revenue"), dec!(27500));
    assert_eq!(report["total_ongoing_orders"], 0);
    assert_eq!(report["total_completed_orders"], 1);
}

#[tokio::test]
async fn simulate_payment_drives_the_provider() {
    let provider = mock_payment_provider().await;
    Mock::given(method("POST"))
        .and(path("/payment_methods/pm_456/payments/simulate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "PENDING" })))
        .mount(&provider)
        .await;

    let app = TestApp::with_payment_provider(&provider.uri()).await;
    let payload = seeded_order_payload(&app).await;

    let response = app.request(Method::POST, "/api/v1/orders", Some(payload)).await;
    let created = read_json(response).await;
    let order_id = created["order"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{}/simulate-payment", order_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn unknown_order_returns_not_found() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/orders/00000000-0000-0000-0000-000000000000",
        "/api/v1/orders/00000000-0000-0000-0000-000000000000/payment-status",
    ] {
        let response = app.request(Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders/00000000-0000-0000-0000-000000000000/finish",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

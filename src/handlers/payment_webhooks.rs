use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    services::orders::{PaymentNotification, WebhookOutcome},
    AppState,
};

const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhookBody {
    /// Provider event name, e.g. "payment.succeeded"
    pub event: String,
    pub data: PaymentWebhookData,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentWebhookData {
    /// Provider transaction id
    pub id: String,
    pub amount: Option<rust_decimal::Decimal>,
    pub payment_request_id: Option<String>,
    /// Order id echoed back from the payment request
    pub reference_id: String,
    pub status: String,
}

// POST /api/v1/payments/webhook
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body = PaymentWebhookBody,
    responses(
        (status = 200, description = "Notification processed"),
        (status = 401, description = "Invalid callback token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentWebhookBody>,
) -> Result<impl IntoResponse, ServiceError> {
    // Fails closed: a delivery never matches an unconfigured token, so the
    // webhook rejects everything until payment_webhook_token is set.
    let presented = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    let authorized = match state.config.payment_webhook_token.as_deref() {
        Some(expected) => presented == Some(expected),
        None => false,
    };
    if !authorized {
        warn!("payment webhook rejected: bad callback token");
        return Err(ServiceError::Unauthorized(
            "invalid callback token".to_string(),
        ));
    }

    let outcome = state
        .services
        .orders
        .apply_payment_notification(PaymentNotification {
            provider_event_id: payload.data.id,
            event: payload.event,
            reference_id: payload.data.reference_id,
            status: payload.data.status,
        })
        .await?;

    let message = match outcome {
        WebhookOutcome::Applied => "payment applied",
        WebhookOutcome::DuplicateDelivery => "already processed",
        WebhookOutcome::Ignored => "ignored",
    };

    Ok(Json(json!({ "status": message })))
}

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::orders::{CreateOrderInput, OrderStatusFilter},
    AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderListQuery {
    /// ALL, AWAITING_PAYMENT, PROCESSING or DONE
    #[serde(default)]
    pub status: OrderStatusFilter,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentStatusResponse {
    pub order_id: Uuid,
    pub paid: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order created with QR payment request"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment provider failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.orders.create_order(payload).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses((status = 200, description = "List of orders, newest first")),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_orders(query.status).await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/payment-status",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Whether the order is paid", body = PaymentStatusResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let paid = state.services.orders.payment_status(id).await?;
    Ok(success_response(PaymentStatusResponse { order_id: id, paid }))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/finish",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Order not paid or not processing", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn finish_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.finish_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/simulate-payment",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 202, description = "Simulation requested"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Order has no payment method", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn simulate_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.simulate_payment(id).await?;
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "simulation requested" })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/sales",
    responses((status = 200, description = "Revenue and order counts")),
    tag = "Reports"
)]
pub async fn sales_report(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let report = state.services.orders.sales_report().await?;
    Ok(success_response(report))
}

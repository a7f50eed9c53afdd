use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::carts::{AddToCartInput, CreateCartInput},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemBody {
    /// New quantity; zero removes the item
    pub quantity: i32,
}

#[utoipa::path(
    post,
    path = "/api/v1/carts",
    request_body = CreateCartInput,
    responses((status = 201, description = "Cart created")),
    tag = "Carts"
)]
pub async fn create_cart(
    State(state): State<AppState>,
    Json(payload): Json<CreateCartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.create_cart(payload).await?;
    Ok(created_response(cart))
}

#[utoipa::path(
    get,
    path = "/api/v1/carts/{id}",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart with items"),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.get_cart(id).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    request_body = AddToCartInput,
    responses(
        (status = 200, description = "Item added"),
        (status = 404, description = "Cart or product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Cart is not active", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn add_cart_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddToCartInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.add_item(id, payload).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    put,
    path = "/api/v1/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart id"),
        ("item_id" = Uuid, Path, description = "Cart item id")
    ),
    request_body = UpdateCartItemBody,
    responses(
        (status = 200, description = "Item quantity updated"),
        (status = 404, description = "Cart or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCartItemBody>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state
        .services
        .carts
        .update_item_quantity(id, item_id, payload.quantity)
        .await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    delete,
    path = "/api/v1/carts/{id}/items",
    params(("id" = Uuid, Path, description = "Cart id")),
    responses(
        (status = 200, description = "Cart cleared"),
        (status = 404, description = "Cart not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Carts"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.clear_cart(id).await?;
    Ok(success_response(cart))
}

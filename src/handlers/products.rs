use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::products::CreateProductInput,
    AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ProductListQuery {
    /// Category id to filter by, or "all" for the whole catalog
    pub category_id: Option<String>,
}

impl ProductListQuery {
    fn category_filter(&self) -> Result<Option<Uuid>, ServiceError> {
        match self.category_id.as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => Uuid::parse_str(raw).map(Some).map_err(|_| {
                ServiceError::BadRequest(format!("Invalid category id: {}", raw))
            }),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "List of products"),
        (status = 400, description = "Invalid category filter", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let category_id = query.category_filter()?;
    let products = state.services.products.list_products(category_id).await?;
    Ok(success_response(products))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok(created_response(product))
}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::categories::{CreateCategoryInput, UpdateCategoryInput},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "List of categories with product counts")
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list_categories().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryInput,
    responses(
        (status = 201, description = "Category created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.create_category(payload).await?;
    Ok(created_response(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryInput,
    responses(
        (status = 200, description = "Category updated"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state
        .services
        .categories
        .update_category(id, payload)
        .await?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has products", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.categories.delete_category(id).await?;
    Ok(no_content_response())
}

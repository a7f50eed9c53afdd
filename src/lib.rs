pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use services::AppServices;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

/// Versioned API routes, nested under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    let categories = Router::new()
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/{id}",
            put(handlers::categories::update_category),
        )
        .route(
            "/categories/{id}",
            delete(handlers::categories::delete_category),
        );

    let products = Router::new()
        .route("/products", get(handlers::products::list_products))
        .route("/products", post(handlers::products::create_product));

    let carts = Router::new()
        .route("/carts", post(handlers::carts::create_cart))
        .route("/carts/{id}", get(handlers::carts::get_cart))
        .route("/carts/{id}/items", post(handlers::carts::add_cart_item))
        .route("/carts/{id}/items", delete(handlers::carts::clear_cart))
        .route(
            "/carts/{id}/items/{item_id}",
            put(handlers::carts::update_cart_item),
        );

    let orders = Router::new()
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/orders/{id}/payment-status",
            get(handlers::orders::payment_status),
        )
        .route("/orders/{id}/finish", post(handlers::orders::finish_order))
        .route(
            "/orders/{id}/simulate-payment",
            post(handlers::orders::simulate_payment),
        )
        .route("/reports/sales", get(handlers::orders::sales_report));

    // POST only; other verbs fall through to the router's 405
    let payments = Router::new().route(
        "/payments/webhook",
        post(handlers::payment_webhooks::payment_webhook),
    );

    Router::new()
        .merge(categories)
        .merge(products)
        .merge(carts)
        .merge(orders)
        .merge(payments)
}

/// Full application router including health endpoints and Swagger UI.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}

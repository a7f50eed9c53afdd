use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = r#"
# Storefront API

Point-of-sale storefront backend: catalog management, session carts and the
order lifecycle from checkout through QRIS payment to fulfillment.

## Payment flow

Creating an order issues a QRIS payment request with the external payment
provider and returns the QR payload alongside the order. The provider settles
the payment out of band and notifies `/api/v1/payments/webhook`; a successful
notification moves the order from `AWAITING_PAYMENT` to `PROCESSING`. Paid
orders are completed with `/api/v1/orders/{id}/finish`.

## Error Handling

Errors use a consistent response body with appropriate HTTP status codes:

```json
{
  "error": "Unprocessable Entity",
  "message": "Order is not paid yet",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Categories", description = "Catalog category endpoints"),
        (name = "Products", description = "Catalog product endpoints"),
        (name = "Carts", description = "Session cart endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Payments", description = "Payment provider integration"),
        (name = "Reports", description = "Sales reporting endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,

        // Carts
        crate::handlers::carts::create_cart,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_cart_item,
        crate::handlers::carts::update_cart_item,
        crate::handlers::carts::clear_cart,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::payment_status,
        crate::handlers::orders::finish_order,
        crate::handlers::orders::simulate_payment,
        crate::handlers::orders::sales_report,

        // Webhooks
        crate::handlers::payment_webhooks::payment_webhook,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::readiness_check
    ),
    components(
        schemas(
            // Catalog types
            crate::services::categories::CreateCategoryInput,
            crate::services::categories::UpdateCategoryInput,
            crate::services::categories::CategoryWithCount,
            crate::services::products::CreateProductInput,
            crate::services::products::ProductWithCategory,
            crate::services::products::CategoryRef,

            // Cart types
            crate::services::carts::CreateCartInput,
            crate::services::carts::AddToCartInput,
            crate::services::carts::CartWithItems,
            crate::handlers::carts::UpdateCartItemBody,

            // Order types
            crate::services::orders::CreateOrderInput,
            crate::services::orders::OrderItemInput,
            crate::services::orders::CreatedOrder,
            crate::services::orders::OrderDetails,
            crate::services::orders::OrderSummary,
            crate::services::orders::OrderStatusFilter,
            crate::services::orders::SalesReport,
            crate::handlers::orders::PaymentStatusResponse,
            crate::entities::order::OrderStatus,

            // Webhook types
            crate::handlers::payment_webhooks::PaymentWebhookBody,
            crate::handlers::payment_webhooks::PaymentWebhookData,

            // Health types
            crate::handlers::health::HealthResponse,
            crate::handlers::health::ComponentStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

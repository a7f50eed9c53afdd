use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db,
    entities::{CategoryModel, ProductModel},
    events::{self, EventSender},
    services::categories::CreateCategoryInput,
    services::products::CreateProductInput,
    AppServices, AppState,
};
use tower::ServiceExt;

pub const TEST_CALLBACK_TOKEN: &str = "test-callback-token";

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Construct a test application with the payment provider unconfigured.
    pub async fn new() -> Self {
        Self::build(None, false).await
    }

    /// Construct a test application that talks to a mock payment provider.
    pub async fn with_payment_provider(base_url: &str) -> Self {
        Self::build(Some(base_url), true).await
    }

    /// Construct a test application with a payment provider but no webhook
    /// callback token configured.
    #[allow(dead_code)]
    pub async fn with_payment_provider_without_webhook_token(base_url: &str) -> Self {
        Self::build(Some(base_url), false).await
    }

    async fn build(payment_base: Option<&str>, webhook_token: bool) -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = db_dir.path().join("storefront_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        if let Some(base) = payment_base {
            cfg.payment_api_base = base.to_string();
            cfg.payment_api_key = Some("test-api-key".to_string());
        }
        if webhook_token {
            cfg.payment_webhook_token = Some(TEST_CALLBACK_TOKEN.to_string());
        }

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()), &cfg);

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = storefront_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_category(&self, name: &str) -> CategoryModel {
        self.state
            .services
            .categories
            .create_category(CreateCategoryInput {
                name: name.to_string(),
            })
            .await
            .expect("failed to seed category")
    }

    pub async fn seed_product(
        &self,
        category_id: Uuid,
        name: &str,
        price: Decimal,
    ) -> ProductModel {
        self.state
            .services
            .products
            .create_product(CreateProductInput {
                name: name.to_string(),
                price,
                category_id,
                image_url: format!(
                    "https://images.example.com/{}.png",
                    name.to_lowercase().replace(' ', "-")
                ),
            })
            .await
            .expect("failed to seed product")
    }
}

/// Reads a response body as JSON.
pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not valid json")
}

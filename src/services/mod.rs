pub mod carts;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;

use crate::{config::AppConfig, events::EventSender};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// All application services, wired once at startup and cloned into handlers.
#[derive(Clone)]
pub struct AppServices {
    pub categories: categories::CategoryService,
    pub products: products::ProductService,
    pub carts: carts::CartService,
    pub orders: orders::OrderService,
    pub payments: Arc<payments::PaymentService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        let payments = Arc::new(payments::PaymentService::from_config(config));

        Self {
            categories: categories::CategoryService::new(db.clone(), event_sender.clone()),
            products: products::ProductService::new(db.clone(), event_sender.clone()),
            carts: carts::CartService::new(db.clone(), event_sender.clone()),
            orders: orders::OrderService::new(
                db,
                event_sender,
                payments.clone(),
                config.tax_rate(),
            ),
            payments,
        }
    }
}

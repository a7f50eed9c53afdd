pub mod carts;
pub mod categories;
pub mod common;
pub mod health;
pub mod orders;
pub mod payment_webhooks;
pub mod products;

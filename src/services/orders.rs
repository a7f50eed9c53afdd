use crate::{
    entities::{
        order::{self, OrderStatus},
        order_item, product, webhook_event, Order, OrderItem, OrderItemModel, OrderModel,
        Product, WebhookEvent,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::payments::PaymentService,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderInput {
    #[validate]
    pub items: Vec<OrderItemInput>,
}

/// Monetary breakdown of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

/// Computes order totals from (unit price, quantity) pairs.
/// Exact decimal arithmetic: grand_total == subtotal * (1 + tax_rate).
pub fn order_totals(items: &[(Decimal, i32)], tax_rate: Decimal) -> OrderTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|(price, quantity)| *price * Decimal::from(*quantity))
        .sum();
    let tax = subtotal * tax_rate;

    OrderTotals {
        subtotal,
        tax,
        grand_total: subtotal + tax,
    }
}

/// A freshly built order together with its payment request.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedOrder {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    /// Scannable QR payload returned by the payment provider
    pub qr_string: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Row shape for order listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: Uuid,
    pub grand_total: Decimal,
    pub status: OrderStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub item_count: u64,
}

/// Status filter accepted by the order listing endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusFilter {
    #[default]
    All,
    AwaitingPayment,
    Processing,
    Done,
}

impl OrderStatusFilter {
    fn as_status(self) -> Option<OrderStatus> {
        match self {
            Self::All => None,
            Self::AwaitingPayment => Some(OrderStatus::AwaitingPayment),
            Self::Processing => Some(OrderStatus::Processing),
            Self::Done => Some(OrderStatus::Done),
        }
    }
}

/// Payment notification delivered by the provider webhook.
#[derive(Debug, Clone)]
pub struct PaymentNotification {
    /// Provider transaction id, used as the idempotency key
    pub provider_event_id: String,
    pub event: String,
    /// Order id the provider echoes back
    pub reference_id: String,
    pub status: String,
}

/// Outcome of applying a payment notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The order transitioned to PROCESSING
    Applied,
    /// This provider transaction id was already processed
    DuplicateDelivery,
    /// Valid delivery, but no state change (non-success status, or the
    /// order had already left AWAITING_PAYMENT)
    Ignored,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub total_revenue: Decimal,
    pub total_ongoing_orders: u64,
    pub total_completed_orders: u64,
}

/// Order lifecycle: building orders from the catalog, issuing payment
/// requests, reconciling webhook notifications, and fulfillment.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    payments: Arc<PaymentService>,
    tax_rate: Decimal,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        payments: Arc<PaymentService>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            db,
            event_sender,
            payments,
            tax_rate,
        }
    }

    /// Builds an order from (product, quantity) pairs.
    ///
    /// Prices are resolved from the catalog at call time (last-write-wins,
    /// no price lock). The order and its line items are committed before the
    /// payment request goes out, so a provider failure leaves an order with
    /// no payment reference rather than rolling back the sale.
    #[instrument(skip(self, input), fields(item_count = input.items.len()))]
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<CreatedOrder, ServiceError> {
        input.validate()?;
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "order requires at least one item".to_string(),
            ));
        }

        let product_ids: HashSet<Uuid> = input.items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, _> = Product::find()
            .filter(product::Column::Id.is_in(product_ids.iter().copied()))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        if let Some(missing) = product_ids.iter().find(|id| !products.contains_key(id)) {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                missing
            )));
        }

        let priced: Vec<(Decimal, i32)> = input
            .items
            .iter()
            .map(|item| (products[&item.product_id].price, item.quantity))
            .collect();
        let totals = order_totals(&priced, self.tax_rate);

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let order = order::ActiveModel {
            id: Set(order_id),
            subtotal: Set(totals.subtotal),
            tax: Set(totals.tax),
            grand_total: Set(totals.grand_total),
            status: Set(OrderStatus::AwaitingPayment),
            paid_at: Set(None),
            external_transaction_id: Set(None),
            payment_method_id: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let order = order.insert(&txn).await?;

        let item_models: Vec<order_item::ActiveModel> = input
            .items
            .iter()
            .map(|item| order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                price: Set(products[&item.product_id].price),
                quantity: Set(item.quantity),
                created_at: Set(now),
            })
            .collect();
        OrderItem::insert_many(item_models).exec(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, grand_total = %totals.grand_total, "order created");
        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        // Payment issuance happens after the commit on purpose: the order
        // must survive a provider failure.
        let issued = self
            .payments
            .create_qris(totals.grand_total, order_id)
            .await?;

        let mut order: order::ActiveModel = order.into();
        order.external_transaction_id = Set(Some(issued.transaction_id.clone()));
        order.payment_method_id = Set(Some(issued.payment_method_id.clone()));
        order.updated_at = Set(Some(Utc::now()));
        let order = order.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentRequested {
                order_id,
                transaction_id: issued.transaction_id,
            })
            .await;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(CreatedOrder {
            order,
            items,
            qr_string: issued.qr_string,
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = self.find_order(order_id).await?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderDetails { order, items })
    }

    /// Lists orders, newest first, optionally filtered to one status.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: OrderStatusFilter,
    ) -> Result<Vec<OrderSummary>, ServiceError> {
        let mut query = Order::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = filter.as_status() {
            query = query.filter(order::Column::Status.eq(status));
        }
        let orders = query.all(&*self.db).await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        if !order_ids.is_empty() {
            let items = OrderItem::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .all(&*self.db)
                .await?;
            for item in items {
                *counts.entry(item.order_id).or_insert(0) += 1;
            }
        }

        Ok(orders
            .into_iter()
            .map(|o| OrderSummary {
                item_count: counts.get(&o.id).copied().unwrap_or(0),
                id: o.id,
                grand_total: o.grand_total,
                status: o.status,
                paid_at: o.paid_at,
            })
            .collect())
    }

    /// Whether the order has been paid.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn payment_status(&self, order_id: Uuid) -> Result<bool, ServiceError> {
        let order = self.find_order(order_id).await?;
        Ok(order.paid_at.is_some())
    }

    /// Applies a payment notification from the provider webhook.
    ///
    /// Deliveries are deduplicated on the provider transaction id, and the
    /// AWAITING_PAYMENT -> PROCESSING transition is only applied once, so a
    /// replayed or concurrent delivery cannot double-apply.
    #[instrument(skip(self, notification), fields(provider_event_id = %notification.provider_event_id, status = %notification.status))]
    pub async fn apply_payment_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<WebhookOutcome, ServiceError> {
        let order_id = Uuid::parse_str(&notification.reference_id)
            .map_err(|_| ServiceError::NotFound("Order not found".to_string()))?;

        let txn = self.db.begin().await?;

        let already_processed = WebhookEvent::find()
            .filter(webhook_event::Column::ProviderEventId.eq(notification.provider_event_id.clone()))
            .one(&txn)
            .await?
            .is_some();
        if already_processed {
            info!(provider_event_id = %notification.provider_event_id, "webhook delivery already processed");
            return Ok(WebhookOutcome::DuplicateDelivery);
        }

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let record = webhook_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_event_id: Set(notification.provider_event_id.clone()),
            event: Set(notification.event.clone()),
            order_id: Set(Some(order_id)),
            received_at: Set(Utc::now()),
        };
        if let Err(err) = record.insert(&txn).await {
            // A concurrent delivery can slip past the lookup above; the
            // unique key on provider_event_id decides the loser.
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                info!(provider_event_id = %notification.provider_event_id, "webhook delivery already processed");
                return Ok(WebhookOutcome::DuplicateDelivery);
            }
            return Err(err.into());
        }

        let outcome = if notification.status == "SUCCEEDED" {
            if order.status == OrderStatus::AwaitingPayment {
                let mut order: order::ActiveModel = order.into();
                order.status = Set(OrderStatus::Processing);
                order.paid_at = Set(Some(Utc::now()));
                order.updated_at = Set(Some(Utc::now()));
                order.update(&txn).await?;
                WebhookOutcome::Applied
            } else {
                warn!(order_id = %order_id, "payment success for an order no longer awaiting payment");
                WebhookOutcome::Ignored
            }
        } else {
            info!(order_id = %order_id, status = %notification.status, "non-success payment status; leaving order unchanged");
            WebhookOutcome::Ignored
        };

        txn.commit().await?;

        if outcome == WebhookOutcome::Applied {
            info!(order_id = %order_id, "order marked as paid");
            self.event_sender.send_or_log(Event::OrderPaid(order_id)).await;
        }

        Ok(outcome)
    }

    /// Marks a paid, in-progress order as DONE. Terminal.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn finish_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let order = self.find_order(order_id).await?;

        if order.paid_at.is_none() {
            return Err(ServiceError::Unprocessable(
                "Order is not paid yet".to_string(),
            ));
        }

        if order.status != OrderStatus::Processing {
            return Err(ServiceError::Unprocessable(
                "Order is not processing yet".to_string(),
            ));
        }

        let mut order: order::ActiveModel = order.into();
        order.status = Set(OrderStatus::Done);
        order.updated_at = Set(Some(Utc::now()));
        let order = order.update(&*self.db).await?;

        info!(order_id = %order_id, "order completed");
        self.event_sender
            .send_or_log(Event::OrderCompleted(order_id))
            .await;

        Ok(order)
    }

    /// Asks the provider to settle the order's payment method in test mode.
    /// The actual state change still arrives through the webhook.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn simulate_payment(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let order = self.find_order(order_id).await?;

        let payment_method_id = order.payment_method_id.as_deref().ok_or_else(|| {
            ServiceError::Unprocessable("Order has no payment method yet".to_string())
        })?;

        self.payments
            .simulate_payment(payment_method_id, order.grand_total)
            .await
    }

    /// Revenue over paid orders plus ongoing/completed counts.
    #[instrument(skip(self))]
    pub async fn sales_report(&self) -> Result<SalesReport, ServiceError> {
        let paid_orders = Order::find()
            .filter(order::Column::PaidAt.is_not_null())
            .all(&*self.db)
            .await?;
        let total_revenue: Decimal = paid_orders.iter().map(|o| o.grand_total).sum();

        let total_ongoing_orders = Order::find()
            .filter(order::Column::Status.ne(OrderStatus::Done))
            .count(&*self.db)
            .await?;

        let total_completed_orders = Order::find()
            .filter(order::Column::Status.eq(OrderStatus::Done))
            .count(&*self.db)
            .await?;

        Ok(SalesReport {
            total_revenue,
            total_ongoing_orders,
            total_completed_orders,
        })
    }

    async fn find_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn order_totals_example_from_the_till() {
        // [{price: 10000, qty: 2}, {price: 5000, qty: 1}]
        let totals = order_totals(&[(dec!(10000), 2), (dec!(5000), 1)], dec!(0.1));
        assert_eq!(totals.subtotal, dec!(25000));
        assert_eq!(totals.tax, dec!(2500));
        assert_eq!(totals.grand_total, dec!(27500));
    }

    #[test]
    fn order_totals_empty_is_zero() {
        let totals = order_totals(&[], dec!(0.1));
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }

    #[test]
    fn grand_total_tracks_tax_rate() {
        let totals = order_totals(&[(dec!(19.99), 3)], dec!(0.25));
        assert_eq!(totals.subtotal, dec!(59.97));
        assert_eq!(totals.grand_total, totals.subtotal + totals.tax);
        assert_eq!(totals.grand_total, totals.subtotal * dec!(1.25));
    }

    #[test]
    fn status_filter_maps_to_entity_status() {
        assert_eq!(OrderStatusFilter::All.as_status(), None);
        assert_eq!(
            OrderStatusFilter::Processing.as_status(),
            Some(OrderStatus::Processing)
        );
        assert_eq!(OrderStatusFilter::Done.as_status(), Some(OrderStatus::Done));
    }
}

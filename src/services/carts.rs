use crate::{
    entities::{cart, cart_item, Cart, CartItem, CartModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const CART_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateCartInput {
    /// Browser/till session this cart belongs to
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// A cart together with its line items.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartWithItems {
    #[serde(flatten)]
    pub cart: CartModel,
    pub items: Vec<cart_item::Model>,
}

/// Session-scoped shopping cart management.
///
/// Carts live server-side, keyed by an explicit session id passed by the
/// caller, so cart state survives reloads and is never ambient process
/// state. Item rows snapshot the product name and price at add time; the
/// authoritative price is still resolved from the catalog when the cart
/// becomes an order.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_cart(&self, input: CreateCartInput) -> Result<CartModel, ServiceError> {
        let cart_id = Uuid::new_v4();
        let now = Utc::now();

        let cart = cart::ActiveModel {
            id: Set(cart_id),
            session_id: Set(input.session_id),
            subtotal: Set(Decimal::ZERO),
            status: Set(cart::CartStatus::Active),
            expires_at: Set(now + Duration::days(CART_EXPIRY_DAYS)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let cart = cart.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartCreated(cart_id))
            .await;

        info!(cart_id = %cart_id, "cart created");
        Ok(cart)
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: Uuid) -> Result<CartWithItems, ServiceError> {
        let cart = Cart::find_by_id(cart_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        let items = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(CartWithItems { cart, items })
    }

    /// Adds a product to the cart, incrementing quantity when the product
    /// is already present.
    #[instrument(skip(self, input), fields(cart_id = %cart_id, product_id = %input.product_id))]
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartWithItems, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        let cart = Self::active_cart(&txn, cart_id).await?;

        let product = Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let existing_item = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        if let Some(item) = existing_item {
            let quantity = item.quantity + input.quantity;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.line_total = Set(product.price * Decimal::from(quantity));
            item.unit_price = Set(product.price);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;
        } else {
            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart_id),
                product_id: Set(input.product_id),
                name: Set(product.name.clone()),
                unit_price: Set(product.price),
                quantity: Set(input.quantity),
                line_total: Set(product.price * Decimal::from(input.quantity)),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            item.insert(&txn).await?;
        }

        Self::recalculate_subtotal(&txn, cart.clone()).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id,
                product_id: input.product_id,
            })
            .await;

        self.get_cart(cart_id).await
    }

    /// Updates a cart item's quantity; a quantity of zero removes the item.
    #[instrument(skip(self), fields(cart_id = %cart_id, item_id = %item_id, quantity))]
    pub async fn update_item_quantity(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartWithItems, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = Self::active_cart(&txn, cart_id).await?;

        let item = CartItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        if item.cart_id != cart_id {
            return Err(ServiceError::BadRequest(format!(
                "Cart item {} does not belong to cart {}",
                item_id, cart_id
            )));
        }

        if quantity <= 0 {
            item.delete(&txn).await?;
            Self::recalculate_subtotal(&txn, cart).await?;
            txn.commit().await?;

            self.event_sender
                .send_or_log(Event::CartItemRemoved { cart_id, item_id })
                .await;
        } else {
            let unit_price = item.unit_price;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.line_total = Set(unit_price * Decimal::from(quantity));
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;

            Self::recalculate_subtotal(&txn, cart).await?;
            txn.commit().await?;

            self.event_sender
                .send_or_log(Event::CartItemUpdated { cart_id, item_id })
                .await;
        }

        self.get_cart(cart_id).await
    }

    /// Removes all items from the cart.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn clear_cart(&self, cart_id: Uuid) -> Result<CartWithItems, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = Self::active_cart(&txn, cart_id).await?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await?;

        Self::recalculate_subtotal(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart_id))
            .await;

        self.get_cart(cart_id).await
    }

    async fn active_cart(
        txn: &DatabaseTransaction,
        cart_id: Uuid,
    ) -> Result<CartModel, ServiceError> {
        let cart = Cart::find_by_id(cart_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

        if cart.status != cart::CartStatus::Active {
            return Err(ServiceError::Unprocessable("Cart is not active".to_string()));
        }

        Ok(cart)
    }

    async fn recalculate_subtotal(
        txn: &DatabaseTransaction,
        cart: CartModel,
    ) -> Result<(), ServiceError> {
        let items = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(txn)
            .await?;

        let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();

        let mut cart: cart::ActiveModel = cart.into();
        cart.subtotal = Set(subtotal);
        cart.updated_at = Set(Utc::now());
        cart.update(txn).await?;

        Ok(())
    }
}

use crate::{
    entities::{product, Category, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price");
        err.message = Some("price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    pub category_id: Uuid,
    #[validate(url(message = "image_url must be a valid URL"))]
    pub image_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

/// Product row plus its category reference, as shown on the storefront.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithCategory {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub category: CategoryRef,
}

/// Catalog product management.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists products, optionally restricted to one category.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<ProductWithCategory>, ServiceError> {
        let mut query = Product::find().order_by_asc(product::Column::Name);
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        let products = query.all(&*self.db).await?;

        let categories: HashMap<Uuid, String> = Category::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(products
            .into_iter()
            .map(|p| ProductWithCategory {
                category: CategoryRef {
                    id: p.category_id,
                    name: categories
                        .get(&p.category_id)
                        .cloned()
                        .unwrap_or_default(),
                },
                id: p.id,
                name: p.name,
                price: p.price,
                image_url: p.image_url,
            })
            .collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name, category_id = %input.category_id))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.validate()?;

        Category::find_by_id(input.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", input.category_id))
            })?;

        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            price: Set(input.price),
            category_id: Set(input.category_id),
            image_url: Set(input.image_url),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!(product_id = %product.id, "product created");
        Ok(product)
    }
}

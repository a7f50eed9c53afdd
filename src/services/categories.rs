use crate::{
    entities::{category, product, Category, CategoryModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 3, message = "minimum of 3 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 3, message = "minimum of 3 characters"))]
    pub name: String,
}

/// Category row plus its derived product count.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub product_count: u64,
}

/// Catalog category management.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists all categories with their derived product counts.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryWithCount>, ServiceError> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        let products = Product::find().all(&*self.db).await?;
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for item in products {
            *counts.entry(item.category_id).or_insert(0) += 1;
        }

        Ok(categories
            .into_iter()
            .map(|c| CategoryWithCount {
                product_count: counts.get(&c.id).copied().unwrap_or(0),
                id: c.id,
                name: c.name,
            })
            .collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[instrument(skip(self, input), fields(category_id = %category_id))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        let category = Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", category_id))
            })?;

        let mut category: category::ActiveModel = category.into();
        category.name = Set(input.name);
        category.updated_at = Set(Some(Utc::now()));
        let category = category.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;

        Ok(category)
    }

    /// Deletes a category. Categories still referenced by products are
    /// rejected rather than cascading into the catalog.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let category = Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", category_id))
            })?;

        let product_count = Product::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .count(&*self.db)
            .await?;

        if product_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} still has {} products",
                category_id, product_count
            )));
        }

        category.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!(category_id = %category_id, "category deleted");
        Ok(())
    }
}

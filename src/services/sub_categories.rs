use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::category::{CategoryStatus, Entity as Category};
use crate::entities::sub_category::{self, Entity as SubCategory, Model as SubCategoryModel};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct NewSubCategory {
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: CategoryStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SubCategoryUpdate {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub status: Option<CategoryStatus>,
}

#[derive(Clone)]
pub struct SubCategoryService {
    db: Arc<DatabaseConnection>,
    clock: SharedClock,
}

impl SubCategoryService {
    pub fn new(db: Arc<DatabaseConnection>, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewSubCategory) -> Result<SubCategoryModel, ServiceError> {
        // Parent must exist.
        Category::find_by_id(input.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", input.category_id))
            })?;

        let now = self.clock.now();
        let model = sub_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(input.category_id),
            name: Set(input.name),
            description: Set(input.description),
            image: Set(input.image),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(&*self.db).await.map_err(ServiceError::from)
    }

    /// Active sub-categories only, for the public storefront.
    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<SubCategoryModel>, ServiceError> {
        SubCategory::find()
            .filter(sub_category::Column::Status.eq(CategoryStatus::Active))
            .order_by_asc(sub_category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<SubCategoryModel>, ServiceError> {
        SubCategory::find()
            .order_by_asc(sub_category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_category(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<SubCategoryModel>, ServiceError> {
        SubCategory::find()
            .filter(sub_category::Column::CategoryId.eq(category_id))
            .order_by_asc(sub_category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<SubCategoryModel, ServiceError> {
        SubCategory::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sub-category {} not found", id)))
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: Uuid,
        update: SubCategoryUpdate,
    ) -> Result<SubCategoryModel, ServiceError> {
        let existing = self.find_by_id(id).await?;

        if let Some(category_id) = update.category_id {
            Category::find_by_id(category_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Category {} not found", category_id))
                })?;
        }

        let mut model: sub_category::ActiveModel = existing.into();
        if let Some(category_id) = update.category_id {
            model.category_id = Set(category_id);
        }
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(image) = update.image {
            model.image = Set(image);
        }
        if let Some(status) = update.status {
            model.status = Set(status);
        }
        model.updated_at = Set(self.clock.now());

        model.update(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = SubCategory::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Sub-category {} not found",
                id
            )));
        }
        Ok(())
    }
}

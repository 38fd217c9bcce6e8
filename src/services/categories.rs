use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::category::{
    self, CategoryStatus, Entity as Category, Model as CategoryModel,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: CategoryStatus,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub status: Option<CategoryStatus>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    clock: SharedClock,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewCategory) -> Result<CategoryModel, ServiceError> {
        let now = self.clock.now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            image: Set(input.image),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(&*self.db).await.map_err(ServiceError::from)
    }

    /// Active categories only, for the public storefront.
    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Category::find()
            .filter(category::Column::Status.eq(CategoryStatus::Active))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        Category::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: Uuid,
        update: CategoryUpdate,
    ) -> Result<CategoryModel, ServiceError> {
        let existing = self.find_by_id(id).await?;

        let mut model: category::ActiveModel = existing.into();
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
        let result = Category::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }
}

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::product::Entity as Product;
use crate::entities::review::{self, Entity as Review, Model as ReviewModel, ReviewStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Average rating over approved reviews, rounded to one decimal place.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProductRating {
    pub average: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: SharedClock,
}

impl ReviewService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        clock: SharedClock,
    ) -> Self {
        Self {
            db,
            event_sender,
            clock,
        }
    }

    /// Creates a pending review. One review per (user, product).
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: Uuid,
        input: NewReview,
    ) -> Result<ReviewModel, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let existing = Review::find()
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::ProductId.eq(input.product_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "You have already reviewed this product".to_string(),
            ));
        }

        let now = self.clock.now();
        let model = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(input.product_id),
            rating: Set(input.rating),
            comment: Set(input.comment),
            status: Set(ReviewStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ReviewSubmitted {
                review_id: saved.id,
                product_id: saved.product_id,
            })
            .await;
        Ok(saved)
    }

    /// Approved reviews for a product, newest first.
    #[instrument(skip(self))]
    pub async fn find_by_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ReviewModel>, ServiceError> {
        Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::Status.eq(ReviewStatus::Approved))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewModel>, ServiceError> {
        Review::find()
            .filter(review::Column::UserId.eq(user_id))
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<ReviewModel>, ServiceError> {
        Review::find()
            .order_by_desc(review::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<ReviewModel, ServiceError> {
        Review::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {} not found", id)))
    }

    /// Edits the caller's own review; editing resets it to pending.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        rating: Option<i32>,
        comment: Option<Option<String>>,
    ) -> Result<ReviewModel, ServiceError> {
        let existing = self.find_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "You can only edit your own reviews".to_string(),
            ));
        }

        if let Some(rating) = rating {
            if !(1..=5).contains(&rating) {
                return Err(ServiceError::ValidationError(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }

        let mut model: review::ActiveModel = existing.into();
        if let Some(rating) = rating {
            model.rating = Set(rating);
        }
        if let Some(comment) = comment {
            model.comment = Set(comment);
        }
        model.status = Set(ReviewStatus::Pending);
        model.updated_at = Set(self.clock.now());

        model.update(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Review::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Review {} not found", id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn moderate(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> Result<ReviewModel, ServiceError> {
        let existing = self.find_by_id(id).await?;

        let mut model: review::ActiveModel = existing.into();
        model.status = Set(status);
        model.updated_at = Set(self.clock.now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewModerated {
                review_id: id,
                status: status.to_value(),
            })
            .await;
        Ok(updated)
    }

    /// Average over approved reviews to one decimal; {0, 0} when none.
    #[instrument(skip(self))]
    pub async fn product_rating(&self, product_id: Uuid) -> Result<ProductRating, ServiceError> {
        let reviews = self.find_by_product(product_id).await?;
        if reviews.is_empty() {
            return Ok(ProductRating {
                average: Decimal::ZERO,
                count: 0,
            });
        }

        let count = reviews.len() as i64;
        let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
        let average = (Decimal::from(sum) / Decimal::from(count)).round_dp(1);

        Ok(ProductRating { average, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn average_rounds_to_one_decimal() {
        // Ratings 5, 4, 4 over 3 reviews: 13 / 3 = 4.333... -> 4.3
        let sum: i64 = 13;
        let count: i64 = 3;
        let average = (Decimal::from(sum) / Decimal::from(count)).round_dp(1);
        assert_eq!(average, dec!(4.3));
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::discount::{
    self, DiscountKind, DiscountStatus, Entity as Discount, Model as DiscountModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Outcome of a successful discount application. Nothing is mutated;
/// callers invoke `increment_usage` after the order commits.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedDiscount {
    pub discount: DiscountModel,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Per-status discount counts.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct DiscountStats {
    pub active: i64,
    pub inactive: i64,
    pub expired: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub kind: DiscountKind,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub min_order_value: Decimal,
    pub max_discount_amount: Decimal,
    pub usage_limit: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: DiscountStatus,
}

#[derive(Debug, Clone, Default)]
pub struct DiscountUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub code: Option<String>,
    pub kind: Option<DiscountKind>,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub min_order_value: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<DiscountStatus>,
}

#[derive(Clone)]
pub struct DiscountService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: SharedClock,
}

impl DiscountService {
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

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: NewDiscount) -> Result<DiscountModel, ServiceError> {
        let code = input.code.trim().to_uppercase();

        let existing = Discount::find()
            .filter(discount::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Discount code {} already exists",
                code
            )));
        }

        let now = self.clock.now();
        let model = discount::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            code: Set(code),
            kind: Set(input.kind),
            amount: Set(input.amount),
            percentage: Set(input.percentage),
            min_order_value: Set(input.min_order_value),
            max_discount_amount: Set(input.max_discount_amount),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::DiscountCreated(saved.id))
            .await;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<DiscountModel>, ServiceError> {
        Discount::find()
            .order_by_desc(discount::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    /// Discounts that are active and inside their date window right now.
    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<DiscountModel>, ServiceError> {
        let now = self.clock.now();
        Discount::find()
            .filter(discount::Column::Status.eq(DiscountStatus::Active))
            .filter(discount::Column::StartDate.lte(now))
            .filter(discount::Column::EndDate.gte(now))
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<DiscountModel, ServiceError> {
        Discount::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Discount {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<DiscountModel, ServiceError> {
        let code = code.trim().to_uppercase();
        Discount::find()
            .filter(discount::Column::Code.eq(code.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Discount code {} not found", code)))
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: Uuid,
        update: DiscountUpdate,
    ) -> Result<DiscountModel, ServiceError> {
        let existing = self.find_by_id(id).await?;

        if let Some(ref code) = update.code {
            let code = code.trim().to_uppercase();
            let clash = Discount::find()
                .filter(discount::Column::Code.eq(code.clone()))
                .filter(discount::Column::Id.ne(id))
                .one(&*self.db)
                .await?;
            if clash.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "Discount code {} already exists",
                    code
                )));
            }
        }

        let mut model: discount::ActiveModel = existing.into();
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(code) = update.code {
            model.code = Set(code.trim().to_uppercase());
        }
        if let Some(kind) = update.kind {
            model.kind = Set(kind);
        }
        if let Some(amount) = update.amount {
            model.amount = Set(amount);
        }
        if let Some(percentage) = update.percentage {
            model.percentage = Set(percentage);
        }
        if let Some(min_order_value) = update.min_order_value {
            model.min_order_value = Set(min_order_value);
        }
        if let Some(max_discount_amount) = update.max_discount_amount {
            model.max_discount_amount = Set(max_discount_amount);
        }
        if let Some(usage_limit) = update.usage_limit {
            model.usage_limit = Set(usage_limit);
        }
        if let Some(start_date) = update.start_date {
            model.start_date = Set(start_date);
        }
        if let Some(end_date) = update.end_date {
            model.end_date = Set(end_date);
        }
        if let Some(status) = update.status {
            model.status = Set(status);
        }
        model.updated_at = Set(self.clock.now());

        model.update(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Discount::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Discount {} not found", id)));
        }
        Ok(())
    }

    /// Validates a code against the current clock and computes the amounts.
    /// Pure read: the usage counter is only touched by `increment_usage`.
    #[instrument(skip(self))]
    pub async fn apply_discount(
        &self,
        code: &str,
        order_value: Decimal,
    ) -> Result<AppliedDiscount, ServiceError> {
        let discount = self.find_by_code(code).await?;

        if discount.status != DiscountStatus::Active {
            return Err(ServiceError::InvalidOperation(
                "Discount is not active".to_string(),
            ));
        }

        let now = self.clock.now();
        if now < discount.start_date || now > discount.end_date {
            return Err(ServiceError::InvalidOperation(
                "Discount is not valid at this time".to_string(),
            ));
        }

        if discount.usage_limit > 0 && discount.used_count >= discount.usage_limit {
            return Err(ServiceError::InvalidOperation(
                "Discount usage limit reached".to_string(),
            ));
        }

        if discount.min_order_value > Decimal::ZERO && order_value < discount.min_order_value {
            return Err(ServiceError::InvalidOperation(format!(
                "Order value is below the minimum of {}",
                discount.min_order_value
            )));
        }

        let discount_amount = compute_discount_amount(&discount, order_value);
        let final_amount = (order_value - discount_amount).max(Decimal::ZERO);

        self.event_sender
            .send_or_log(Event::DiscountApplied {
                discount_id: discount.id,
                order_value,
                discount_amount,
            })
            .await;

        Ok(AppliedDiscount {
            discount,
            discount_amount,
            final_amount,
        })
    }

    /// Atomic single-row increment of the usage counter. Deliberately
    /// separate from `apply_discount`; concurrent applies may over-redeem.
    #[instrument(skip(self))]
    pub async fn increment_usage(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Discount::update_many()
            .col_expr(
                discount::Column::UsedCount,
                Expr::col(discount::Column::UsedCount).add(1),
            )
            .col_expr(
                discount::Column::UpdatedAt,
                Expr::value(self.clock.now()),
            )
            .filter(discount::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Discount {} not found", id)));
        }
        Ok(())
    }

    /// Bulk expiry sweep: flips discounts whose window has closed from
    /// active to expired. Idempotent; never revives an expired row.
    #[instrument(skip(self))]
    pub async fn update_discount_status(&self) -> Result<u64, ServiceError> {
        let now = self.clock.now();
        let result = Discount::update_many()
            .col_expr(
                discount::Column::Status,
                Expr::value(DiscountStatus::Expired),
            )
            .col_expr(discount::Column::UpdatedAt, Expr::value(now))
            .filter(discount::Column::EndDate.lt(now))
            .filter(discount::Column::Status.eq(DiscountStatus::Active))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            warn!(expired = result.rows_affected, "discounts expired by sweep");
        } else {
            debug!("expiry sweep found nothing to do");
        }
        Ok(result.rows_affected)
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DiscountStats, ServiceError> {
        let rows: Vec<(DiscountStatus, i64)> = Discount::find()
            .select_only()
            .column(discount::Column::Status)
            .column_as(discount::Column::Id.count(), "count")
            .group_by(discount::Column::Status)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut stats = DiscountStats::default();
        for (status, count) in rows {
            match status {
                DiscountStatus::Active => stats.active = count,
                DiscountStatus::Inactive => stats.inactive = count,
                DiscountStatus::Expired => stats.expired = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }
}

/// Amount for a validated discount: percentage of the order value capped
/// at `max_discount_amount` when the cap is positive, or the flat amount.
fn compute_discount_amount(discount: &DiscountModel, order_value: Decimal) -> Decimal {
    match discount.kind {
        DiscountKind::Percentage => {
            let raw = order_value * discount.percentage / Decimal::from(100);
            if discount.max_discount_amount > Decimal::ZERO {
                raw.min(discount.max_discount_amount)
            } else {
                raw
            }
        }
        DiscountKind::FixedAmount => discount.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_discount(kind: DiscountKind) -> DiscountModel {
        let now = Utc::now();
        DiscountModel {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            description: None,
            code: "TEST".to_string(),
            kind,
            amount: Decimal::ZERO,
            percentage: Decimal::ZERO,
            min_order_value: Decimal::ZERO,
            max_discount_amount: Decimal::ZERO,
            usage_limit: 0,
            used_count: 0,
            start_date: now,
            end_date: now + chrono::Duration::days(30),
            status: DiscountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percentage_discount_without_cap() {
        let mut d = base_discount(DiscountKind::Percentage);
        d.percentage = dec!(10);
        assert_eq!(compute_discount_amount(&d, dec!(800)), dec!(80));
    }

    #[test]
    fn percentage_discount_capped() {
        let mut d = base_discount(DiscountKind::Percentage);
        d.percentage = dec!(25);
        d.max_discount_amount = dec!(200);
        // 25% of 1000 is 250, capped to 200
        assert_eq!(compute_discount_amount(&d, dec!(1000)), dec!(200));
    }

    #[test]
    fn zero_cap_means_uncapped() {
        let mut d = base_discount(DiscountKind::Percentage);
        d.percentage = dec!(50);
        d.max_discount_amount = Decimal::ZERO;
        assert_eq!(compute_discount_amount(&d, dec!(1000)), dec!(500));
    }

    #[test]
    fn fixed_amount_ignores_percentage_fields() {
        let mut d = base_discount(DiscountKind::FixedAmount);
        d.amount = dec!(50);
        d.percentage = dec!(99);
        assert_eq!(compute_discount_amount(&d, dec!(200)), dec!(50));
    }

    #[test]
    fn final_amount_never_negative() {
        let mut d = base_discount(DiscountKind::FixedAmount);
        d.amount = dec!(500);
        let order_value = dec!(100);
        let amount = compute_discount_amount(&d, order_value);
        let final_amount = (order_value - amount).max(Decimal::ZERO);
        assert_eq!(final_amount, Decimal::ZERO);
    }
}

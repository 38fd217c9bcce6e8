use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::sale::{
    self, Entity as Sale, Model as SaleModel, SaleKind, SaleStatus, TargetCustomer,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Per-status sale counts.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct SaleStats {
    pub active: i64,
    pub inactive: i64,
    pub expired: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub name: String,
    pub description: Option<String>,
    pub kind: SaleKind,
    pub product_ids: Vec<Uuid>,
    pub user_ids: Vec<Uuid>,
    pub target_customer: TargetCustomer,
    pub max_usage: i32,
    pub discount_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SaleStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SaleUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub kind: Option<SaleKind>,
    pub product_ids: Option<Vec<Uuid>>,
    pub user_ids: Option<Vec<Uuid>>,
    pub target_customer: Option<TargetCustomer>,
    pub max_usage: Option<i32>,
    pub discount_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SaleStatus>,
}

#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: SharedClock,
}

fn ids_to_json(ids: &[Uuid]) -> serde_json::Value {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| serde_json::Value::String(id.to_string()))
            .collect(),
    )
}

fn json_contains_id(value: &serde_json::Value, id: Uuid) -> bool {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| Uuid::parse_str(s).ok())
                .any(|candidate| candidate == id)
        })
        .unwrap_or(false)
}

impl SaleService {
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

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewSale) -> Result<SaleModel, ServiceError> {
        if input.start_date >= input.end_date {
            return Err(ServiceError::ValidationError(
                "start_date must be before end_date".to_string(),
            ));
        }

        let now = self.clock.now();
        let model = sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            kind: Set(input.kind),
            product_ids: Set(ids_to_json(&input.product_ids)),
            user_ids: Set(ids_to_json(&input.user_ids)),
            target_customer: Set(input.target_customer),
            max_usage: Set(input.max_usage),
            discount_id: Set(input.discount_id),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::SaleCreated(saved.id))
            .await;
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<SaleModel>, ServiceError> {
        Sale::find()
            .order_by_desc(sale::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<SaleModel>, ServiceError> {
        let now = self.clock.now();
        Sale::find()
            .filter(sale::Column::Status.eq(SaleStatus::Active))
            .filter(sale::Column::StartDate.lte(now))
            .filter(sale::Column::EndDate.gte(now))
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<SaleModel, ServiceError> {
        Sale::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: SaleUpdate) -> Result<SaleModel, ServiceError> {
        let existing = self.find_by_id(id).await?;

        let start = update.start_date.unwrap_or(existing.start_date);
        let end = update.end_date.unwrap_or(existing.end_date);
        if start >= end {
            return Err(ServiceError::ValidationError(
                "start_date must be before end_date".to_string(),
            ));
        }

        let mut model: sale::ActiveModel = existing.into();
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(kind) = update.kind {
            model.kind = Set(kind);
        }
        if let Some(product_ids) = update.product_ids {
            model.product_ids = Set(ids_to_json(&product_ids));
        }
        if let Some(user_ids) = update.user_ids {
            model.user_ids = Set(ids_to_json(&user_ids));
        }
        if let Some(target_customer) = update.target_customer {
            model.target_customer = Set(target_customer);
        }
        if let Some(max_usage) = update.max_usage {
            model.max_usage = Set(max_usage);
        }
        if let Some(discount_id) = update.discount_id {
            model.discount_id = Set(discount_id);
        }
        model.start_date = Set(start);
        model.end_date = Set(end);
        if let Some(status) = update.status {
            model.status = Set(status);
        }
        model.updated_at = Set(self.clock.now());

        model.update(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Sale::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Sale {} not found", id)));
        }
        Ok(())
    }

    /// Active-window sales whose linked product set contains the product.
    /// Membership is checked in memory since the sets are JSON columns.
    #[instrument(skip(self))]
    pub async fn sales_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<SaleModel>, ServiceError> {
        let active = self.find_active().await?;
        Ok(active
            .into_iter()
            .filter(|s| json_contains_id(&s.product_ids, product_id))
            .collect())
    }

    /// Active-window sales applicable to the user: either the user is in
    /// the linked set, or the campaign targets a broad audience.
    #[instrument(skip(self))]
    pub async fn sales_for_user(&self, user_id: Uuid) -> Result<Vec<SaleModel>, ServiceError> {
        let active = self.find_active().await?;
        Ok(active
            .into_iter()
            .filter(|s| {
                matches!(
                    s.target_customer,
                    TargetCustomer::All | TargetCustomer::NewCustomers
                ) || json_contains_id(&s.user_ids, user_id)
            })
            .collect())
    }

    /// Bulk expiry sweep, mirroring the discount sweep.
    #[instrument(skip(self))]
    pub async fn update_sale_status(&self) -> Result<u64, ServiceError> {
        let now = self.clock.now();
        let result = Sale::update_many()
            .col_expr(sale::Column::Status, Expr::value(SaleStatus::Expired))
            .col_expr(sale::Column::UpdatedAt, Expr::value(now))
            .filter(sale::Column::EndDate.lt(now))
            .filter(sale::Column::Status.eq(SaleStatus::Active))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            warn!(expired = result.rows_affected, "sales expired by sweep");
        } else {
            debug!("sale expiry sweep found nothing to do");
        }
        Ok(result.rows_affected)
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<SaleStats, ServiceError> {
        let rows: Vec<(SaleStatus, i64)> = Sale::find()
            .select_only()
            .column(sale::Column::Status)
            .column_as(sale::Column::Id.count(), "count")
            .group_by(sale::Column::Status)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut stats = SaleStats::default();
        for (status, count) in rows {
            match status {
                SaleStatus::Active => stats.active = count,
                SaleStatus::Inactive => stats.inactive = count,
                SaleStatus::Expired => stats.expired = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_membership_checks_parse_uuids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let value = ids_to_json(&[a]);
        assert!(json_contains_id(&value, a));
        assert!(!json_contains_id(&value, b));
    }

    #[test]
    fn empty_and_malformed_sets_contain_nothing() {
        let id = Uuid::new_v4();
        assert!(!json_contains_id(&serde_json::json!([]), id));
        assert!(!json_contains_id(&serde_json::json!({"not": "an array"}), id));
        assert!(!json_contains_id(&serde_json::json!(["not-a-uuid"]), id));
    }
}

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::clock::SharedClock;
use crate::entities::order::{self, Entity as Order, Model as OrderModel, OrderStatus, PaymentMethod};
use crate::entities::order_item::{self, Entity as OrderItem, Model as OrderItemModel};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Address embedded in the order as a JSON value object.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub district: String,
    #[validate(length(min = 1))]
    pub ward: String,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub variant: Option<String>,
}

/// Order creation input. Item prices and the total are persisted as
/// submitted; they are not recomputed from the live catalog.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_price: Decimal,
    pub discount_ids: Vec<Uuid>,
}

/// Order with its immutable item snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

/// Per-status order counts.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct OrderStats {
    pub pending: i64,
    pub processing: i64,
    pub shipped: i64,
    pub delivered: i64,
    pub cancelled: i64,
    pub total: i64,
}

/// Delivered-order revenue across three calendar windows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RevenueStats {
    pub all_time: Decimal,
    pub month_to_date: Decimal,
    pub day_to_date: Decimal,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: SharedClock,
}

impl OrderService {
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

    #[instrument(skip(self, input), fields(item_count = input.items.len()))]
    pub async fn create(&self, user_id: Uuid, input: NewOrder) -> Result<OrderDetail, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Order must contain at least one item".to_string(),
            ));
        }
        input.shipping_address.validate()?;

        let now = self.clock.now();
        let order_id = Uuid::new_v4();
        let shipping_address = serde_json::to_value(&input.shipping_address)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let discount_ids = serde_json::Value::Array(
            input
                .discount_ids
                .iter()
                .map(|id| serde_json::Value::String(id.to_string()))
                .collect(),
        );

        let txn = self.db.begin().await?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            shipping_address: Set(shipping_address),
            total_price: Set(input.total_price),
            payment_method: Set(input.payment_method),
            discount_ids: Set(discount_ids),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order_model.insert(&txn).await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in input.items {
            let model = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                price: Set(item.price),
                variant: Set(item.variant),
                created_at: Set(now),
            };
            items.push(model.insert(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        Ok(OrderDetail { order, items })
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<OrderModel>, ServiceError> {
        Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        let items = order.find_related(OrderItem).all(&*self.db).await?;
        Ok(OrderDetail { order, items })
    }

    /// Updates the mutable parts of an order (address and payment method).
    /// Item snapshots and the total are immutable after creation.
    #[instrument(skip(self, shipping_address))]
    pub async fn update(
        &self,
        id: Uuid,
        shipping_address: Option<ShippingAddress>,
        payment_method: Option<PaymentMethod>,
    ) -> Result<OrderModel, ServiceError> {
        let existing = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut model: order::ActiveModel = existing.into();
        if let Some(address) = shipping_address {
            address.validate()?;
            let value = serde_json::to_value(&address)
                .map_err(|e| ServiceError::InternalError(e.to_string()))?;
            model.shipping_address = Set(value);
        }
        if let Some(payment_method) = payment_method {
            model.payment_method = Set(payment_method);
        }
        model.updated_at = Set(self.clock.now());

        model.update(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let order = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let txn = self.db.begin().await?;
        OrderItem::delete_many()
            .filter(order_item::Column::OrderId.eq(id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;
        txn.commit().await?;

        self.event_sender.send_or_log(Event::OrderDeleted(id)).await;
        Ok(())
    }

    /// Sets the order status. The value must parse into the status enum;
    /// there is no transition-graph restriction beyond that.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<OrderModel, ServiceError> {
        let parsed = OrderStatus::try_from_value(&status.to_string())
            .map_err(|_| ServiceError::InvalidInput(format!("Invalid order status: {}", status)))?;

        let existing = Order::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let old_status = existing.status;
        let mut model: order::ActiveModel = existing.into();
        model.status = Set(parsed);
        model.updated_at = Set(self.clock.now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.to_value(),
                new_status: parsed.to_value(),
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn order_stats(&self) -> Result<OrderStats, ServiceError> {
        let rows: Vec<(OrderStatus, i64)> = Order::find()
            .select_only()
            .column(order::Column::Status)
            .column_as(order::Column::Id.count(), "count")
            .group_by(order::Column::Status)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut stats = OrderStats::default();
        for (status, count) in rows {
            match status {
                OrderStatus::Pending => stats.pending = count,
                OrderStatus::Processing => stats.processing = count,
                OrderStatus::Shipped => stats.shipped = count,
                OrderStatus::Delivered => stats.delivered = count,
                OrderStatus::Cancelled => stats.cancelled = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }

    /// Sums `total_price` over delivered orders for all-time, calendar
    /// month-to-date, and calendar day-to-date windows. The rows are
    /// fetched and summed here rather than aggregated in SQL so Decimal
    /// precision survives every backend.
    #[instrument(skip(self))]
    pub async fn revenue_stats(&self) -> Result<RevenueStats, ServiceError> {
        let now = self.clock.now();
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or(now);
        let month_start = now
            .date_naive()
            .with_day(1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or(day_start);

        let rows: Vec<(Decimal, DateTime<Utc>)> = Order::find()
            .select_only()
            .column(order::Column::TotalPrice)
            .column(order::Column::CreatedAt)
            .filter(order::Column::Status.eq(OrderStatus::Delivered))
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut stats = RevenueStats {
            all_time: Decimal::ZERO,
            month_to_date: Decimal::ZERO,
            day_to_date: Decimal::ZERO,
        };
        for (total_price, created_at) in rows {
            stats.all_time += total_price;
            if created_at >= month_start {
                stats.month_to_date += total_price;
            }
            if created_at >= day_start {
                stats.day_to_date += total_price;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_parse_into_enum() {
        assert_eq!(
            OrderStatus::try_from_value(&"delivered".to_string()).unwrap(),
            OrderStatus::Delivered
        );
        assert!(OrderStatus::try_from_value(&"refunded".to_string()).is_err());
    }

    #[test]
    fn shipping_address_requires_all_fields() {
        let address = ShippingAddress {
            name: "A".into(),
            phone: "1".into(),
            address: "Street".into(),
            city: "City".into(),
            district: "District".into(),
            ward: "".into(),
        };
        assert!(address.validate().is_err());
    }
}

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::cart::{self, CartStatus, Entity as Cart, Model as CartModel};
use crate::entities::cart_item::{self, Entity as CartItem, Model as CartItemModel};
use crate::entities::product::Entity as Product;
use crate::entities::product_variant::{self, Entity as ProductVariant};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Cart with its line items, as returned to the API.
#[derive(Debug, Clone, Serialize)]
pub struct CartDetail {
    #[serde(flatten)]
    pub cart: CartModel,
    pub items: Vec<CartItemModel>,
}

/// Live cart totals: sum of (product price + variant adjustment) x quantity.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CartTotals {
    pub total: Decimal,
    pub item_count: i64,
}

#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: SharedClock,
}

impl CartService {
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

    /// Fetches the user's cart, lazily creating it on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<CartModel, ServiceError> {
        if let Some(existing) = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let now = self.clock.now();
        let model = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            status: Set(CartStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        debug!(%user_id, "creating cart on first access");
        model.insert(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn get_detail(&self, user_id: Uuid) -> Result<CartDetail, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        let items = cart.find_related(CartItem).all(&*self.db).await?;
        Ok(CartDetail { cart, items })
    }

    /// Adds quantity to the cart, merging into an existing line when the
    /// (product, variant) pair already has one.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        variant: Option<String>,
    ) -> Result<CartDetail, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let cart = self.get_or_create(user_id).await?;
        let now = self.clock.now();

        match self.find_line(cart.id, product_id, variant.as_deref()).await? {
            Some(line) => {
                let merged = line.quantity + quantity;
                let mut model: cart_item::ActiveModel = line.into();
                model.quantity = Set(merged);
                model.updated_at = Set(now);
                model.update(&*self.db).await?;
            }
            None => {
                let model = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    variant: Set(variant),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&*self.db).await?;
            }
        }

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id,
            })
            .await;

        self.get_detail(user_id).await
    }

    /// Sets the quantity of an existing line. NotFound when the
    /// (product, variant) pair has no line.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        variant: Option<String>,
    ) -> Result<CartDetail, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let cart = self.get_or_create(user_id).await?;
        let line = self
            .find_line(cart.id, product_id, variant.as_deref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;

        let mut model: cart_item::ActiveModel = line.into();
        model.quantity = Set(quantity);
        model.updated_at = Set(self.clock.now());
        model.update(&*self.db).await?;

        self.get_detail(user_id).await
    }

    /// Removes the matching line. Removing an absent pair is a no-op.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        variant: Option<String>,
    ) -> Result<CartDetail, ServiceError> {
        let cart = self.get_or_create(user_id).await?;

        if let Some(line) = self.find_line(cart.id, product_id, variant.as_deref()).await? {
            line.delete(&*self.db).await?;
        }

        self.get_detail(user_id).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<CartDetail, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;

        self.get_detail(user_id).await
    }

    /// Computes totals from live product prices. A line's unit price is
    /// the product price plus the adjustment of the variant whose name
    /// matches the line's variant string; no adjustment when unmatched.
    #[instrument(skip(self))]
    pub async fn totals(&self, user_id: Uuid) -> Result<CartTotals, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        let items = cart.find_related(CartItem).all(&*self.db).await?;

        let mut total = Decimal::ZERO;
        let mut item_count: i64 = 0;

        for item in &items {
            let product = Product::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            let mut unit_price = product.price;
            if let Some(ref variant_name) = item.variant {
                let variant = ProductVariant::find()
                    .filter(product_variant::Column::ProductId.eq(product.id))
                    .filter(product_variant::Column::Name.eq(variant_name.clone()))
                    .one(&*self.db)
                    .await?;
                if let Some(variant) = variant {
                    unit_price += variant.price_adjustment;
                }
            }

            total += unit_price * Decimal::from(item.quantity);
            item_count += i64::from(item.quantity);
        }

        Ok(CartTotals { total, item_count })
    }

    /// Flips the cart to `converted`. Does not create an order or clear
    /// the items; the order flow is driven separately by the caller.
    #[instrument(skip(self))]
    pub async fn convert_to_order(&self, user_id: Uuid) -> Result<CartModel, ServiceError> {
        let cart = self.get_or_create(user_id).await?;
        let item_count = cart.find_related(CartItem).count(&*self.db).await?;
        if item_count == 0 {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }

        let cart_id = cart.id;
        let mut model: cart::ActiveModel = cart.into();
        model.status = Set(CartStatus::Converted);
        model.updated_at = Set(self.clock.now());
        let updated = model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartConverted { cart_id, user_id })
            .await;

        Ok(updated)
    }

    async fn find_line(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
        variant: Option<&str>,
    ) -> Result<Option<CartItemModel>, ServiceError> {
        let mut query = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id));
        query = match variant {
            Some(name) => query.filter(cart_item::Column::Variant.eq(name)),
            None => query.filter(cart_item::Column::Variant.is_null()),
        };
        query.one(&*self.db).await.map_err(ServiceError::from)
    }
}

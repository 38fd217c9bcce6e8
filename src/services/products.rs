use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::entities::product::{self, Entity as Product, Model as ProductModel, ProductStatus};
use crate::entities::product_variant::{
    self, Entity as ProductVariant, Model as ProductVariantModel,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Product with its variant rows.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductModel,
    pub variants: Vec<ProductVariantModel>,
}

/// One page of a filtered product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductModel>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct NewProductVariant {
    pub name: String,
    pub value: String,
    pub price_adjustment: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub price: Decimal,
    pub stock: i32,
    pub thumbnail: Option<String>,
    pub images: Vec<String>,
    pub status: ProductStatus,
    pub variants: Vec<NewProductVariant>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Option<Uuid>>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub thumbnail: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
}

/// Listing filter. `sort_by` accepts name, price, or created_at.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Pagination bounds, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    clock: SharedClock,
    page_limits: PageLimits,
}

fn page_window(query: &ProductQuery, limits: PageLimits) -> (u64, u64) {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(limits.default_limit)
        .clamp(1, limits.max_limit);
    (page, limit)
}

/// Unsorted listings default to newest-first; name and price default to
/// ascending. An explicit `sort_order` wins in every case.
fn sort_ordering(sort_by: Option<&str>, sort_order: Option<&str>) -> (product::Column, Order) {
    let (column, default_order) = match sort_by {
        Some("name") => (product::Column::Name, Order::Asc),
        Some("price") => (product::Column::Price, Order::Asc),
        _ => (product::Column::CreatedAt, Order::Desc),
    };
    let order = match sort_order {
        Some("asc") => Order::Asc,
        Some("desc") => Order::Desc,
        _ => default_order,
    };
    (column, order)
}

fn images_to_json(images: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        images
            .iter()
            .map(|url| serde_json::Value::String(url.clone()))
            .collect(),
    )
}

impl ProductService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        clock: SharedClock,
        page_limits: PageLimits,
    ) -> Self {
        Self {
            db,
            event_sender,
            clock,
            page_limits,
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProduct) -> Result<ProductDetail, ServiceError> {
        let now = self.clock.now();
        let product_id = Uuid::new_v4();

        let model = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name),
            description: Set(input.description),
            category_id: Set(input.category_id),
            sub_category_id: Set(input.sub_category_id),
            price: Set(input.price),
            stock: Set(input.stock),
            thumbnail: Set(input.thumbnail),
            images: Set(images_to_json(&input.images)),
            status: Set(input.status),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = model.insert(&*self.db).await?;

        let mut variants = Vec::with_capacity(input.variants.len());
        for variant in input.variants {
            let model = product_variant::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                name: Set(variant.name),
                value: Set(variant.value),
                price_adjustment: Set(variant.price_adjustment),
                stock: Set(variant.stock),
                created_at: Set(now),
                updated_at: Set(now),
            };
            variants.push(model.insert(&*self.db).await?);
        }

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        Ok(ProductDetail {
            product: saved,
            variants,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self, query: ProductQuery) -> Result<ProductPage, ServiceError> {
        let mut condition = Condition::all();
        if let Some(ref search) = query.search {
            let pattern = format!("%{}%", search.trim());
            condition = condition.add(
                Condition::any()
                    .add(product::Column::Name.like(pattern.clone()))
                    .add(product::Column::Description.like(pattern)),
            );
        }
        if let Some(category_id) = query.category_id {
            condition = condition.add(product::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = query.status {
            condition = condition.add(product::Column::Status.eq(status));
        }

        let (page, limit) = page_window(&query, self.page_limits);
        let (column, order) = sort_ordering(query.sort_by.as_deref(), query.sort_order.as_deref());
        let finder = Product::find().filter(condition).order_by(column, order);

        let paginator = finder.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            products,
            total,
            page,
            limit,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        let product = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;
        let variants = product
            .find_related(ProductVariant)
            .all(&*self.db)
            .await?;
        Ok(ProductDetail { product, variants })
    }

    /// Available products in a category, for the public storefront.
    #[instrument(skip(self))]
    pub async fn find_by_category(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .filter(product::Column::Status.eq(ProductStatus::Available))
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: Uuid,
        update: ProductUpdate,
    ) -> Result<ProductModel, ServiceError> {
        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(category_id) = update.category_id {
            model.category_id = Set(category_id);
        }
        if let Some(sub_category_id) = update.sub_category_id {
            model.sub_category_id = Set(sub_category_id);
        }
        if let Some(price) = update.price {
            model.price = Set(price);
        }
        if let Some(stock) = update.stock {
            model.stock = Set(stock);
        }
        if let Some(thumbnail) = update.thumbnail {
            model.thumbnail = Set(thumbnail);
        }
        if let Some(images) = update.images {
            model.images = Set(images_to_json(&images));
        }
        if let Some(status) = update.status {
            model.status = Set(status);
        }
        model.updated_at = Set(self.clock.now());

        model.update(&*self.db).await.map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let product = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        ProductVariant::delete_many()
            .filter(product_variant::Column::ProductId.eq(id))
            .exec(&*self.db)
            .await?;
        product.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        Ok(())
    }

    /// Overwrites the named variant's stock (last-write-wins). An unknown
    /// variant name is silently ignored.
    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        product_id: Uuid,
        variant_name: &str,
        quantity: i32,
    ) -> Result<ProductDetail, ServiceError> {
        // Ensure the product exists before touching variants.
        self.find_by_id(product_id).await?;

        let variant = ProductVariant::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .filter(product_variant::Column::Name.eq(variant_name))
            .one(&*self.db)
            .await?;

        match variant {
            Some(variant) => {
                let mut model: product_variant::ActiveModel = variant.into();
                model.stock = Set(quantity);
                model.updated_at = Set(self.clock.now());
                model.update(&*self.db).await?;
                self.event_sender
                    .send_or_log(Event::ProductStockChanged {
                        product_id,
                        stock: quantity,
                    })
                    .await;
            }
            None => {
                debug!(%product_id, variant_name, "stock update for unknown variant ignored");
            }
        }

        self.find_by_id(product_id).await
    }
}

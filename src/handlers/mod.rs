pub mod auth;
pub mod carts;
pub mod categories;
pub mod common;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod sales;
pub mod sub_categories;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::clock::SharedClock;
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::products::PageLimits;
use crate::services::{
    CartService, CategoryService, DiscountService, OrderService, ProductService, ReviewService,
    SaleService, SubCategoryService,
};

/// Service container shared through the router state.
#[derive(Clone)]
pub struct AppServices {
    pub discounts: DiscountService,
    pub sales: SaleService,
    pub carts: CartService,
    pub orders: OrderService,
    pub products: ProductService,
    pub categories: CategoryService,
    pub sub_categories: SubCategoryService,
    pub reviews: ReviewService,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        clock: SharedClock,
        cfg: &AppConfig,
    ) -> Self {
        let page_limits = PageLimits {
            default_limit: cfg.api_default_page_size,
            max_limit: cfg.api_max_page_size,
        };
        Self {
            discounts: DiscountService::new(db.clone(), event_sender.clone(), clock.clone()),
            sales: SaleService::new(db.clone(), event_sender.clone(), clock.clone()),
            carts: CartService::new(db.clone(), event_sender.clone(), clock.clone()),
            orders: OrderService::new(db.clone(), event_sender.clone(), clock.clone()),
            products: ProductService::new(
                db.clone(),
                event_sender.clone(),
                clock.clone(),
                page_limits,
            ),
            categories: CategoryService::new(db.clone(), clock.clone()),
            sub_categories: SubCategoryService::new(db.clone(), clock.clone()),
            reviews: ReviewService::new(db, event_sender, clock),
        }
    }
}

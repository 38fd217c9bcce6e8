pub mod carts;
pub mod categories;
pub mod discounts;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod sales;
pub mod sub_categories;

pub use carts::CartService;
pub use categories::CategoryService;
pub use discounts::DiscountService;
pub use orders::OrderService;
pub use products::ProductService;
pub use reviews::ReviewService;
pub use sales::SaleService;
pub use sub_categories::SubCategoryService;

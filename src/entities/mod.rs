pub mod cart;
pub mod cart_item;
pub mod category;
pub mod discount;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;
pub mod review;
pub mod sale;
pub mod sub_category;
pub mod user;

pub use cart::Entity as Cart;
pub use cart_item::Entity as CartItem;
pub use category::Entity as Category;
pub use discount::Entity as Discount;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use product_variant::Entity as ProductVariant;
pub use review::Entity as Review;
pub use sale::Entity as Sale;
pub use sub_category::Entity as SubCategory;
pub use user::Entity as User;

pub use cart::Model as CartModel;
pub use cart_item::Model as CartItemModel;
pub use category::Model as CategoryModel;
pub use discount::Model as DiscountModel;
pub use order::Model as OrderModel;
pub use order_item::Model as OrderItemModel;
pub use product::Model as ProductModel;
pub use product_variant::Model as ProductVariantModel;
pub use review::Model as ReviewModel;
pub use sale::Model as SaleModel;
pub use sub_category::Model as SubCategoryModel;
pub use user::Model as UserModel;

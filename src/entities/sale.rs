use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Promotional campaign entity.
///
/// `product_ids` and `user_ids` are JSON arrays of UUIDs, mirroring the
/// linked-set shape of the source documents; membership tests decode
/// them in the service layer. Exactly one discount is linked per sale.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub kind: SaleKind,
    #[sea_orm(column_type = "Json")]
    pub product_ids: Json,
    #[sea_orm(column_type = "Json")]
    pub user_ids: Json,
    pub target_customer: TargetCustomer,
    /// 0 means unlimited.
    pub max_usage: i32,
    pub discount_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::discount::Entity",
        from = "Column::DiscountId",
        to = "super::discount::Column::Id"
    )]
    Discount,
}

impl Related<super::discount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SaleKind {
    #[sea_orm(string_value = "percentage_off")]
    PercentageOff,
    #[sea_orm(string_value = "fixed_amount_off")]
    FixedAmountOff,
    #[sea_orm(string_value = "buy_one_get_one")]
    BuyOneGetOne,
    #[sea_orm(string_value = "free_shipping")]
    FreeShipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TargetCustomer {
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "new_customers")]
    NewCustomers,
    #[sea_orm(string_value = "premium_members")]
    PremiumMembers,
    #[sea_orm(string_value = "specific_users")]
    SpecificUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "expired")]
    Expired,
}

//! Shop catalog and purchase payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::ItemEntity;

/// One shop catalog entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShopItemDto {
    /// Unique item name.
    pub name: String,
    /// Price in stars before discounts.
    pub price: i64,
    /// Remaining stock; -1 means unlimited.
    pub stock: i64,
}

impl From<ItemEntity> for ShopItemDto {
    fn from(item: ItemEntity) -> Self {
        Self {
            name: item.name,
            price: item.price,
            stock: item.stock,
        }
    }
}

/// Body of `POST /buy`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BuyRequest {
    /// Public profile handle of the buyer.
    pub uuid: Uuid,
    /// Discord user identifier of the buyer; must match the handle.
    #[serde(rename = "userId")]
    #[validate(length(min = 1, message = "userId must not be empty"))]
    pub user_id: String,
    /// Name of the item to buy.
    #[serde(rename = "itemName")]
    #[validate(length(min = 1, message = "itemName must not be empty"))]
    pub item_name: String,
    /// Number of units; must be between 1 and 1000.
    #[validate(range(min = 1, max = 1000, message = "quantity must be between 1 and 1000"))]
    pub quantity: i64,
}

/// Successful purchase summary.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Human readable confirmation, displayed verbatim by the frontend.
    pub message: String,
    /// Discounted unit price actually charged.
    pub unit_price: i64,
    /// Total amount debited.
    pub total_price: i64,
    /// Additive discount percentage that was applied.
    pub discount_percent: u32,
    /// Stars balance after the debit.
    pub stars_remaining: i64,
}

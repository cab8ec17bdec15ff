use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::checkout::CartTotals;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuantityAction {
    Increment,
    Decrement,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub action: QuantityAction,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetDestinationRequest {
    pub district_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub name: String,
    pub variant_details: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
    pub free_shipping: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartDetail {
    pub items: Vec<CartItemDto>,
    pub destination_district_id: Option<Uuid>,
    pub totals: CartTotals,
}

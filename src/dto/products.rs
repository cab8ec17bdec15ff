use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub free_shipping: bool,
    pub stock: i32,
    pub low_stock_threshold: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub weight_kg: Option<Decimal>,
    pub free_shipping: Option<bool>,
    pub stock: Option<i32>,
    pub low_stock_threshold: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct DistrictList {
    pub items: Vec<crate::models::District>,
}

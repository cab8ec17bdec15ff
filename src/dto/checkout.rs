use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PaymentMethod;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping_charge: Decimal,
    pub grand_total: Decimal,
}

/// Flat payload for the destination-change AJAX endpoint; kept free of the
/// usual response envelope for the storefront script that consumes it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShippingQuoteResponse {
    pub success: bool,
    pub shipping_charge: Decimal,
    pub grand_total: Decimal,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteFailure {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub district_id: Option<Uuid>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub payment_method: PaymentMethod,
    pub shipping_address: AddressInput,
    pub billing_address: Option<AddressInput>,
    pub shipping_method_id: Option<Uuid>,
    pub customer_notes: Option<String>,
}

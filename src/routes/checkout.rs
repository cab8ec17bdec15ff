use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    dto::{
        checkout::{PlaceOrderRequest, QuoteFailure, ShippingQuoteResponse},
        orders::OrderWithItems,
    },
    error::{AppError, AppResult},
    middleware::auth::Shopper,
    response::ApiResponse,
    services::{checkout_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order))
        .route("/quote", get(shipping_quote))
}

/// Destination-change endpoint for the checkout page. Unlike the rest of the
/// API this answers with the legacy flat payload the storefront script
/// expects, including the `success` flag.
#[utoipa::path(
    get,
    path = "/api/checkout/quote",
    responses(
        (status = 200, description = "Current shipping charge and grand total", body = ShippingQuoteResponse),
        (status = 404, description = "Cart or district not found", body = QuoteFailure),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn shipping_quote(State(state): State<AppState>, shopper: Shopper) -> Response {
    match checkout_service::cart_quote(&state, &shopper.owner).await {
        Ok(totals) => (
            StatusCode::OK,
            Json(ShippingQuoteResponse {
                success: true,
                shipping_charge: totals.shipping_charge,
                grand_total: totals.grand_total,
                message: "Shipping charge updated".into(),
            }),
        )
            .into_response(),
        Err(AppError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(QuoteFailure {
                success: false,
                message: "Cart or district not found".into(),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Cart materialized into an order", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Cart is empty or checkout fields invalid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let ctx = shopper.audit();
    let resp = order_service::place_order(&state, &ctx, &shopper.owner, payload).await?;
    Ok(Json(resp))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartDetail, SetDestinationRequest, UpdateQuantityRequest},
    error::AppResult,
    middleware::auth::Shopper,
    models::{Cart, CartItem},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_detail).post(add_to_cart))
        .route("/destination", put(set_destination))
        .route(
            "/{item_id}",
            axum::routing::patch(update_quantity).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with totals breakdown", body = ApiResponse<CartDetail>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_detail(
    State(state): State<AppState>,
    shopper: Shopper,
) -> AppResult<Json<ApiResponse<CartDetail>>> {
    let resp = cart_service::list_cart(&state, &shopper.owner).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add to cart; repeated adds increment quantity", body = ApiResponse<CartItem>),
        (status = 400, description = "Bad request"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let ctx = shopper.audit();
    let resp = cart_service::add_to_cart(&state, &ctx, &shopper.owner, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Increment or decrement a line", body = ApiResponse<CartItem>),
        (status = 400, description = "Minimum quantity is 1"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let ctx = shopper.audit();
    let resp =
        cart_service::update_quantity(&state, &ctx, &shopper.owner, item_id, payload.action)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    shopper: Shopper,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let ctx = shopper.audit();
    let resp = cart_service::remove_from_cart(&state, &ctx, &shopper.owner, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/destination",
    request_body = SetDestinationRequest,
    responses(
        (status = 200, description = "Destination district set", body = ApiResponse<Cart>),
        (status = 404, description = "District not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_destination(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(payload): Json<SetDestinationRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let ctx = shopper.audit();
    let resp =
        cart_service::set_destination(&state, &ctx, &shopper.owner, payload.district_id).await?;
    Ok(Json(resp))
}

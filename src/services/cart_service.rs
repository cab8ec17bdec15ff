use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    audit::{AuditContext, log_audit},
    db::DbPool,
    dto::cart::{AddToCartRequest, CartDetail, CartItemDto, QuantityAction},
    error::{AppError, AppResult},
    entity::{
        cart_items::Column as CartItemCol,
        CartItems, ProductVariants, Products,
    },
    models::{Cart, CartItem, CartOwner, District},
    pricing::PricedLine,
    response::{ApiResponse, Meta},
    services::checkout_service,
    state::AppState,
};

/// One cart line joined with the catalog data pricing needs, plus the
/// snapshot fields order materialization copies.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub product_name: String,
    pub variant_details: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub weight_kg: Decimal,
    pub free_shipping: bool,
}

impl CartLine {
    pub fn priced(&self) -> PricedLine {
        PricedLine {
            unit_price: self.unit_price,
            quantity: self.quantity,
            weight_kg: self.weight_kg,
            free_shipping: self.free_shipping,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Fetch the owner's cart, creating an empty one on first touch. The insert
/// races safely: `ON CONFLICT DO NOTHING` against the per-owner unique index
/// means two concurrent first touches converge on one row.
pub async fn get_or_create_cart(pool: &DbPool, owner: &CartOwner) -> AppResult<Cart> {
    sqlx::query(
        "INSERT INTO carts (id, customer_id, session_key) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(owner.customer_id())
    .bind(owner.session_key())
    .execute(pool)
    .await?;

    let cart = sqlx::query_as::<_, Cart>(
        r#"
        SELECT * FROM carts
        WHERE customer_id IS NOT DISTINCT FROM $1
          AND session_key IS NOT DISTINCT FROM $2
        "#,
    )
    .bind(owner.customer_id())
    .bind(owner.session_key())
    .fetch_one(pool)
    .await?;

    Ok(cart)
}

pub async fn add_to_cart(
    state: &AppState,
    ctx: &AuditContext,
    owner: &CartOwner,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    if let Some(variant_id) = payload.variant_id {
        let variant_exist: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM product_variants WHERE id = $1 AND product_id = $2",
        )
        .bind(variant_id)
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
        if variant_exist.is_none() {
            return Err(AppError::BadRequest(
                "variant does not belong to product".to_string(),
            ));
        }
    }

    let cart = get_or_create_cart(&state.pool, owner).await?;

    // Single atomic upsert against the (cart, product, variant) unique index;
    // a repeated add increments the existing row instead of duplicating it.
    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, variant_id, quantity)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (cart_id, product_id, COALESCE(variant_id, '00000000-0000-0000-0000-000000000000'::uuid))
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart.id)
    .bind(payload.product_id)
    .bind(payload.variant_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.orm,
        ctx,
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({
            "product_id": payload.product_id,
            "variant_id": payload.variant_id,
            "quantity": payload.quantity,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn update_quantity(
    state: &AppState,
    ctx: &AuditContext,
    owner: &CartOwner,
    item_id: Uuid,
    action: QuantityAction,
) -> AppResult<ApiResponse<CartItem>> {
    let cart = get_or_create_cart(&state.pool, owner).await?;

    let updated = match action {
        QuantityAction::Increment => {
            sqlx::query_as::<_, CartItem>(
                r#"
                UPDATE cart_items SET quantity = quantity + 1
                WHERE id = $1 AND cart_id = $2
                RETURNING *
                "#,
            )
            .bind(item_id)
            .bind(cart.id)
            .fetch_optional(&state.pool)
            .await?
        }
        QuantityAction::Decrement => {
            sqlx::query_as::<_, CartItem>(
                r#"
                UPDATE cart_items SET quantity = quantity - 1
                WHERE id = $1 AND cart_id = $2 AND quantity > 1
                RETURNING *
                "#,
            )
            .bind(item_id)
            .bind(cart.id)
            .fetch_optional(&state.pool)
            .await?
        }
    };

    let cart_item = match updated {
        Some(item) => item,
        None => {
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM cart_items WHERE id = $1 AND cart_id = $2")
                    .bind(item_id)
                    .bind(cart.id)
                    .fetch_optional(&state.pool)
                    .await?;
            return match exists {
                // Decrement hit the floor.
                Some(_) => Err(AppError::BadRequest("Minimum quantity is 1".into())),
                None => Err(AppError::NotFound),
            };
        }
    };

    if let Err(err) = log_audit(
        &state.orm,
        ctx,
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": item_id, "quantity": cart_item.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Quantity updated", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    ctx: &AuditContext,
    owner: &CartOwner,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = get_or_create_cart(&state.pool, owner).await?;

    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
        .bind(item_id)
        .bind(cart.id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.orm,
        ctx,
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Point the cart at a delivery district so shipping can be quoted.
pub async fn set_destination(
    state: &AppState,
    ctx: &AuditContext,
    owner: &CartOwner,
    district_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let district: Option<District> =
        sqlx::query_as("SELECT id, name, shipping_zone_id FROM districts WHERE id = $1")
            .bind(district_id)
            .fetch_optional(&state.pool)
            .await?;
    if district.is_none() {
        return Err(AppError::NotFound);
    }

    let cart = get_or_create_cart(&state.pool, owner).await?;

    let cart = sqlx::query_as::<_, Cart>(
        r#"
        UPDATE carts SET district_id = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(cart.id)
    .bind(district_id)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.orm,
        ctx,
        "cart_destination",
        Some("carts"),
        Some(serde_json::json!({ "district_id": district_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Delivery location changed", cart, None))
}

pub async fn list_cart(state: &AppState, owner: &CartOwner) -> AppResult<ApiResponse<CartDetail>> {
    let cart = get_or_create_cart(&state.pool, owner).await?;
    let lines = load_cart_lines(&state.orm, cart.id).await?;
    let totals = checkout_service::totals_for(&state.orm, &cart, &lines).await?;

    let items = lines
        .iter()
        .map(|line| CartItemDto {
            id: line.item_id,
            product_id: line.product_id,
            variant_id: line.variant_id,
            name: line.product_name.clone(),
            variant_details: line.variant_details.clone(),
            sku: line.sku.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            total_price: line.line_total(),
            free_shipping: line.free_shipping,
        })
        .collect();

    let detail = CartDetail {
        items,
        destination_district_id: cart.district_id,
        totals,
    };

    Ok(ApiResponse::success("OK", detail, None))
}

/// Load a cart's lines with unit price, weight and snapshot fields resolved
/// (variant values win over product values). Runs on any connection so the
/// materializer can call it inside its transaction.
pub async fn load_cart_lines<C: ConnectionTrait>(
    conn: &C,
    cart_id: Uuid,
) -> AppResult<Vec<CartLine>> {
    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = Products::find_by_id(item.product_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "cart item {} references a missing product",
                    item.id
                ))
            })?;

        let variant = match item.variant_id {
            Some(variant_id) => Some(
                ProductVariants::find_by_id(variant_id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(
                            "cart item {} references a missing variant",
                            item.id
                        ))
                    })?,
            ),
            None => None,
        };

        let unit_price = variant
            .as_ref()
            .map(|v| v.price)
            .unwrap_or(product.base_price);
        let weight_kg = variant
            .as_ref()
            .and_then(|v| v.weight_kg)
            .or(product.weight_kg)
            .unwrap_or(Decimal::ZERO);
        let sku = variant
            .as_ref()
            .map(|v| v.sku.clone())
            .unwrap_or_else(|| product.sku.clone());
        let variant_details = variant.as_ref().map(|v| v.name.clone()).unwrap_or_default();

        lines.push(CartLine {
            item_id: item.id,
            product_id: product.id,
            variant_id: item.variant_id,
            product_name: product.name,
            variant_details,
            sku,
            quantity: item.quantity,
            unit_price,
            weight_kg,
            free_shipping: product.free_shipping,
        });
    }

    Ok(lines)
}

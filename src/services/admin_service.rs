use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit::{AuditContext, log_audit},
    dto::{
        orders::{OrderList, OrderWithItems},
        products::ProductList,
    },
    error::{AppError, AppResult},
    entity::{
        order_items::Column as OrderItemCol,
        order_status_history::ActiveModel as StatusHistoryActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol},
        products::Column as ProdCol,
        OrderItems, Orders, Products,
    },
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::admin::{InventoryAdjustRequest, LowStockQuery, UpdateOrderStatusRequest},
    routes::params::{OrderListQuery, SortOrder},
    models::{ORDER_STATUSES, Order},
    services::{order_service, product_service},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::OrderStatus.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_service::order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Move an order through its lifecycle; each change is appended to the
/// order's status history with the acting admin recorded.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    if !ORDER_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unknown order status '{}'",
            payload.status
        )));
    }

    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = order.into();
    active.order_status = Set(payload.status.clone());
    match payload.status.as_str() {
        "shipped" => active.shipped_at = Set(Some(Utc::now().into())),
        "delivered" => active.delivered_at = Set(Some(Utc::now().into())),
        _ => {}
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    StatusHistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        status: Set(payload.status.clone()),
        note: Set(payload.note.clone().unwrap_or_default()),
        created_by: Set(Some(user.user_id)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let ctx = AuditContext::customer(user.user_id);
    if let Err(err) = log_audit(
        &state.orm,
        &ctx,
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": payload.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        order_service::order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    // Explicit threshold wins; otherwise each product's own threshold applies.
    let condition = match query.threshold {
        Some(threshold) => Condition::all().add(ProdCol::Stock.lte(threshold)),
        None => Condition::all()
            .add(Expr::col(ProdCol::Stock).lte(Expr::col(ProdCol::LowStockThreshold))),
    };

    let finder = Products::find()
        .filter(condition)
        .order_by_asc(ProdCol::Stock);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_service::product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<crate::models::Product>> {
    ensure_admin(user)?;

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = product.stock + payload.delta;
    if new_stock < 0 {
        return Err(AppError::BadRequest(format!(
            "stock cannot go below zero (current {}, delta {})",
            product.stock, payload.delta
        )));
    }

    let mut active: crate::entity::products::ActiveModel = product.into();
    active.stock = Set(new_stock);
    let product = active.update(&state.orm).await?;

    let ctx = AuditContext::customer(user.user_id);
    if let Err(err) = log_audit(
        &state.orm,
        &ctx,
        "inventory_adjust",
        Some("products"),
        Some(serde_json::json!({
            "product_id": product.id,
            "delta": payload.delta,
            "reason": payload.reason,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Inventory adjusted",
        product_service::product_from_entity(product),
        Some(Meta::empty()),
    ))
}

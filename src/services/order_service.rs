use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::{AuditContext, log_audit},
    dto::{
        checkout::{AddressInput, PlaceOrderRequest},
        orders::{OrderList, OrderWithItems},
    },
    error::{AppError, AppResult},
    entity::{
        addresses::ActiveModel as AddressActive,
        carts::Column as CartCol,
        cart_items::Column as CartItemCol,
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Model as OrderItemModel,
        },
        order_status_history::ActiveModel as StatusHistoryActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        CartItems, Carts, Orders, OrderItems, ShippingMethods,
    },
    models::{CartOwner, Order, OrderItem},
    pricing::{self, PricedLine},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service, checkout_service},
    state::AppState,
};

/// Atomically convert the owner's cart into an immutable order.
///
/// The cart row is locked for the whole transaction, so two concurrent
/// checkouts of the same cart serialize; the loser finds the items gone and
/// gets the empty-cart rejection instead of a duplicate order. Any failure
/// rolls the entire conversion back.
pub async fn place_order(
    state: &AppState,
    ctx: &AuditContext,
    owner: &CartOwner,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let owner_filter = match owner {
        CartOwner::Customer(id) => Condition::all().add(CartCol::CustomerId.eq(*id)),
        CartOwner::Guest(key) => Condition::all().add(CartCol::SessionKey.eq(key.clone())),
    };

    let cart = Carts::find()
        .filter(owner_filter)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let lines = cart_service::load_cart_lines(&txn, cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    if let Some(method_id) = payload.shipping_method_id {
        ShippingMethods::find_by_id(method_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unknown shipping method".into()))?;
    }

    let priced: Vec<PricedLine> = lines.iter().map(|line| line.priced()).collect();
    let rates = match cart.district_id {
        Some(district_id) => {
            checkout_service::resolve_rate_table(&txn, district_id, payload.shipping_method_id)
                .await?
        }
        None => None,
    };
    let quote = pricing::quote(&priced, rates.as_ref(), payload.payment_method);

    let shipping_address_id = insert_address(&txn, owner, &payload.shipping_address).await?;
    let billing_address_id = match &payload.billing_address {
        Some(input) => Some(insert_address(&txn, owner, input).await?),
        None => None,
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(build_order_number()),
        customer_id: Set(owner.customer_id()),
        session_key: Set(owner.session_key().map(str::to_string)),
        order_status: Set("pending".into()),
        payment_status: Set("pending".into()),
        payment_method: Set(payload.payment_method.as_str().into()),
        subtotal: Set(quote.subtotal),
        shipping_cost: Set(quote.shipping_charge),
        // Held for the merchant's books; not part of total_amount.
        cod_charge: Set(quote.cod_charge),
        tax_amount: Set(Decimal::ZERO),
        discount_amount: Set(Decimal::ZERO),
        total_amount: Set(quote.grand_total),
        shipping_method_id: Set(payload.shipping_method_id),
        shipping_address_id: Set(Some(shipping_address_id)),
        billing_address_id: Set(billing_address_id),
        customer_notes: Set(payload.customer_notes),
        paid_at: Set(None),
        shipped_at: Set(None),
        delivered_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            variant_id: Set(line.variant_id),
            product_name: Set(line.product_name.clone()),
            variant_details: Set(line.variant_details.clone()),
            sku: Set(line.sku.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total_price: Set(pricing::quantize(line.line_total())),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));
    }

    StatusHistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        status: Set("pending".into()),
        note: Set("Order placed".into()),
        created_by: Set(ctx.actor()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    // Clear the cart; the cart row itself persists for reuse.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.orm,
        ctx,
        "checkout",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": order.id,
            "order_number": order.order_number,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    owner: &CartOwner,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = match owner {
        CartOwner::Customer(id) => Condition::all().add(OrderCol::CustomerId.eq(*id)),
        CartOwner::Guest(key) => Condition::all().add(OrderCol::SessionKey.eq(key.clone())),
    };
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::OrderStatus.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
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
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    owner: &CartOwner,
    order_number: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let owner_filter = match owner {
        CartOwner::Customer(id) => Condition::all().add(OrderCol::CustomerId.eq(*id)),
        CartOwner::Guest(key) => Condition::all().add(OrderCol::SessionKey.eq(key.clone())),
    };

    let order = Orders::find()
        .filter(owner_filter.add(OrderCol::OrderNumber.eq(order_number)))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

async fn insert_address<C: ConnectionTrait>(
    conn: &C,
    owner: &CartOwner,
    input: &AddressInput,
) -> AppResult<Uuid> {
    if input.full_name.trim().is_empty()
        || input.phone.trim().is_empty()
        || input.address_line1.trim().is_empty()
    {
        return Err(AppError::BadRequest(
            "name, phone and address are required".into(),
        ));
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(owner.customer_id()),
        session_key: Set(owner.session_key().map(str::to_string)),
        full_name: Set(input.full_name.clone()),
        phone: Set(input.phone.clone()),
        address_line1: Set(input.address_line1.clone()),
        district_id: Set(input.district_id),
        postal_code: Set(input.postal_code.clone().unwrap_or_default()),
        is_default_shipping: Set(false),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(address.id)
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        order_number: model.order_number,
        customer_id: model.customer_id,
        session_key: model.session_key,
        order_status: model.order_status,
        payment_status: model.payment_status,
        payment_method: model.payment_method,
        subtotal: model.subtotal,
        shipping_cost: model.shipping_cost,
        cod_charge: model.cod_charge,
        tax_amount: model.tax_amount,
        discount_amount: model.discount_amount,
        total_amount: model.total_amount,
        shipping_method_id: model.shipping_method_id,
        shipping_address_id: model.shipping_address_id,
        billing_address_id: model.billing_address_id,
        customer_notes: model.customer_notes,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        variant_id: model.variant_id,
        product_name: model.product_name,
        variant_details: model.variant_details,
        sku: model.sku,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total_price: model.total_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn build_order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", suffix[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_are_prefixed_eight_hex_chars() {
        let number = build_order_number();
        assert!(number.starts_with("ORD-"));
        assert_eq!(number.len(), 12);
        let suffix = &number[4..];
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(suffix, suffix.to_uppercase());
    }

    #[test]
    fn order_numbers_do_not_repeat() {
        let a = build_order_number();
        let b = build_order_number();
        assert_ne!(a, b);
    }
}

use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    dto::checkout::CartTotals,
    error::{AppError, AppResult},
    entity::{shipping_rates::Column as RateCol, Districts, ShippingRates},
    models::{Cart, CartOwner},
    pricing::{self, PricedLine, RateTable},
    services::cart_service::{self, CartLine},
    state::AppState,
};

/// Resolve a destination district into the two weight-tier rates the cart
/// formula consumes. `Ok(None)` means the district exists but is not mapped
/// to a zone; an unknown district id is `NotFound`.
pub async fn resolve_rate_table<C: ConnectionTrait>(
    conn: &C,
    district_id: Uuid,
    method_id: Option<Uuid>,
) -> AppResult<Option<RateTable>> {
    let district = Districts::find_by_id(district_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let Some(zone_id) = district.shipping_zone_id else {
        tracing::warn!(district = %district.name, "district has no shipping zone, quoting zero shipping");
        return Ok(None);
    };

    let mut condition = Condition::all()
        .add(RateCol::ShippingZoneId.eq(zone_id))
        .add(RateCol::CalculationType.eq("weight"));
    if let Some(method_id) = method_id {
        condition = condition.add(RateCol::ShippingMethodId.eq(method_id));
    }

    let rows = ShippingRates::find().filter(condition).all(conn).await?;

    // Base tier: the row covering exactly [0, 1) kg. Its per-kg value is the
    // flat fee for the whole first kilogram.
    let base_fee = rows
        .iter()
        .find(|r| r.min_weight == Some(Decimal::ZERO) && r.max_weight == Some(Decimal::ONE))
        .and_then(|r| r.rate_per_kg);

    // Extra tier: min_weight = 1 with no upper bound.
    let extra_per_kg = rows
        .iter()
        .find(|r| r.min_weight == Some(Decimal::ONE) && r.max_weight.is_none())
        .and_then(|r| r.rate_per_kg);

    if base_fee.is_none() {
        // Operational footgun: a zone without its [0, 1) row silently ships free.
        tracing::warn!(zone_id = %zone_id, "no base weight tier configured for zone, quoting zero shipping");
    }

    Ok(Some(RateTable {
        base_fee,
        extra_per_kg,
    }))
}

/// Totals for an already-loaded cart. Shipping is zero until the cart has a
/// destination that resolves to configured rates.
pub async fn totals_for<C: ConnectionTrait>(
    conn: &C,
    cart: &Cart,
    lines: &[CartLine],
) -> AppResult<CartTotals> {
    let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();

    let rates = match cart.district_id {
        Some(district_id) => resolve_rate_table(conn, district_id, None).await?,
        None => None,
    };

    let subtotal = pricing::subtotal(&priced);
    let shipping_charge = pricing::shipping_charge(pricing::chargeable_weight(&priced), rates.as_ref());

    Ok(CartTotals {
        subtotal,
        shipping_charge,
        grand_total: pricing::quantize(subtotal + shipping_charge),
    })
}

/// Structured breakdown for the checkout page and the destination-change
/// AJAX endpoint.
pub async fn cart_quote(state: &AppState, owner: &CartOwner) -> AppResult<CartTotals> {
    let cart = cart_service::get_or_create_cart(&state.pool, owner).await?;
    let lines = cart_service::load_cart_lines(&state.orm, cart.id).await?;
    totals_for(&state.orm, &cart, &lines).await
}

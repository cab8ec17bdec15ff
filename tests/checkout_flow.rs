use axum_storefront_api::{
    audit::AuditContext,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, QuantityAction},
        checkout::{AddressInput, PlaceOrderRequest},
    },
    entity::{
        districts::ActiveModel as DistrictActive,
        products::{ActiveModel as ProductActive, Model as ProductModel},
        shipping_methods::ActiveModel as MethodActive,
        shipping_rates::ActiveModel as RateActive,
        shipping_zones::ActiveModel as ZoneActive,
    },
    error::AppError,
    models::{CartOwner, PaymentMethod},
    services::{cart_service, checkout_service, order_service},
    state::AppState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Statement};
use uuid::Uuid;

// Full storefront flow against a real database: idempotent add-to-cart,
// destination-aware quoting, atomic materialization, empty-cart rejection.
#[tokio::test]
async fn cart_to_order_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;
    let ctx = AuditContext::anonymous();

    // Zone with the two weight tiers the cart formula reads.
    let zone = ZoneActive {
        id: Set(Uuid::new_v4()),
        name: Set("Test Zone".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let zoned_district = DistrictActive {
        id: Set(Uuid::new_v4()),
        name: Set("Zoned District".into()),
        shipping_zone_id: Set(Some(zone.id)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let unzoned_district = DistrictActive {
        id: Set(Uuid::new_v4()),
        name: Set("Unzoned District".into()),
        shipping_zone_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let method = MethodActive {
        id: Set(Uuid::new_v4()),
        name: Set("Standard".into()),
        delivery_type: Set("standard".into()),
        estimated_days_min: Set(1),
        estimated_days_max: Set(5),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    seed_rate(&state, method.id, zone.id, dec!(0.00), Some(dec!(1.00)), dec!(70.00)).await?;
    seed_rate(&state, method.id, zone.id, dec!(1.00), None, dec!(20.00)).await?;

    let normal = seed_product(&state, "Test Widget", "WID-1", dec!(300.00), dec!(0.5), false).await?;
    let free_ship = seed_product(&state, "Promo Bundle", "PRM-1", dec!(500.00), dec!(2.00), true).await?;
    let heavy = seed_product(&state, "Anvil", "ANV-1", dec!(1000.00), dec!(2.3), false).await?;

    let owner = CartOwner::Guest("it-checkout-session".into());

    // Adding the same (product, variant) twice increments the single row.
    cart_service::add_to_cart(
        &state,
        &ctx,
        &owner,
        AddToCartRequest {
            product_id: normal.id,
            variant_id: None,
            quantity: 1,
        },
    )
    .await?;
    let second_add = cart_service::add_to_cart(
        &state,
        &ctx,
        &owner,
        AddToCartRequest {
            product_id: normal.id,
            variant_id: None,
            quantity: 1,
        },
    )
    .await?;
    let merged = second_add.data.unwrap();
    assert_eq!(merged.quantity, 2);

    let cart = cart_service::get_or_create_cart(&state.pool, &owner).await?;
    let lines = cart_service::load_cart_lines(&state.orm, cart.id).await?;
    assert_eq!(lines.len(), 1, "repeated add must not duplicate the line");

    // Back down to one, then add the free-shipping item.
    cart_service::update_quantity(&state, &ctx, &owner, merged.id, QuantityAction::Decrement)
        .await?;
    cart_service::add_to_cart(
        &state,
        &ctx,
        &owner,
        AddToCartRequest {
            product_id: free_ship.id,
            variant_id: None,
            quantity: 1,
        },
    )
    .await?;

    // No destination yet: subtotal only.
    let totals = checkout_service::cart_quote(&state, &owner).await?;
    assert_eq!(totals.subtotal, dec!(800.00));
    assert_eq!(totals.shipping_charge, Decimal::ZERO);
    assert_eq!(totals.grand_total, dec!(800.00));

    // District without a zone still quotes, with free shipping.
    cart_service::set_destination(&state, &ctx, &owner, unzoned_district.id).await?;
    let totals = checkout_service::cart_quote(&state, &owner).await?;
    assert_eq!(totals.shipping_charge, Decimal::ZERO);

    // Zoned district: the 2kg promo item is excluded, so chargeable weight is
    // 0.5kg and only the base tier applies.
    cart_service::set_destination(&state, &ctx, &owner, zoned_district.id).await?;
    let totals = checkout_service::cart_quote(&state, &owner).await?;
    assert_eq!(totals.subtotal, dec!(800.00));
    assert_eq!(totals.shipping_charge, dec!(70.00));
    assert_eq!(totals.grand_total, dec!(870.00));

    // Materialize with cash on delivery.
    let placed = order_service::place_order(
        &state,
        &ctx,
        &owner,
        place_order_request(PaymentMethod::Cod),
    )
    .await?;
    let placed = placed.data.unwrap();
    let order = placed.order;

    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(order.order_number.len(), 12);
    assert_eq!(order.order_status, "pending");
    assert_eq!(order.payment_method, "cod");
    assert_eq!(order.subtotal, dec!(800.00));
    assert_eq!(order.shipping_cost, dec!(70.00));
    // 1% of the chargeable (non-free-shipping) subtotal, kept out of the total.
    assert_eq!(order.cod_charge, dec!(3.00));
    assert_eq!(order.total_amount, dec!(870.00));
    assert_eq!(order.total_amount, order.subtotal + order.shipping_cost);

    assert_eq!(placed.items.len(), 2);
    let snapshot = placed
        .items
        .iter()
        .find(|item| item.product_id == normal.id)
        .expect("widget line");
    assert_eq!(snapshot.product_name, "Test Widget");
    assert_eq!(snapshot.sku, "WID-1");
    assert_eq!(snapshot.unit_price, dec!(300.00));
    assert_eq!(snapshot.total_price, dec!(300.00));

    // The cart is emptied but survives for reuse.
    let lines = cart_service::load_cart_lines(&state.orm, cart.id).await?;
    assert!(lines.is_empty());

    // The order is readable back by its number, scoped to the owner.
    let fetched = order_service::get_order(&state, &owner, &order.order_number).await?;
    assert_eq!(fetched.data.unwrap().order.id, order.id);

    // Re-invoking materialization on the emptied cart is rejected, not duplicated.
    let rerun = order_service::place_order(
        &state,
        &ctx,
        &owner,
        place_order_request(PaymentMethod::Cod),
    )
    .await;
    assert!(matches!(rerun, Err(AppError::BadRequest(_))));

    // Partial kilograms above the first bill as whole kilograms:
    // 2.3kg -> base 70 + ceil(1.3) * 20 = 110.
    cart_service::add_to_cart(
        &state,
        &ctx,
        &owner,
        AddToCartRequest {
            product_id: heavy.id,
            variant_id: None,
            quantity: 1,
        },
    )
    .await?;
    let totals = checkout_service::cart_quote(&state, &owner).await?;
    assert_eq!(totals.shipping_charge, dec!(110.00));

    let placed = order_service::place_order(
        &state,
        &ctx,
        &owner,
        place_order_request(PaymentMethod::Bkash),
    )
    .await?;
    let order = placed.data.unwrap().order;
    assert_eq!(order.shipping_cost, dec!(110.00));
    assert_eq!(order.cod_charge, Decimal::ZERO);
    assert_eq!(order.total_amount, dec!(1110.00));

    Ok(())
}

fn place_order_request(payment_method: PaymentMethod) -> PlaceOrderRequest {
    PlaceOrderRequest {
        payment_method,
        shipping_address: AddressInput {
            full_name: "Test Shopper".into(),
            phone: "01700000000".into(),
            address_line1: "House 1, Road 1".into(),
            district_id: None,
            postal_code: Some("1207".into()),
        },
        billing_address: None,
        shipping_method_id: None,
        customer_notes: Some("ring the bell".into()),
    }
}

async fn seed_rate(
    state: &AppState,
    method_id: Uuid,
    zone_id: Uuid,
    min_weight: Decimal,
    max_weight: Option<Decimal>,
    rate_per_kg: Decimal,
) -> anyhow::Result<()> {
    RateActive {
        id: Set(Uuid::new_v4()),
        shipping_method_id: Set(method_id),
        shipping_zone_id: Set(zone_id),
        calculation_type: Set("weight".into()),
        flat_rate: Set(Decimal::ZERO),
        min_weight: Set(Some(min_weight)),
        max_weight: Set(max_weight),
        rate_per_kg: Set(Some(rate_per_kg)),
        min_order_value: Set(None),
        max_order_value: Set(None),
        free_shipping_over: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn seed_product(
    state: &AppState,
    name: &str,
    sku: &str,
    base_price: Decimal,
    weight_kg: Decimal,
    free_shipping: bool,
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        sku: Set(sku.into()),
        description: Set(None),
        base_price: Set(base_price),
        weight_kg: Set(Some(weight_kg)),
        free_shipping: Set(free_shipping),
        stock: Set(100),
        low_stock_threshold: Set(5),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url, 5).await?;

    // Clean tables between runs.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_status_history, order_items, orders, addresses, cart_items, carts, \
         shipping_rates, shipping_methods, districts, shipping_zones, product_variants, products, \
         audit_logs, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}

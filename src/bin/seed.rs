use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use axum_storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url, config.max_db_connections).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", "user").await?;

    let zone_id = ensure_zone(&pool, "Dhaka Metro").await?;
    ensure_district(&pool, "Dhaka", Some(zone_id)).await?;
    ensure_district(&pool, "Gazipur", Some(zone_id)).await?;
    // Left unzoned on purpose: exercises the zero-shipping fallback.
    ensure_district(&pool, "Bandarban", None).await?;

    let method_id = ensure_method(&pool, "Standard Delivery").await?;
    ensure_weight_rate(&pool, method_id, zone_id, "0.00", Some("1.00"), "70.00").await?;
    ensure_weight_rate(&pool, method_id, zone_id, "1.00", None, "20.00").await?;

    let panjabi_id = ensure_product(
        &pool,
        "Cotton Panjabi",
        "PNJ-001",
        "1200.00",
        Some("0.35"),
        false,
        50,
    )
    .await?;
    ensure_variant(&pool, panjabi_id, "White / L", "PNJ-001-WL", "1250.00", Some("0.40")).await?;
    ensure_product(
        &pool,
        "Ceramic Dinner Set",
        "CRM-014",
        "4500.00",
        Some("6.00"),
        false,
        12,
    )
    .await?;
    ensure_product(
        &pool,
        "Handloom Saree",
        "SAR-201",
        "3200.00",
        Some("0.60"),
        true,
        30,
    )
    .await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .execute(pool)
    .await?;

    let (user_id,): (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_zone(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    sqlx::query("INSERT INTO shipping_zones (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM shipping_zones WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn ensure_district(
    pool: &sqlx::PgPool,
    name: &str,
    zone_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO districts (id, name, shipping_zone_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (name) DO UPDATE SET shipping_zone_id = EXCLUDED.shipping_zone_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(zone_id)
    .execute(pool)
    .await?;
    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM districts WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn ensure_method(pool: &sqlx::PgPool, name: &str) -> anyhow::Result<Uuid> {
    sqlx::query(
        "INSERT INTO shipping_methods (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .execute(pool)
    .await?;
    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM shipping_methods WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn ensure_weight_rate(
    pool: &sqlx::PgPool,
    method_id: Uuid,
    zone_id: Uuid,
    min_weight: &str,
    max_weight: Option<&str>,
    rate_per_kg: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO shipping_rates
            (id, shipping_method_id, shipping_zone_id, calculation_type, min_weight, max_weight, rate_per_kg)
        VALUES ($1, $2, $3, 'weight', $4, $5, $6)
        ON CONFLICT (shipping_method_id, shipping_zone_id, calculation_type, min_weight) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(method_id)
    .bind(zone_id)
    .bind(min_weight.parse::<Decimal>()?)
    .bind(max_weight.map(|w| w.parse::<Decimal>()).transpose()?)
    .bind(rate_per_kg.parse::<Decimal>()?)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_product(
    pool: &sqlx::PgPool,
    name: &str,
    sku: &str,
    base_price: &str,
    weight_kg: Option<&str>,
    free_shipping: bool,
    stock: i32,
) -> anyhow::Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO products (id, name, sku, base_price, weight_kg, free_shipping, stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (sku) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(sku)
    .bind(base_price.parse::<Decimal>()?)
    .bind(weight_kg.map(|w| w.parse::<Decimal>()).transpose()?)
    .bind(free_shipping)
    .bind(stock)
    .execute(pool)
    .await?;
    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM products WHERE sku = $1")
        .bind(sku)
        .fetch_one(pool)
        .await?;
    println!("Ensured product {name} ({sku})");
    Ok(id)
}

async fn ensure_variant(
    pool: &sqlx::PgPool,
    product_id: Uuid,
    name: &str,
    sku: &str,
    price: &str,
    weight_kg: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO product_variants (id, product_id, name, sku, price, weight_kg, stock)
        VALUES ($1, $2, $3, $4, $5, $6, 20)
        ON CONFLICT (sku) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(name)
    .bind(sku)
    .bind(price.parse::<Decimal>()?)
    .bind(weight_kg.map(|w| w.parse::<Decimal>()).transpose()?)
    .execute(pool)
    .await?;
    Ok(())
}

use anyhow::Context;
use eshop_api::{
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = create_pool(&database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&orm_from_pool(&pool)).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin1234", true).await?;
    let user_id = ensure_user(&pool, "user", "user@example.com", "user1234", false).await?;
    seed_products(&pool).await?;
    seed_default_site(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    is_staff: bool,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_staff)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO UPDATE SET is_staff = EXCLUDED.is_staff
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_staff)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {username} (staff={is_staff})");
    Ok(user_id)
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<()> {
    let products = [
        ("Axum Hoodie", Decimal::new(5499, 2), 50),
        ("Ferris Mug", Decimal::new(1250, 2), 100),
        ("Rust Sticker Pack", Decimal::new(399, 2), 200),
        ("E-book: Async Rust", Decimal::new(2500, 2), 75),
    ];

    // Product names are not unique, so skip by name instead of ON CONFLICT.
    for (name, price, count) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, count)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(count)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_default_site(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sites (id, name, domain)
        VALUES ($1, 'example.com', 'example.com')
        ON CONFLICT (domain) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .execute(pool)
    .await?;

    println!("Seeded default site");
    Ok(())
}

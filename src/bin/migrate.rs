use anyhow::Context;
use eshop_api::db::{create_pool, orm_from_pool, run_migrations};

// Only needs DATABASE_URL, so migrations can run before the JWT secret is provisioned.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let pool = create_pool(&database_url, 1).await?;
    run_migrations(&orm_from_pool(&pool)).await?;
    println!("Migrations applied");
    Ok(())
}

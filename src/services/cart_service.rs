use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartSummaryList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartLine, CartSummary, Product},
    permissions::{Action, Resource, ensure},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{FieldErrors, check_quantity},
};

/// Sum of `price * quantity` over the given lines. Zero for an empty cart.
pub fn total_price<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| price * Decimal::from(quantity))
        .sum()
}

/// Renders a total with one fractional digit, rounding half to even.
pub fn format_total(total: Decimal) -> String {
    let rounded = total.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    format!("{:.1}", rounded)
}

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CartWithProductRow {
    line_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    price: Decimal,
    count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct CartSummaryRow {
    id: Uuid,
    user_id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PricedLineRow {
    cart_id: Uuid,
    price: Decimal,
    quantity: i32,
}

async fn cart_lines(pool: &DbPool, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS line_id, ci.quantity,
               p.id AS product_id, p.name, p.price, p.count, p.created_at, p.updated_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at, ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    let lines = rows
        .into_iter()
        .map(|row| CartLine {
            id: row.line_id,
            line_total: total_price([(row.price, row.quantity)]),
            product: Product {
                id: row.product_id,
                name: row.name,
                price: row.price,
                count: row.count,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            quantity: row.quantity,
        })
        .collect();
    Ok(lines)
}

async fn cart_view(pool: &DbPool, user_id: Uuid, cart: Option<CartRow>) -> AppResult<Cart> {
    let Some(cart) = cart else {
        return Ok(Cart {
            id: None,
            user_id,
            items: Vec::new(),
            total_price: Decimal::ZERO,
            total_price_display: format_total(Decimal::ZERO),
            created_at: None,
        });
    };

    let items = cart_lines(pool, cart.id).await?;
    let total = total_price(items.iter().map(|line| (line.product.price, line.quantity)));
    Ok(Cart {
        id: Some(cart.id),
        user_id: cart.user_id,
        items,
        total_price: total,
        total_price_display: format_total(total),
        created_at: Some(cart.created_at),
    })
}

async fn find_cart_by_user(pool: &DbPool, user_id: Uuid) -> AppResult<Option<CartRow>> {
    let cart = sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id, created_at FROM carts WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(cart)
}

/// The caller's cart. A user who never added anything gets an empty view and no row is created.
pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    ensure(user, Resource::Cart(user.user_id), Action::Read)?;
    let cart = find_cart_by_user(&state.pool, user.user_id).await?;
    let view = cart_view(&state.pool, user.user_id, cart).await?;
    Ok(ApiResponse::success("Cart", view, None))
}

fn unknown_product() -> AppError {
    let mut errors = FieldErrors::default();
    errors.add("product_id", "Product does not exist.");
    AppError::Validation(errors)
}

/// Puts a product in the caller's cart, creating the cart on first use.
/// Adding a product that is already in the cart sets its quantity.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    ensure(user, Resource::Cart(user.user_id), Action::Update)?;

    let mut errors = FieldErrors::default();
    check_quantity(&mut errors, payload.quantity);
    errors.finish()?;

    let mut tx = state.pool.begin().await?;
    // FOR SHARE holds off a concurrent product delete until the line is written.
    let product_exist: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 FOR SHARE")
            .bind(payload.product_id)
            .fetch_optional(&mut *tx)
            .await?;
    if product_exist.is_none() {
        return Err(unknown_product());
    }

    sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .execute(&mut *tx)
        .await?;
    let (cart_id,): (Uuid,) = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .execute(&mut *tx)
    .await
    .map_err(|err| {
        let missing_product = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_foreign_key_violation());
        if missing_product {
            unknown_product()
        } else {
            AppError::from(err)
        }
    })?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        product_id = %payload.product_id,
        quantity = payload.quantity,
        "cart item set"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    let cart = find_cart_by_user(&state.pool, user.user_id).await?;
    let view = cart_view(&state.pool, user.user_id, cart).await?;
    Ok(ApiResponse::success("OK", view, None))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    ensure(user, Resource::Cart(user.user_id), Action::Update)?;

    let mut errors = FieldErrors::default();
    check_quantity(&mut errors, payload.quantity);
    errors.finish()?;

    let result = sqlx::query(
        r#"
        UPDATE cart_items ci
        SET quantity = $3
        FROM carts c
        WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.quantity)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    let cart = find_cart_by_user(&state.pool, user.user_id).await?;
    let view = cart_view(&state.pool, user.user_id, cart).await?;
    Ok(ApiResponse::success("OK", view, None))
}

pub async fn remove_item(state: &AppState, user: &AuthUser, product_id: Uuid) -> AppResult<()> {
    ensure(user, Resource::Cart(user.user_id), Action::Delete)?;

    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.product_id = $2
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        user.user_id,
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(())
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<()> {
    ensure(user, Resource::Cart(user.user_id), Action::Delete)?;

    let result = sqlx::query(
        "DELETE FROM cart_items ci USING carts c WHERE ci.cart_id = c.id AND c.user_id = $1",
    )
    .bind(user.user_id)
    .execute(&state.pool)
    .await?;

    audit::record(
        &state.orm,
        user.user_id,
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": result.rows_affected() }),
    )
    .await;

    Ok(())
}

/// Staff overview: one row per cart with its owner and current total.
pub async fn list_carts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartSummaryList>> {
    ensure(user, Resource::Carts, Action::List)?;
    let (page, limit, offset) = pagination.normalize();

    let carts = sqlx::query_as::<_, CartSummaryRow>(
        r#"
        SELECT c.id, c.user_id, u.username, c.created_at
        FROM carts c
        JOIN users u ON u.id = c.user_id
        ORDER BY c.created_at DESC, c.id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM carts")
        .fetch_one(&state.pool)
        .await?;

    let cart_ids: Vec<Uuid> = carts.iter().map(|cart| cart.id).collect();
    let priced = sqlx::query_as::<_, PricedLineRow>(
        r#"
        SELECT ci.cart_id, p.price, ci.quantity
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = ANY($1)
        "#,
    )
    .bind(&cart_ids)
    .fetch_all(&state.pool)
    .await?;

    let mut lines_by_cart: HashMap<Uuid, Vec<(Decimal, i32)>> = HashMap::new();
    for row in priced {
        lines_by_cart
            .entry(row.cart_id)
            .or_default()
            .push((row.price, row.quantity));
    }

    let items = carts
        .into_iter()
        .map(|cart| {
            let lines = lines_by_cart.remove(&cart.id).unwrap_or_default();
            let item_count = lines.len() as i64;
            let total = total_price(lines);
            CartSummary {
                id: cart.id,
                user_id: cart.user_id,
                username: cart.username,
                item_count,
                total_price: total,
                total_price_display: format_total(total),
                created_at: cart.created_at,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Carts", CartSummaryList { items }, Some(meta)))
}

pub async fn get_cart_by_id(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    ensure(user, Resource::Carts, Action::Read)?;
    let cart = sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id, created_at FROM carts WHERE id = $1",
    )
    .bind(cart_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;

    ensure(user, Resource::Cart(cart.user_id), Action::Read)?;
    let view = cart_view(&state.pool, cart.user_id, Some(cart)).await?;
    Ok(ApiResponse::success("Cart", view, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn empty_cart_totals_zero() {
        let total = total_price(Vec::new());
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(format_total(total), "0.0");
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let lines = vec![(dec("10.00"), 2), (dec("2.50"), 3), (dec("0.99"), 1)];
        assert_eq!(total_price(lines), dec("28.49"));
    }

    #[test]
    fn total_tracks_current_prices() {
        let mut lines = vec![(dec("10.00"), 2)];
        assert_eq!(total_price(lines.clone()), dec("20.00"));
        lines[0].0 = dec("15.00");
        assert_eq!(total_price(lines), dec("30.00"));
    }

    #[test]
    fn display_keeps_one_fractional_digit() {
        assert_eq!(format_total(dec("28.49")), "28.5");
        assert_eq!(format_total(dec("20")), "20.0");
        assert_eq!(format_total(dec("0.04")), "0.0");
        assert_eq!(format_total(dec("1234.56")), "1234.6");
    }

    #[test]
    fn display_rounds_ties_to_even() {
        assert_eq!(format_total(dec("0.25")), "0.2");
        assert_eq!(format_total(dec("0.35")), "0.4");
    }
}

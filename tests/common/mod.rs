#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use eshop_api::{
    config::AuthConfig,
    db::{create_pool, run_migrations},
    dto::products::CreateProductRequest,
    entity::users::ActiveModel as UserActive,
    middleware::auth::{AuthUser, issue_token},
    routes::create_router,
    services::product_service,
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".into(),
        token_ttl_hours: 1,
    }
}

/// State backed by a pool that never connects; enough for routes that fail before touching the DB.
pub fn lazy_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://nobody@127.0.0.1:1/none")
        .expect("lazy pool");
    AppState::new(pool, auth_config())
}

/// Connected state, or `None` when no database is configured so the test can skip.
pub async fn setup() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 5).await?;
    let state = AppState::new(pool, auth_config());
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&state.orm).await })
        .await?;
    Ok(Some(state))
}

pub struct TestUser {
    pub auth: AuthUser,
    pub username: String,
    pub token: String,
}

/// Inserts a user with a unique username so tests can share one database.
pub async fn create_user(state: &AppState, prefix: &str, is_staff: bool) -> anyhow::Result<TestUser> {
    let id = Uuid::new_v4();
    let username = format!("{prefix}_{}", &id.simple().to_string()[..8]);
    UserActive {
        id: Set(id),
        username: Set(username.clone()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set(eshop_api::services::auth_service::hash_password("Justatest1")?),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_staff: Set(is_staff),
        disabled: Set(false),
        birth_date: Set(None),
        photo: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(TestUser {
        auth: AuthUser {
            user_id: id,
            is_staff,
        },
        token: issue_token(&state.auth, id, is_staff)?,
        username,
    })
}

pub async fn create_product(
    state: &AppState,
    staff: &AuthUser,
    name: &str,
    price: Decimal,
    count: i32,
) -> anyhow::Result<Uuid> {
    let resp = product_service::create_product(
        state,
        staff,
        CreateProductRequest {
            name: name.into(),
            price,
            count,
        },
    )
    .await?;
    Ok(resp.data.expect("product").id)
}

/// Sends one request through the full router and returns status plus parsed JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

pub fn app(state: &AppState) -> Router {
    create_router(state.clone())
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        UpdateMode,
        social_apps::{SocialAppList, SocialAppRequest},
    },
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::SocialApp,
    response::ApiResponse,
    routes::params::Pagination,
    services::social_app_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    // POST on an existing app is accepted as a full replace, same as PUT.
    Router::new()
        .route("/", get(list_social_apps).post(create_social_app))
        .route(
            "/{id}",
            get(get_social_app)
                .post(replace_social_app)
                .put(replace_social_app)
                .patch(patch_social_app)
                .delete(delete_social_app),
        )
}

#[utoipa::path(
    get,
    path = "/api/social-apps",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List social applications", body = ApiResponse<SocialAppList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Social Apps"
)]
pub async fn list_social_apps(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<SocialAppList>>> {
    let resp = social_app_service::list_social_apps(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/social-apps/{id}",
    params(("id" = Uuid, Path, description = "Social application ID")),
    responses(
        (status = 200, description = "Social application detail", body = ApiResponse<SocialApp>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Social Apps"
)]
pub async fn get_social_app(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SocialApp>>> {
    let resp = social_app_service::get_social_app(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/social-apps",
    request_body = SocialAppRequest,
    responses(
        (status = 201, description = "Created social application", body = ApiResponse<SocialApp>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Social Apps"
)]
pub async fn create_social_app(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SocialAppRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SocialApp>>)> {
    let resp = social_app_service::create_social_app(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/social-apps/{id}",
    params(("id" = Uuid, Path, description = "Social application ID")),
    request_body = SocialAppRequest,
    responses(
        (status = 200, description = "Replaced social application", body = ApiResponse<SocialApp>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Social Apps"
)]
pub async fn replace_social_app(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SocialAppRequest>,
) -> AppResult<Json<ApiResponse<SocialApp>>> {
    let resp =
        social_app_service::update_social_app(&state, &user, id, payload, UpdateMode::Full)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/social-apps/{id}",
    params(("id" = Uuid, Path, description = "Social application ID")),
    request_body = SocialAppRequest,
    responses(
        (status = 200, description = "Updated social application", body = ApiResponse<SocialApp>),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Social Apps"
)]
pub async fn patch_social_app(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SocialAppRequest>,
) -> AppResult<Json<ApiResponse<SocialApp>>> {
    let resp =
        social_app_service::update_social_app(&state, &user, id, payload, UpdateMode::Partial)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/social-apps/{id}",
    params(("id" = Uuid, Path, description = "Social application ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Social Apps"
)]
pub async fn delete_social_app(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    social_app_service::delete_social_app(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

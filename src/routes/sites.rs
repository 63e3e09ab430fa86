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
        sites::{SiteList, SiteRequest},
    },
    error::AppResult,
    extract::AppJson,
    middleware::auth::AuthUser,
    models::Site,
    response::ApiResponse,
    routes::params::Pagination,
    services::site_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sites).post(create_site))
        .route(
            "/{id}",
            get(get_site)
                .put(replace_site)
                .patch(patch_site)
                .delete(delete_site),
        )
}

#[utoipa::path(
    get,
    path = "/api/sites",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List sites", body = ApiResponse<SiteList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn list_sites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<SiteList>>> {
    let resp = site_service::list_sites(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sites/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 200, description = "Site detail", body = ApiResponse<Site>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Site not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn get_site(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Site>>> {
    let resp = site_service::get_site(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sites",
    request_body = SiteRequest,
    responses(
        (status = 201, description = "Created site", body = ApiResponse<Site>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Domain already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn create_site(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SiteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Site>>)> {
    let resp = site_service::create_site(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/sites/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    request_body = SiteRequest,
    responses(
        (status = 200, description = "Replaced site", body = ApiResponse<Site>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Site not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn replace_site(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SiteRequest>,
) -> AppResult<Json<ApiResponse<Site>>> {
    let resp = site_service::update_site(&state, &user, id, payload, UpdateMode::Full).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/sites/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    request_body = SiteRequest,
    responses(
        (status = 200, description = "Updated site", body = ApiResponse<Site>),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Site not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn patch_site(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SiteRequest>,
) -> AppResult<Json<ApiResponse<Site>>> {
    let resp =
        site_service::update_site(&state, &user, id, payload, UpdateMode::Partial).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/sites/{id}",
    params(("id" = Uuid, Path, description = "Site ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Site not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sites"
)]
pub async fn delete_site(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    site_service::delete_site(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::dto::UpdateMode;
use crate::dto::sites::{SiteList, SiteRequest};
use crate::{
    audit,
    entity::sites::{ActiveModel as SiteActive, Column as SiteCol, Entity as Sites},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Site,
    permissions::{Action, Resource, ensure},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{FieldErrors, check_max_len, check_not_blank},
};

const MAX_NAME_LEN: usize = 50;
const MAX_DOMAIN_LEN: usize = 100;

fn validate(payload: &SiteRequest, mode: UpdateMode) -> AppResult<()> {
    let mut errors = FieldErrors::default();
    if mode == UpdateMode::Full {
        errors.require("name", payload.name.as_ref());
        errors.require("domain", payload.domain.as_ref());
    }
    if let Some(name) = payload.name.as_deref() {
        check_not_blank(&mut errors, "name", name);
        check_max_len(&mut errors, "name", name.trim(), MAX_NAME_LEN);
    }
    if let Some(domain) = payload.domain.as_deref() {
        check_not_blank(&mut errors, "domain", domain);
        check_max_len(&mut errors, "domain", domain.trim(), MAX_DOMAIN_LEN);
        if domain.chars().any(char::is_whitespace) || domain.contains('/') {
            errors.add("domain", "Enter a valid domain name.");
        }
    }
    errors.finish()
}

/// Domains compare case-insensitively; the stored value keeps the caller's casing.
async fn ensure_domain_free(state: &AppState, domain: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let mut finder = Sites::find()
        .filter(Expr::expr(Func::lower(Expr::col(SiteCol::Domain))).eq(domain.to_lowercase()));
    if let Some(id) = exclude {
        finder = finder.filter(SiteCol::Id.ne(id));
    }
    if finder.count(&state.orm).await? > 0 {
        return Err(AppError::Conflict(
            "Site with this domain already exists".into(),
        ));
    }
    Ok(())
}

pub async fn list_sites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SiteList>> {
    ensure(user, Resource::Site, Action::List)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Sites::find().order_by_asc(SiteCol::Domain);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Site::from)
        .collect();

    Ok(ApiResponse::success(
        "Sites",
        SiteList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_site(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Site>> {
    ensure(user, Resource::Site, Action::Read)?;
    let site = Sites::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Site::from)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Site", site, None))
}

pub async fn create_site(
    state: &AppState,
    user: &AuthUser,
    payload: SiteRequest,
) -> AppResult<ApiResponse<Site>> {
    ensure(user, Resource::Site, Action::Create)?;
    validate(&payload, UpdateMode::Full)?;

    let name = payload.name.unwrap_or_default().trim().to_string();
    let domain = payload.domain.unwrap_or_default().trim().to_string();
    ensure_domain_free(state, &domain, None).await?;

    let site = SiteActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        domain: Set(domain),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.user_id, site_id = %site.id, "site created");
    audit::record(
        &state.orm,
        user.user_id,
        "site_create",
        "sites",
        serde_json::json!({ "site_id": site.id, "domain": site.domain }),
    )
    .await;

    Ok(ApiResponse::success(
        "Site created",
        Site::from(site),
        Some(Meta::empty()),
    ))
}

pub async fn update_site(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SiteRequest,
    mode: UpdateMode,
) -> AppResult<ApiResponse<Site>> {
    ensure(user, Resource::Site, Action::Update)?;
    validate(&payload, mode)?;

    let existing = Sites::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let domain = payload.domain.map(|d| d.trim().to_string());
    if let Some(domain) = domain.as_deref() {
        ensure_domain_free(state, domain, Some(id)).await?;
    }

    let mut active: SiteActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(domain) = domain {
        active.domain = Set(domain);
    }
    let site = active.update(&state.orm).await?;

    tracing::info!(user_id = %user.user_id, site_id = %site.id, "site updated");
    audit::record(
        &state.orm,
        user.user_id,
        "site_update",
        "sites",
        serde_json::json!({ "site_id": site.id, "domain": site.domain }),
    )
    .await;

    Ok(ApiResponse::success("Updated", Site::from(site), Some(Meta::empty())))
}

pub async fn delete_site(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure(user, Resource::Site, Action::Delete)?;
    let result = Sites::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %user.user_id, site_id = %id, "site deleted");
    audit::record(
        &state.orm,
        user.user_id,
        "site_delete",
        "sites",
        serde_json::json!({ "site_id": id }),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_needs_name_and_domain() {
        let payload = SiteRequest {
            name: Some("updated-example.com".into()),
            domain: None,
        };
        assert!(matches!(
            validate(&payload, UpdateMode::Full),
            Err(AppError::Validation(_))
        ));
        assert!(validate(&payload, UpdateMode::Partial).is_ok());
    }

    #[test]
    fn domain_must_be_a_bare_host() {
        let payload = SiteRequest {
            name: None,
            domain: Some("https://example.com/".into()),
        };
        assert!(validate(&payload, UpdateMode::Partial).is_err());
    }
}

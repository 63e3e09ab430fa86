use std::collections::{BTreeSet, HashMap};

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::dto::UpdateMode;
use crate::dto::social_apps::{SocialAppList, SocialAppRequest};
use crate::{
    audit,
    entity::{
        sites::{Column as SiteCol, Entity as Sites},
        social_app_sites::{
            ActiveModel as LinkActive, Column as LinkCol, Entity as SocialAppSites,
        },
        social_apps::{ActiveModel as AppActive, Column as AppCol, Entity as SocialApps},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::SocialApp,
    permissions::{Action, Resource, ensure},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    validation::{FieldErrors, check_max_len, check_not_blank},
};

pub const PROVIDERS: [&str; 5] = ["google", "github", "facebook", "apple", "microsoft"];

const MAX_NAME_LEN: usize = 40;
const MAX_CREDENTIAL_LEN: usize = 191;

fn validate(payload: &SocialAppRequest, mode: UpdateMode) -> AppResult<()> {
    let mut errors = FieldErrors::default();
    if mode == UpdateMode::Full {
        errors.require("provider", payload.provider.as_ref());
        errors.require("name", payload.name.as_ref());
        errors.require("client_id", payload.client_id.as_ref());
    }
    if let Some(provider) = payload.provider.as_deref() {
        if !PROVIDERS.contains(&provider) {
            errors.add(
                "provider",
                format!("\"{provider}\" is not a valid choice."),
            );
        }
    }
    if let Some(name) = payload.name.as_deref() {
        check_not_blank(&mut errors, "name", name);
        check_max_len(&mut errors, "name", name.trim(), MAX_NAME_LEN);
    }
    if let Some(client_id) = payload.client_id.as_deref() {
        check_not_blank(&mut errors, "client_id", client_id);
        check_max_len(&mut errors, "client_id", client_id.trim(), MAX_CREDENTIAL_LEN);
    }
    if let Some(secret) = payload.secret.as_deref() {
        check_max_len(&mut errors, "secret", secret, MAX_CREDENTIAL_LEN);
    }
    if let Some(key) = payload.key.as_deref() {
        check_max_len(&mut errors, "key", key, MAX_CREDENTIAL_LEN);
    }
    errors.finish()
}

async fn ensure_sites_exist<C: ConnectionTrait>(conn: &C, site_ids: &[Uuid]) -> AppResult<()> {
    if site_ids.is_empty() {
        return Ok(());
    }
    let found = Sites::find()
        .filter(SiteCol::Id.is_in(site_ids.iter().copied()))
        .count(conn)
        .await?;
    if found as usize != site_ids.len() {
        let mut errors = FieldErrors::default();
        errors.add("site_ids", "One or more sites do not exist.");
        return Err(AppError::Validation(errors));
    }
    Ok(())
}

async fn replace_links<C: ConnectionTrait>(conn: &C, app_id: Uuid, site_ids: &[Uuid]) -> AppResult<()> {
    SocialAppSites::delete_many()
        .filter(LinkCol::SocialAppId.eq(app_id))
        .exec(conn)
        .await?;
    if site_ids.is_empty() {
        return Ok(());
    }
    let links = site_ids.iter().map(|site_id| LinkActive {
        social_app_id: Set(app_id),
        site_id: Set(*site_id),
    });
    SocialAppSites::insert_many(links)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn linked_sites<C: ConnectionTrait>(conn: &C, app_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    let mut by_app: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    if app_ids.is_empty() {
        return Ok(by_app);
    }
    let links = SocialAppSites::find()
        .filter(LinkCol::SocialAppId.is_in(app_ids.iter().copied()))
        .order_by_asc(LinkCol::SiteId)
        .all(conn)
        .await?;
    for link in links {
        by_app.entry(link.social_app_id).or_default().push(link.site_id);
    }
    Ok(by_app)
}

fn dedup(site_ids: Vec<Uuid>) -> Vec<Uuid> {
    site_ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

pub async fn list_social_apps(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SocialAppList>> {
    ensure(user, Resource::SocialApp, Action::List)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = SocialApps::find().order_by_asc(AppCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let apps = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = apps.iter().map(|app| app.id).collect();
    let mut sites = linked_sites(&state.orm, &ids).await?;
    let items = apps
        .into_iter()
        .map(|app| {
            let site_ids = sites.remove(&app.id).unwrap_or_default();
            SocialApp::from_parts(app, site_ids)
        })
        .collect();

    Ok(ApiResponse::success(
        "Social applications",
        SocialAppList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_social_app(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SocialApp>> {
    ensure(user, Resource::SocialApp, Action::Read)?;
    let app = SocialApps::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let site_ids = linked_sites(&state.orm, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    Ok(ApiResponse::success(
        "Social application",
        SocialApp::from_parts(app, site_ids),
        None,
    ))
}

pub async fn create_social_app(
    state: &AppState,
    user: &AuthUser,
    payload: SocialAppRequest,
) -> AppResult<ApiResponse<SocialApp>> {
    ensure(user, Resource::SocialApp, Action::Create)?;
    validate(&payload, UpdateMode::Full)?;

    let site_ids = dedup(payload.site_ids.unwrap_or_default());
    let txn = state.orm.begin().await?;
    ensure_sites_exist(&txn, &site_ids).await?;

    let app = AppActive {
        id: Set(Uuid::new_v4()),
        provider: Set(payload.provider.unwrap_or_default()),
        name: Set(payload.name.unwrap_or_default().trim().to_string()),
        client_id: Set(payload.client_id.unwrap_or_default().trim().to_string()),
        secret: Set(payload.secret.unwrap_or_default()),
        key: Set(payload.key.unwrap_or_default()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    replace_links(&txn, app.id, &site_ids).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, social_app_id = %app.id, provider = %app.provider, "social app created");
    audit::record(
        &state.orm,
        user.user_id,
        "social_app_create",
        "social_apps",
        serde_json::json!({ "social_app_id": app.id, "provider": app.provider }),
    )
    .await;

    Ok(ApiResponse::success(
        "Social application created",
        SocialApp::from_parts(app, site_ids),
        Some(Meta::empty()),
    ))
}

pub async fn update_social_app(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SocialAppRequest,
    mode: UpdateMode,
) -> AppResult<ApiResponse<SocialApp>> {
    ensure(user, Resource::SocialApp, Action::Update)?;
    validate(&payload, mode)?;

    let txn = state.orm.begin().await?;
    let existing = SocialApps::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let site_ids = match (mode, payload.site_ids) {
        (_, Some(site_ids)) => Some(dedup(site_ids)),
        (UpdateMode::Full, None) => Some(Vec::new()),
        (UpdateMode::Partial, None) => None,
    };
    if let Some(site_ids) = site_ids.as_deref() {
        ensure_sites_exist(&txn, site_ids).await?;
    }

    let mut active: AppActive = existing.into();
    if let Some(provider) = payload.provider {
        active.provider = Set(provider);
    }
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(client_id) = payload.client_id {
        active.client_id = Set(client_id.trim().to_string());
    }
    match mode {
        UpdateMode::Full => {
            active.secret = Set(payload.secret.unwrap_or_default());
            active.key = Set(payload.key.unwrap_or_default());
        }
        UpdateMode::Partial => {
            if let Some(secret) = payload.secret {
                active.secret = Set(secret);
            }
            if let Some(key) = payload.key {
                active.key = Set(key);
            }
        }
    }
    let app = active.update(&txn).await?;
    if let Some(site_ids) = site_ids.as_deref() {
        replace_links(&txn, app.id, site_ids).await?;
    }
    let site_ids = linked_sites(&txn, &[app.id])
        .await?
        .remove(&app.id)
        .unwrap_or_default();
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, social_app_id = %app.id, "social app updated");
    audit::record(
        &state.orm,
        user.user_id,
        "social_app_update",
        "social_apps",
        serde_json::json!({ "social_app_id": app.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        SocialApp::from_parts(app, site_ids),
        Some(Meta::empty()),
    ))
}

pub async fn delete_social_app(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure(user, Resource::SocialApp, Action::Delete)?;

    let txn = state.orm.begin().await?;
    SocialAppSites::delete_many()
        .filter(LinkCol::SocialAppId.eq(id))
        .exec(&txn)
        .await?;
    let result = SocialApps::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, social_app_id = %id, "social app deleted");
    audit::record(
        &state.orm,
        user.user_id,
        "social_app_delete",
        "social_apps",
        serde_json::json!({ "social_app_id": id }),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_without_provider_is_invalid() {
        let payload = SocialAppRequest {
            name: Some("Test App".into()),
            client_id: Some("abc123".into()),
            secret: Some("def456".into()),
            ..Default::default()
        };
        match validate(&payload, UpdateMode::Full) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("provider").is_some());
                assert!(errors.get("name").is_none());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let payload = SocialAppRequest {
            provider: Some("myspace".into()),
            ..Default::default()
        };
        assert!(validate(&payload, UpdateMode::Partial).is_err());

        let payload = SocialAppRequest {
            provider: Some("google".into()),
            ..Default::default()
        };
        assert!(validate(&payload, UpdateMode::Partial).is_ok());
    }

    #[test]
    fn site_ids_are_deduplicated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ids = dedup(vec![a, b, a]);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a) && ids.contains(&b));
    }
}

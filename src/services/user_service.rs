use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::dto::UpdateMode;
use crate::dto::users::{UpdateUserRequest, UserList};
use crate::{
    audit,
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    permissions::{Action, Resource, ensure},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::auth_service::hash_password,
    state::AppState,
    validation::{
        FieldErrors, MAX_PERSON_NAME_LEN, check_email, check_max_len, check_password,
        check_username,
    },
};

/// Rejects a username or email already held by another account.
///
/// `exclude` is the account being edited, which may keep its own values.
pub async fn ensure_unique_identity(
    state: &AppState,
    exclude: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> AppResult<()> {
    let not_self = |condition: Condition| match exclude {
        Some(id) => condition.add(UserCol::Id.ne(id)),
        None => condition,
    };

    if let Some(username) = username {
        let taken = Users::find()
            .filter(not_self(Condition::all().add(UserCol::Username.eq(username))))
            .count(&state.orm)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict("Username is already taken".into()));
        }
    }

    if let Some(email) = email {
        let taken = Users::find()
            .filter(not_self(Condition::all().add(UserCol::Email.eq(email))))
            .count(&state.orm)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict("Email is already taken".into()));
        }
    }

    Ok(())
}

pub async fn list_users(
    state: &AppState,
    actor: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure(actor, Resource::Users, Action::List)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_asc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(state: &AppState, actor: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    ensure(actor, Resource::User(id), Action::Read)?;
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(User::from)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", user, None))
}

fn validate_update(
    actor: &AuthUser,
    payload: &UpdateUserRequest,
    mode: UpdateMode,
) -> AppResult<()> {
    if !actor.is_staff && (payload.is_staff.is_some() || payload.disabled.is_some()) {
        return Err(AppError::Forbidden);
    }

    let mut errors = FieldErrors::default();
    if mode == UpdateMode::Full {
        errors.require("username", payload.username.as_ref());
        errors.require("email", payload.email.as_ref());
        errors.require("first_name", payload.first_name.as_ref());
        errors.require("last_name", payload.last_name.as_ref());
    }
    if let Some(username) = payload.username.as_deref() {
        check_username(&mut errors, username.trim());
    }
    if let Some(email) = payload.email.as_deref() {
        check_email(&mut errors, email.trim());
    }
    if let Some(password) = payload.password.as_deref() {
        check_password(&mut errors, password);
    }
    if let Some(first_name) = payload.first_name.as_deref() {
        check_max_len(&mut errors, "first_name", first_name.trim(), MAX_PERSON_NAME_LEN);
    }
    if let Some(last_name) = payload.last_name.as_deref() {
        check_max_len(&mut errors, "last_name", last_name.trim(), MAX_PERSON_NAME_LEN);
    }
    errors.finish()
}

pub async fn update_user(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
    mode: UpdateMode,
) -> AppResult<ApiResponse<User>> {
    ensure(actor, Resource::User(id), Action::Update)?;
    validate_update(actor, &payload, mode)?;

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let username = payload.username.map(|u| u.trim().to_string());
    let email = payload.email.map(|e| e.trim().to_string());
    ensure_unique_identity(state, Some(id), username.as_deref(), email.as_deref()).await?;

    let mut active: UserActive = existing.into();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(password) = payload.password.as_deref() {
        active.password_hash = Set(hash_password(password)?);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    match mode {
        UpdateMode::Full => {
            active.birth_date = Set(payload.birth_date.flatten());
            active.photo = Set(payload.photo.flatten());
        }
        UpdateMode::Partial => {
            if let Some(birth_date) = payload.birth_date {
                active.birth_date = Set(birth_date);
            }
            if let Some(photo) = payload.photo {
                active.photo = Set(photo);
            }
        }
    }
    if let Some(is_staff) = payload.is_staff {
        active.is_staff = Set(is_staff);
    }
    if let Some(disabled) = payload.disabled {
        active.disabled = Set(disabled);
    }
    active.updated_at = Set(Utc::now().into());

    let user = active.update(&state.orm).await?;

    tracing::info!(actor_id = %actor.user_id, user_id = %user.id, "user updated");
    audit::record(
        &state.orm,
        actor.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", User::from(user), Some(Meta::empty())))
}

/// Deletes the account and, in the same transaction, its cart and cart lines.
pub async fn delete_user(state: &AppState, actor: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure(actor, Resource::User(id), Action::Delete)?;

    let txn = state.orm.begin().await?;
    let cart_ids: Vec<Uuid> = Carts::find()
        .select_only()
        .column(CartCol::Id)
        .filter(CartCol::UserId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    if !cart_ids.is_empty() {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.is_in(cart_ids.clone()))
            .exec(&txn)
            .await?;
        Carts::delete_many()
            .filter(CartCol::Id.is_in(cart_ids))
            .exec(&txn)
            .await?;
    }

    let result = Users::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    tracing::info!(actor_id = %actor.user_id, user_id = %id, "user deleted");
    audit::record(
        &state.orm,
        actor.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: false,
        }
    }

    #[test]
    fn customers_cannot_grant_themselves_staff() {
        let payload = UpdateUserRequest {
            is_staff: Some(true),
            ..Default::default()
        };
        assert!(matches!(
            validate_update(&customer(), &payload, UpdateMode::Partial),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn full_update_requires_identity_fields() {
        let payload = UpdateUserRequest {
            email: Some("newemail@test.com".into()),
            ..Default::default()
        };
        match validate_update(&customer(), &payload, UpdateMode::Full) {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("username").is_some());
                assert!(errors.get("first_name").is_some());
                assert!(errors.get("last_name").is_some());
                assert!(errors.get("email").is_none());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn partial_update_checks_only_present_fields() {
        let payload = UpdateUserRequest {
            first_name: Some("New_test_name".into()),
            ..Default::default()
        };
        assert!(validate_update(&customer(), &payload, UpdateMode::Partial).is_ok());

        let payload = UpdateUserRequest {
            password: Some("Password_without_numbers".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_update(&customer(), &payload, UpdateMode::Partial),
            Err(AppError::Validation(_))
        ));
    }
}

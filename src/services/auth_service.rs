use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::dto::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::{
    audit,
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::issue_token,
    models::User,
    response::{ApiResponse, Meta},
    services::user_service::ensure_unique_identity,
    state::AppState,
    validation::{
        FieldErrors, MAX_PERSON_NAME_LEN, check_email, check_max_len, check_password,
        check_username,
    },
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
        first_name,
        last_name,
    } = payload;
    let username = username.trim().to_string();
    let email = email.trim().to_string();

    let mut errors = FieldErrors::default();
    check_username(&mut errors, &username);
    check_email(&mut errors, &email);
    check_password(&mut errors, &password);
    check_max_len(&mut errors, "first_name", first_name.trim(), MAX_PERSON_NAME_LEN);
    check_max_len(&mut errors, "last_name", last_name.trim(), MAX_PERSON_NAME_LEN);
    errors.finish()?;

    ensure_unique_identity(state, None, Some(&username), Some(&email)).await?;

    let active = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        is_staff: Set(false),
        disabled: Set(false),
        birth_date: Set(None),
        photo: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let user = active.insert(&state.orm).await?;

    tracing::info!(user_id = %user.id, "user registered");
    audit::record(
        &state.orm,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { login, password } = payload;
    let login = login.trim();

    // One account's username can equal another's email. Try every match,
    // email matches first when `login` contains '@'.
    let mut candidates = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Username.eq(login))
                .add(UserCol::Email.eq(login)),
        )
        .all(&state.orm)
        .await?;
    let prefer_email = login.contains('@');
    candidates.sort_by_key(|u| {
        if prefer_email {
            u.email != login
        } else {
            u.username != login
        }
    });

    let mut matched = None;
    for candidate in candidates {
        if verify_password(&password, &candidate.password_hash)? {
            matched = Some(candidate);
            break;
        }
    }
    let user = matched.ok_or_else(|| AppError::BadRequest("Invalid credentials".into()))?;

    if user.disabled {
        tracing::info!(user_id = %user.id, "login refused for disabled user");
        return Err(AppError::Forbidden);
    }

    let token = issue_token(&state.auth, user.id, user.is_staff)?;

    audit::record(
        &state.orm,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
        user: User::from(user),
    };

    Ok(ApiResponse::success(
        "Logged in",
        resp,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_and_differs_from_plaintext() {
        let hash = hash_password("Justatest1").unwrap();
        assert_ne!(hash, "Justatest1");
        assert!(verify_password("Justatest1", &hash).unwrap());
        assert!(!verify_password("Justatest2", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("Justatest1", "dummy"),
            Err(AppError::Internal(_))
        ));
    }
}

use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, ChangePasswordResponse, CreateAccountRequest,
            CreateAccountResponse, CreatedAccount, PublicUser,
        },
        repo_types::User,
        services::{authorize_password_change, hash_password, is_valid_email, AuthUser},
    },
    error::ApiError,
    state::AppState,
};

/// Minimum accepted password length, shared with the client-side mirror.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/create-account", post(create_account))
        .route("/auth/change-password", put(change_password))
}

#[instrument(skip(state, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, ApiError> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::validation("name", "Name is required"));
    }
    if email.is_empty() {
        return Err(ApiError::validation("email", "Email is required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("email", "Invalid email"));
    }
    if payload.old_password.is_empty() {
        return Err(ApiError::validation("oldPassword", "Old password is required"));
    }
    if payload.new_password.is_empty() {
        return Err(ApiError::validation("newPassword", "New password is required"));
    }
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(
            "newPassword",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if payload.old_password == payload.new_password {
        return Err(ApiError::validation(
            "newPassword",
            "New password must be different from the old password",
        ));
    }

    // Fast-path duplicate check; the unique index on users.email has the
    // final say if a concurrent creation slips past it.
    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict);
    }

    let hash = hash_password(&payload.new_password)?;
    let role = payload.role.unwrap_or_default();
    let user = User::create(&state.db, &name, &email, &hash, role).await?;

    info!(user_id = %user.id, email = %user.email, "account created");
    Ok(Json(CreateAccountResponse {
        success: true,
        data: CreatedAccount {
            user: PublicUser::from(&user),
        },
        message: "Account created".to_string(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, ApiError> {
    if payload.old_password.is_empty() {
        return Err(ApiError::validation("oldPassword", "Old password is required"));
    }
    if payload.new_password.is_empty() {
        return Err(ApiError::validation("newPassword", "New password is required"));
    }
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        warn!(user_id = %user_id, "password too short");
        return Err(ApiError::validation(
            "newPassword",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    authorize_password_change(&user, &payload.old_password, &payload.new_password)?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(ChangePasswordResponse {
        success: true,
        message: "Password changed".to_string(),
    }))
}

use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
        jwt::JwtKeys,
        password::verify_password,
        validate::{is_strong_password, is_valid_email, normalize_email, normalize_name},
    },
    error::AppError,
    state::AppState,
    users,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

fn token_pair(
    state: &AppState,
    user: &users::dto::UserProfile,
) -> Result<(String, String), AppError> {
    let keys = JwtKeys::from_ref(state);
    let access = keys.sign_access(user.id, &user.email)?;
    let refresh = keys.sign_refresh(user.id, &user.email)?;
    Ok((access, refresh))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = normalize_email(&payload.email);

    let Some(name) = normalize_name(&payload.name) else {
        warn!("invalid name");
        return Err(AppError::InvalidInput("name"));
    };
    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err(AppError::InvalidInput("e-mail address"));
    }
    if !is_strong_password(&payload.password) {
        warn!("weak password");
        return Err(AppError::InvalidInput("password"));
    }

    let user = users::service::register(&state, &name, &payload.email, &payload.password).await?;
    let (access_token, refresh_token) = token_pair(&state, &user)?;

    info!(user_id = %user.id, "dealer registered");
    Ok(Json(AuthResponse { access_token, refresh_token, user }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err(AppError::InvalidInput("e-mail address"));
    }

    // Unknown e-mail and bad password are indistinguishable to the caller.
    let Some(row) = users::service::find_by_email(&state, &payload.email).await? else {
        warn!("login with unknown email");
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&payload.password, &row.password_hash)? {
        warn!(user_id = %row.id, "login with invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let user = users::service::to_profile(&state, row)?;
    let (access_token, refresh_token) = token_pair(&state, &user)?;

    info!(user_id = %user.id, "dealer logged in");
    Ok(Json(AuthResponse { access_token, refresh_token, user }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::InvalidCredentials)?;

    // Re-read the profile so the new pair carries the current e-mail, not
    // whatever the old token claimed.
    let user = users::service::find_profile(&state, claims.sub).await?;
    let (access_token, refresh_token) = token_pair(&state, &user)?;

    Ok(Json(AuthResponse { access_token, refresh_token, user }))
}

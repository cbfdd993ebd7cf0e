use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        jwt::AuthUser,
        validate::{is_strong_password, is_valid_email, normalize_email},
    },
    error::AppError,
    state::AppState,
    users::{
        dto::{UpdateMeRequest, UserProfile},
        service,
    },
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me", put(update_me))
}

#[instrument(skip(state, user))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = service::find_profile(&state, user.id).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, user, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut payload): Json<UpdateMeRequest>,
) -> Result<Json<UserProfile>, AppError> {
    if let Some(email) = payload.email.take() {
        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            warn!("invalid new email");
            return Err(AppError::InvalidInput("e-mail address"));
        }
        payload.email = Some(email);
    }
    if let Some(password) = payload.password.as_deref() {
        if !is_strong_password(password) {
            warn!("weak new password");
            return Err(AppError::InvalidInput("password"));
        }
    }

    let profile = service::update(&state, user.id, &user.email, &payload).await?;
    Ok(Json(profile))
}

use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, TokenResponse},
        jwt::JwtKeys,
        services::verify_password,
    },
    error::{ApiError, AppJson},
    state::AppState,
    users::{repo_types::UserFields, services},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/registers/", post(register))
        .route("/login/", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UserFields>,
) -> Result<&'static str, ApiError> {
    if services::find_by_username(&state, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Duplicate);
    }

    let user = services::create_user(&state, payload).await?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok("User created successfully")
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Some(user) = services::find_by_username(&state, &payload.username).await? else {
        warn!(username = %payload.username, "login unknown username");
        return Err(ApiError::NotFound);
    };

    if !verify_password(&state, payload.password, user.password.clone()).await? {
        warn!(user_id = %user.id, username = %user.username, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.issue(&user.username).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e.to_string())
    })?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse { token }))
}

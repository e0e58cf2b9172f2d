use axum::extract::{Extension, State};

use super::{message, MessageResponse};
use crate::auth::{create_token, verify_password, CurrentUser};
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::models::{LoginRequest, TokenResponse, User};
use crate::AppState;

fn bad_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<ApiJson<TokenResponse>> {
    let Some(user) = state.store.find_user_by_email(&request.email).await? else {
        log::info!("login failed for unknown email {}", request.email);
        return Err(bad_credentials());
    };
    if !user.is_active || !verify_password(&request.password, &user.password_hash) {
        log::info!("login failed for {}", request.email);
        return Err(bad_credentials());
    }

    state.store.record_login(user.id).await?;
    let access_token = create_token(
        &user,
        &state.config.jwt_secret,
        state.config.access_token_expire_minutes,
    )?;
    log::info!("{} logged in", user.email);
    Ok(ApiJson(TokenResponse {
        access_token,
        token_type: "bearer",
        user,
    }))
}

/// Tokens are stateless; the client just drops its copy.
pub async fn logout() -> ApiJson<MessageResponse> {
    message("Logged out successfully")
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> ApiJson<User> {
    ApiJson(user.0)
}

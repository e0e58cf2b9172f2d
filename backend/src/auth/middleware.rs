use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{ApiError, ApiResult};
use crate::models::{User, UserRole};
use crate::AppState;

/// The authenticated back-office user, placed in request extensions by [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }
}

pub fn require_admin(user: &CurrentUser) -> ApiResult<()> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

fn bearer_token(request: &Request) -> ApiResult<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

/// Resolves the bearer token to an active user. Customers are authenticated but refused.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(&request)?;
    let claims = super::validate_token(token, &state.config.jwt_secret).map_err(|err| {
        log::info!("rejected token: {err}");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user = match state.store.get_user(claims.sub).await {
        Ok(user) => user,
        Err(ApiError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("User not found".to_string()))
        }
        Err(err) => return Err(err),
    };
    if !user.is_active {
        return Err(ApiError::Unauthorized("User account is disabled".to_string()));
    }
    if !user.role.is_back_office() {
        return Err(ApiError::Forbidden("Staff access required".to_string()));
    }

    log::debug!("authenticated {} ({})", user.email, user.role);
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

//! Back-office account management. Every route here is admin only.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, require_admin, CurrentUser};
use crate::error::{ApiError, ApiJson, ApiPath, ApiResult};
use crate::models::{NewUser, NewUserRecord, User, UserRole, UserUpdate, MAX_ADMINS};
use crate::AppState;

fn admin_cap_reached() -> ApiError {
    ApiError::Conflict(format!(
        "Maximum number of admins ({MAX_ADMINS}) reached. You cannot create more admins."
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<ApiJson<Vec<User>>> {
    require_admin(&user)?;
    Ok(ApiJson(state.store.list_users().await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(new): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, ApiJson<User>)> {
    require_admin(&user)?;
    new.validate()?;
    if new.role == UserRole::Admin && state.store.count_admins().await? >= MAX_ADMINS {
        return Err(admin_cap_reached());
    }

    let record = NewUserRecord {
        password_hash: hash_password(&new.password)?,
        username: new.username,
        email: new.email,
        full_name: new.full_name,
        role: new.role,
    };
    let created = state.store.create_user(record).await?;
    log::info!("{} created {} account {}", user.0.email, created.role, created.email);
    Ok((StatusCode::CREATED, ApiJson(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<ApiJson<User>> {
    require_admin(&user)?;
    update.validate()?;
    if update.role == Some(UserRole::Admin) {
        let target = state.store.get_user(id).await?;
        if target.role != UserRole::Admin && state.store.count_admins().await? >= MAX_ADMINS {
            return Err(admin_cap_reached());
        }
    }
    Ok(ApiJson(state.store.update_user(id, update).await?))
}

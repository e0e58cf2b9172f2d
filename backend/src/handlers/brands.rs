use axum::extract::{Extension, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use super::{message, MessageResponse};
use crate::auth::{require_admin, CurrentUser};
use crate::error::{ApiJson, ApiPath, ApiResult};
use crate::models::{Brand, BrandUpdate, NewBrand};
use crate::AppState;

/// Storefront list: active brands only.
pub async fn list_active(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<Brand>>> {
    Ok(ApiJson(state.store.list_brands(true).await?))
}

pub async fn list_all(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<Brand>>> {
    Ok(ApiJson(state.store.list_brands(false).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(new): ApiJson<NewBrand>,
) -> ApiResult<(StatusCode, ApiJson<Brand>)> {
    require_admin(&user)?;
    new.validate()?;
    let brand = state.store.create_brand(new).await?;
    Ok((StatusCode::CREATED, ApiJson(brand)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<BrandUpdate>,
) -> ApiResult<ApiJson<Brand>> {
    require_admin(&user)?;
    update.validate()?;
    Ok(ApiJson(state.store.update_brand(id, update).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<MessageResponse>> {
    require_admin(&user)?;
    state.store.delete_brand(id).await?;
    Ok(message("Brand deleted successfully"))
}

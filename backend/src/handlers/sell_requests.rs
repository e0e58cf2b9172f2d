use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{admin_page, message, read_upload, MessageResponse};
use crate::auth::{require_admin, CurrentUser};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::images::SELL_REQUESTS;
use crate::listing::Page;
use crate::models::{
    NewSellRequest, SellRequest, SellRequestImage, SellRequestStatus, SellRequestStatusUpdate,
    Valuation,
};
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewSellRequest>,
) -> ApiResult<(StatusCode, ApiJson<SellRequest>)> {
    new.validate()?;
    let request = state.store.create_sell_request(new).await?;
    log::info!(
        "new sell request {} for a {} {} {}",
        request.id,
        request.vehicle_year,
        request.vehicle_make,
        request.vehicle_model
    );
    Ok((StatusCode::CREATED, ApiJson(request)))
}

/// Public: sellers attach photos to the request they just submitted.
pub async fn upload_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, ApiJson<SellRequestImage>)> {
    let file = read_upload(multipart, &state.images).await?;
    state.store.get_sell_request(id).await?;
    let reference = state.images.upload(file, SELL_REQUESTS).await?;

    match state.store.add_sell_request_image(id, reference.clone()).await {
        Ok(image) => Ok((StatusCode::CREATED, ApiJson(image))),
        Err(err) => {
            state.images.discard(&reference).await;
            Err(err)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequestListParams {
    pub page: Option<i64>,
    #[serde(alias = "limit", alias = "page_size")]
    pub page_size: Option<i64>,
    pub status: Option<SellRequestStatus>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SellRequestListParams>,
) -> ApiResult<ApiJson<Page<SellRequest>>> {
    let page = admin_page(params.page, params.page_size)?;
    let (items, total) = state.store.list_sell_requests(params.status, page).await?;
    Ok(ApiJson(Page::new(items, total, page)))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<SellRequest>> {
    Ok(ApiJson(state.store.get_sell_request(id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<SellRequestStatusUpdate>,
) -> ApiResult<ApiJson<SellRequest>> {
    Ok(ApiJson(
        state
            .store
            .update_sell_request_status(id, update.status)
            .await?,
    ))
}

/// Records the offer and moves the request to `valued`.
pub async fn set_valuation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(valuation): ApiJson<Valuation>,
) -> ApiResult<ApiJson<SellRequest>> {
    valuation.validate()?;
    Ok(ApiJson(
        state
            .store
            .set_valuation(id, valuation.valuation_amount)
            .await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<MessageResponse>> {
    require_admin(&user)?;
    let images = state.store.delete_sell_request(id).await?;
    for image in &images {
        state.images.discard(&image.image_url).await;
    }
    Ok(message("Sell request deleted successfully"))
}

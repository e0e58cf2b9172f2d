use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{message, read_upload, MessageResponse};
use crate::auth::{require_admin, CurrentUser};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::images::VEHICLES;
use crate::listing::{
    LimitParams, ListingParams, ListingQuery, Page, ADMIN_MAX_PAGE_SIZE, ADMIN_PAGE_SIZE,
    PUBLIC_MAX_PAGE_SIZE, PUBLIC_PAGE_SIZE,
};
use crate::models::{NewVehicle, VehicleImage, VehicleResponse, VehicleUpdate};
use crate::AppState;

async fn listing(
    state: &AppState,
    params: ListingParams,
    default_size: i64,
    max_size: i64,
) -> ApiResult<Page<VehicleResponse>> {
    let query = ListingQuery::from_params(params, default_size, max_size)?;
    let (vehicles, total) = state.store.list_vehicles(&query).await?;
    Ok(Page::new(vehicles, total, query.page).map(VehicleResponse::from))
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> ApiResult<ApiJson<Page<VehicleResponse>>> {
    let page = listing(&state, params, PUBLIC_PAGE_SIZE, PUBLIC_MAX_PAGE_SIZE).await?;
    Ok(ApiJson(page))
}

pub async fn featured(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> ApiResult<ApiJson<Vec<VehicleResponse>>> {
    let vehicles = state.store.featured_vehicles(params.resolve()?).await?;
    Ok(ApiJson(vehicles.into_iter().map(Into::into).collect()))
}

pub async fn recent(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> ApiResult<ApiJson<Vec<VehicleResponse>>> {
    let vehicles = state.store.recent_vehicles(params.resolve()?).await?;
    Ok(ApiJson(vehicles.into_iter().map(Into::into).collect()))
}

pub async fn makes(State(state): State<AppState>) -> ApiResult<ApiJson<Vec<String>>> {
    Ok(ApiJson(state.store.vehicle_makes().await?))
}

pub async fn models(
    State(state): State<AppState>,
    ApiPath(make): ApiPath<String>,
) -> ApiResult<ApiJson<Vec<String>>> {
    Ok(ApiJson(state.store.vehicle_models(&make).await?))
}

/// Public detail view. Every hit counts as a view.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<VehicleResponse>> {
    let vehicle = state.store.increment_views(id).await?;
    Ok(ApiJson(vehicle.into()))
}

pub async fn admin_list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListingParams>,
) -> ApiResult<ApiJson<Page<VehicleResponse>>> {
    let page = listing(&state, params, ADMIN_PAGE_SIZE, ADMIN_MAX_PAGE_SIZE).await?;
    Ok(ApiJson(page))
}

pub async fn admin_show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<VehicleResponse>> {
    let vehicle = state.store.get_vehicle(id).await?;
    Ok(ApiJson(vehicle.into()))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(new): ApiJson<NewVehicle>,
) -> ApiResult<(StatusCode, ApiJson<VehicleResponse>)> {
    new.validate()?;
    let vehicle = state.store.create_vehicle(new).await?;
    log::info!("{} created vehicle {} ({})", user.0.email, vehicle.id, vehicle.title());
    Ok((StatusCode::CREATED, ApiJson(vehicle.into())))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<VehicleUpdate>,
) -> ApiResult<ApiJson<VehicleResponse>> {
    update.validate()?;
    let vehicle = state.store.update_vehicle(id, update).await?;
    Ok(ApiJson(vehicle.into()))
}

/// Admin only. Stored photos go with the vehicle.
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<MessageResponse>> {
    require_admin(&user)?;
    let images = state.store.delete_vehicle(id).await?;
    for image in &images {
        state.images.discard(&image.image_url).await;
    }
    log::info!("{} deleted vehicle {id}", user.0.email);
    Ok(message("Vehicle deleted successfully"))
}

pub async fn toggle_featured(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<VehicleResponse>> {
    let vehicle = state.store.toggle_featured(id).await?;
    Ok(ApiJson(vehicle.into()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParams {
    #[serde(default, alias = "is_primary")]
    pub is_primary: bool,
}

pub async fn upload_image(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<ImageParams>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, ApiJson<VehicleImage>)> {
    let file = read_upload(multipart, &state.images).await?;
    // Fail before writing anything when the vehicle is unknown.
    state.store.get_vehicle(id).await?;
    let reference = state.images.upload(file, VEHICLES).await?;

    match state
        .store
        .add_vehicle_image(id, reference.clone(), params.is_primary)
        .await
    {
        Ok(image) => Ok((StatusCode::CREATED, ApiJson(image))),
        Err(err) => {
            state.images.discard(&reference).await;
            Err(err)
        }
    }
}

pub async fn delete_image(
    State(state): State<AppState>,
    ApiPath(image_id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<MessageResponse>> {
    let image = state.store.delete_vehicle_image(image_id).await?;
    state.images.discard(&image.image_url).await;
    Ok(message("Image deleted successfully"))
}

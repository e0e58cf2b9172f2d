use axum::extract::{Extension, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{admin_page, message, MessageResponse};
use crate::auth::{require_admin, CurrentUser};
use crate::error::{ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::listing::Page;
use crate::models::{
    Enquiry, EnquiryFilter, EnquiryStatus, EnquiryStatusUpdate, EnquiryType, NewEnquiry,
};
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewEnquiry>,
) -> ApiResult<(StatusCode, ApiJson<Enquiry>)> {
    new.validate()?;
    let enquiry = state.store.create_enquiry(new).await?;
    log::info!(
        "new {} enquiry {} from {}",
        enquiry.enquiry_type,
        enquiry.id,
        enquiry.customer_email
    );
    Ok((StatusCode::CREATED, ApiJson(enquiry)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryListParams {
    pub page: Option<i64>,
    #[serde(alias = "limit", alias = "page_size")]
    pub page_size: Option<i64>,
    pub status: Option<EnquiryStatus>,
    #[serde(alias = "enquiry_type")]
    pub enquiry_type: Option<EnquiryType>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<EnquiryListParams>,
) -> ApiResult<ApiJson<Page<Enquiry>>> {
    let page = admin_page(params.page, params.page_size)?;
    let filter = EnquiryFilter {
        status: params.status,
        enquiry_type: params.enquiry_type,
    };
    let (items, total) = state.store.list_enquiries(filter, page).await?;
    Ok(ApiJson(Page::new(items, total, page)))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<Enquiry>> {
    Ok(ApiJson(state.store.get_enquiry(id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<EnquiryStatusUpdate>,
) -> ApiResult<ApiJson<Enquiry>> {
    Ok(ApiJson(
        state.store.update_enquiry_status(id, update.status).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<ApiJson<MessageResponse>> {
    require_admin(&user)?;
    state.store.delete_enquiry(id).await?;
    Ok(message("Enquiry deleted successfully"))
}

use axum::extract::State;

use crate::error::{ApiJson, ApiResult};
use crate::models::DashboardStats;
use crate::store::now;
use crate::AppState;

pub async fn stats(State(state): State<AppState>) -> ApiResult<ApiJson<DashboardStats>> {
    let counts = state.store.dashboard_counts(now()).await?;
    Ok(ApiJson(DashboardStats::from_counts(counts)))
}

use axum::{Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::types::TierResponse;
use super::{ApiError, ApiResponse, AppState};
use crate::services::UsageSummary;
use crate::tiers::entitlements_for;

/// GET /account/tier
/// The caller's tier and the features it grants.
pub async fn get_tier(
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Json<ApiResponse<TierResponse>> {
    let tier = user.0.tier;
    let features = entitlements_for(tier)
        .features
        .iter()
        .map(|f| f.as_str())
        .collect();

    Json(ApiResponse::success(TierResponse { tier, features }))
}

/// GET /account/usage
/// Today's metered usage against the caller's tier quotas.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UsageSummary>>, ApiError> {
    let summary = state
        .access_service()
        .usage_summary(user.0.id)
        .await
        .map_err(|e| ApiError::from_access(e, &state.upgrade_url))?;

    Ok(Json(ApiResponse::success(summary)))
}

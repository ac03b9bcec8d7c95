//! Tier-gated Vestor endpoints.
//!
//! The handlers here are the feature surface behind the entitlement and
//! quota checks: every request passes `require_feature` and, for metered
//! actions, `check_and_record` before doing its work.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_non_empty;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{AccessError, UsageItem, UserInfo};
use crate::tiers::{Feature, UsageKind};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    /// Ticker symbols to include, e.g. `["VTI", "BND"]`.
    pub symbols: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub symbols: Vec<String>,
    pub submitted_at: String,
    pub usage: Option<UsageItem>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub title: String,
    pub generated_at: String,
    pub sections: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    pub symbol: String,
    pub threshold: f64,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub symbol: String,
    pub threshold: f64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub exported_at: String,
    pub user: UserInfo,
    pub usage: crate::services::UsageSummary,
}

// ============================================================================
// Handlers
// ============================================================================

fn access_err(state: &AppState, err: AccessError) -> ApiError {
    ApiError::from_access(err, &state.upgrade_url)
}

/// POST /insights/analyses
/// Run a portfolio analysis. Metered: counts against the daily analysis
/// quota of the caller's tier.
pub async fn create_analysis(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(payload): Json<AnalysisRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AnalysisResponse>>), ApiError> {
    if payload.symbols.is_empty() {
        return Err(ApiError::validation("At least one symbol is required"));
    }
    for symbol in &payload.symbols {
        validate_non_empty(symbol, "Symbol")?;
    }

    let access = state.access_service();
    access
        .require_feature(user.0.id, Feature::PortfolioAnalysis)
        .await
        .map_err(|e| access_err(&state, e))?;
    access
        .check_and_record(user.0.id, UsageKind::Analysis)
        .await
        .map_err(|e| access_err(&state, e))?;

    let usage = access
        .usage_summary(user.0.id)
        .await
        .map_err(|e| access_err(&state, e))?
        .items
        .into_iter()
        .find(|item| item.kind == UsageKind::Analysis);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AnalysisResponse {
            symbols: payload.symbols,
            submitted_at: chrono::Utc::now().to_rfc3339(),
            usage,
        })),
    ))
}

/// GET /insights/reports/advanced
/// Premium-tier reporting.
pub async fn advanced_report(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ReportResponse>>, ApiError> {
    state
        .access_service()
        .require_feature(user.0.id, Feature::AdvancedReports)
        .await
        .map_err(|e| access_err(&state, e))?;

    Ok(Json(ApiResponse::success(ReportResponse {
        title: "Advanced portfolio report".to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        sections: vec![
            "allocation",
            "risk_breakdown",
            "sector_exposure",
            "tax_efficiency",
        ],
    })))
}

/// POST /insights/alerts
/// Create a price alert. Feature-gated and metered.
pub async fn create_alert(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(payload): Json<AlertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AlertResponse>>), ApiError> {
    let symbol = validate_non_empty(&payload.symbol, "Symbol")?.to_uppercase();

    if !payload.threshold.is_finite() || payload.threshold <= 0.0 {
        return Err(ApiError::validation("Threshold must be a positive number"));
    }

    let access = state.access_service();
    access
        .require_feature(user.0.id, Feature::PriceAlerts)
        .await
        .map_err(|e| access_err(&state, e))?;
    access
        .check_and_record(user.0.id, UsageKind::Alert)
        .await
        .map_err(|e| access_err(&state, e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AlertResponse {
            symbol,
            threshold: payload.threshold,
            created_at: chrono::Utc::now().to_rfc3339(),
        })),
    ))
}

/// GET /insights/export
/// Export the caller's account data. Premium-tier feature.
pub async fn export_account_data(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ExportResponse>>, ApiError> {
    let access = state.access_service();
    access
        .require_feature(user.0.id, Feature::DataExport)
        .await
        .map_err(|e| access_err(&state, e))?;

    let usage = access
        .usage_summary(user.0.id)
        .await
        .map_err(|e| access_err(&state, e))?;

    Ok(Json(ApiResponse::success(ExportResponse {
        exported_at: chrono::Utc::now().to_rfc3339(),
        user: user.0,
        usage,
    })))
}

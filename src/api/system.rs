//! System API endpoints: status and audit log access.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::{LogDto, LogResponse, SystemStatus};
use super::validation::{validate_page, validate_page_size};
use super::{ApiError, ApiResponse, AppState};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let store = state.store();

    let users = store.user_count().await?;
    let active_sessions = store.active_session_count().await?;
    let usage_events_today = store.total_usage_today().await?;

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        users,
        active_sessions,
        usage_events_today,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub level: Option<String>,
    pub event_type: Option<String>,
    pub user_id: Option<i32>,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    50
}

/// GET /system/logs
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<LogResponse>>, ApiError> {
    let page = validate_page(query.page)?;
    let page_size = validate_page_size(query.page_size)?;

    let (logs, total_pages) = state
        .store()
        .get_logs(page, page_size, query.level, query.event_type, query.user_id)
        .await?;

    let logs = logs
        .into_iter()
        .map(|log| LogDto {
            id: log.id,
            event_type: log.event_type,
            level: log.level,
            message: log.message,
            user_id: log.user_id,
            details: log.details,
            created_at: log.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::success(LogResponse { logs, total_pages })))
}

/// DELETE /system/logs
pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<super::types::MessageResponse>>, ApiError> {
    state.store().clear_logs().await?;

    Ok(Json(ApiResponse::success(super::types::MessageResponse {
        message: "Logs cleared".to_string(),
    })))
}

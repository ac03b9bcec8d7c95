use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState,
    types::{
        ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
        ValidateResponse,
    },
    validation::{validate_display_name, validate_non_empty},
};
use crate::services::UserInfo;

/// Name of the session cookie set at login.
pub const SESSION_COOKIE: &str = "vestor_session";

/// Authenticated user, inserted into request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserInfo);

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that accepts the session token from:
/// 1. The `vestor_session` cookie (from login)
/// 2. `Authorization: Bearer <token>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(request.headers()) else {
        return Err(ApiError::Unauthorized("Missing session token".to_string()));
    };

    let user = state.auth_service().current_user(&token).await?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized(
            "Invalid or expired session".to_string(),
        ));
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extract the session token from cookie or Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, SESSION_COOKIE) {
        return Some(token);
    }

    if let Some(auth_header) = headers.get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn session_cookie(state: &AppState, token: &str) -> String {
    let max_age = state.session_ttl_minutes * 60;
    let secure = if state.secure_cookies { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
}

fn clear_session_cookie(state: &AppState) -> String {
    let secure = if state.secure_cookies { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}")
}

fn with_cookie(mut response: Response, cookie: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| ApiError::internal(format!("Invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account on the free tier.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let email = validate_non_empty(&payload.email, "Email")?;
    validate_non_empty(&payload.password, "Password")?;
    let display_name = validate_display_name(payload.display_name.trim())?;

    let user = state
        .auth_service()
        .register(email, &payload.password, display_name)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// POST /auth/login
/// Authenticate with email and password; sets the session cookie and also
/// returns the token for header-based clients.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = validate_non_empty(&payload.email, "Email")?;
    validate_non_empty(&payload.password, "Password")?;

    let result = state.auth_service().login(email, &payload.password).await?;

    let cookie = session_cookie(&state, &result.token);

    let response = Json(ApiResponse::success(LoginResponse {
        user: result.user,
        token: result.token,
        expires_at: result.expires_at,
    }))
    .into_response();

    with_cookie(response, &cookie)
}

/// POST /auth/logout
/// Invalidate the presented session. Idempotent: succeeds even when the
/// token is already gone.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(&headers) {
        state.auth_service().logout(&token).await?;
    }

    let response = Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    }))
    .into_response();

    with_cookie(response, &clear_session_cookie(&state))
}

/// GET /auth/validate
/// Resolve the presented token. Expired sessions are purged as a side
/// effect and reported invalid.
pub async fn validate_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ValidateResponse>>, ApiError> {
    let Some(token) = extract_token(&headers) else {
        return Ok(Json(ApiResponse::success(ValidateResponse {
            valid: false,
            user_id: None,
        })));
    };

    let user_id = state.auth_service().validate_session(&token).await?;

    Ok(Json(ApiResponse::success(ValidateResponse {
        valid: user_id.is_some(),
        user_id,
    })))
}

/// GET /auth/me
/// Current user information (requires authentication).
pub async fn get_current_user(
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Json<ApiResponse<UserInfo>> {
    Json(ApiResponse::success(user.0))
}

/// PUT /auth/password
/// Change password (requires current password verification). All sessions
/// are revoked, including the one making this request.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    validate_non_empty(&payload.current_password, "Current password")?;
    validate_non_empty(&payload.new_password, "New password")?;

    state
        .auth_service()
        .change_password(user.0.id, &payload.current_password, &payload.new_password)
        .await?;

    tracing::info!(user_id = user.0.id, "Password changed");

    let response = Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
    .into_response();

    with_cookie(response, &clear_session_cookie(&state))
}

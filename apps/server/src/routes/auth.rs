//! Authentication routes: login, registration, logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use reparto_core::{validation, Role, User};

use super::ApiJson;
use crate::auth::{hash_password, verify_password, AdminUser, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Defaults to the plain `user` role when omitted.
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /api/login`
///
/// Unknown usernames and wrong passwords get the same answer; the reply
/// never confirms which half was wrong.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .db
        .users()
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if !verify_password(&req.password, &user.password_hash) {
        warn!(username = %req.username, "Failed login attempt");
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    let token = state.jwt.issue_token(&user)?;
    info!(username = %user.username, "Principal logged in");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}

/// `POST /api/register` (admin only)
pub async fn register(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    validation::validate_username(&req.username)?;
    validation::validate_password(&req.password)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: req.username,
        password_hash: hash_password(&req.password)?,
        role: req.role,
        created_at: Utc::now(),
    };

    state.db.users().insert(&user).await?;
    info!(username = %user.username, role = %user.role, "Principal registered");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// `POST /api/logout`
///
/// Revokes the presented token's `jti` and opportunistically drops
/// revocations that have already expired on their own.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<LogoutResponse>> {
    let expires_at = DateTime::from_timestamp(user.expires_at, 0).unwrap_or_else(Utc::now);
    state.db.users().revoke_token(&user.jti, expires_at).await?;

    let purged = state.db.users().purge_expired_tokens().await?;
    if purged > 0 {
        debug!(purged, "Dropped expired token revocations");
    }

    info!(username = %user.username, "Principal logged out");
    Ok(Json(LogoutResponse { success: true }))
}

//! JWT authentication and principal extraction.
//!
//! ## Credential Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Credential Flow                                   │
//! │                                                                         │
//! │  POST /api/login ──► verify_password ──► JwtManager::issue_token        │
//! │                                               │                         │
//! │  Authorization: Bearer <token>                ▼                         │
//! │       │                              Claims { sub, role, jti, exp }     │
//! │       ▼                                                                 │
//! │  AuthUser extractor ──► validate_token ──► revocation check (jti)      │
//! │       │                                                                 │
//! │       └── AdminUser = AuthUser + role gate (403 on plain users)        │
//! │                                                                         │
//! │  POST /api/logout ──► revoked_tokens(jti) until the token expires      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Role requirements are declared where they are enforced: a handler that
//! takes [`AdminUser`] is admin-only, everything else takes [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use reparto_core::{Role, User};

use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Claims & Token Manager
// =============================================================================

/// Payload carried inside every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Username, carried so handlers can log without a lookup
    pub username: String,

    /// Principal role
    pub role: Role,

    /// Issued-at, seconds since epoch
    pub iat: i64,

    /// Expiry, seconds since epoch
    pub exp: i64,

    /// Per-token id, the revocation key for logout
    pub jti: String,
}

/// Signs and verifies session tokens with the configured secret.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Generate a token for an authenticated principal.
    pub fn issue_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            error!(error = %e, "Failed to sign token");
            ApiError::internal()
        })
    }

    /// Checks signature and expiry, returning the claims on success.
    /// Expiry uses the library's default 60 second leeway.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    if auth_header.starts_with("Bearer ") {
        Some(&auth_header[7..])
    } else {
        None
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::internal()
    })?;

    Ok(hash.to_string())
}

/// Verify a password against its hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Principal Extractors
// =============================================================================

/// Authenticated principal, resolved from the `Authorization` header.
///
/// Resolution order: header present, `Bearer` scheme, signature and
/// expiry valid, `jti` not revoked. Any miss is a 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub jti: String,
    pub expires_at: i64,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Expected a bearer token"))?;

        let claims = state.jwt.validate_token(token)?;

        if state.db.users().is_token_revoked(&claims.jti).await? {
            return Err(ApiError::unauthorized("Token has been revoked"));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            jti: claims.jti,
            expires_at: claims.exp,
        })
    }
}

/// Admin-only principal; resolves like [`AuthUser`], then gates on role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(ApiError::forbidden("Administrator role required"));
        }

        Ok(AdminUser(user))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

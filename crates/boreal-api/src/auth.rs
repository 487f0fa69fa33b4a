//! User authentication: argon2 password hashing, JWT issuance, and the
//! request extractors for user and device credentials.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use boreal_core::{Device, Settings};

use crate::error::ApiError;
use crate::state::AppState;

pub const ACCESS_TOKEN_TYPE: &str = "access";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT claims for user tokens. The `type` claim distinguishes access from
/// refresh tokens so neither can stand in for the other.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Access + refresh token pair returned by the auth endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Hash a password with argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Database(boreal_core::Error::Internal(e.to_string())))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash. A malformed stored hash
/// verifies false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn issue_token(
    settings: &Settings,
    user_id: Uuid,
    token_type: &str,
    lifetime: Duration,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        exp: (now + lifetime).timestamp(),
        iat: now.timestamp(),
        token_type: token_type.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Database(boreal_core::Error::Internal(e.to_string())))
}

/// Issue a fresh access + refresh pair for a user.
pub fn issue_token_pair(settings: &Settings, user_id: Uuid) -> Result<TokenPair, ApiError> {
    let access_lifetime = Duration::minutes(settings.jwt_access_minutes);
    let access_token = issue_token(settings, user_id, ACCESS_TOKEN_TYPE, access_lifetime)?;
    let refresh_token = issue_token(
        settings,
        user_id,
        REFRESH_TOKEN_TYPE,
        Duration::days(settings.jwt_refresh_days),
    )?;
    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
        expires_in: access_lifetime.num_seconds(),
    })
}

/// Decode and validate a JWT, requiring the expected `type` claim.
pub fn decode_token(
    settings: &Settings,
    token: &str,
    expected_type: &str,
) -> Result<Claims, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    if data.claims.token_type != expected_type {
        return Err(ApiError::Unauthorized(format!(
            "Expected a {} token",
            expected_type
        )));
    }
    Ok(data.claims)
}

/// The authenticated user, extracted from a `Authorization: Bearer` header
/// carrying a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))?;

        let claims = decode_token(&state.settings, token, ACCESS_TOKEN_TYPE)?;
        Ok(CurrentUser {
            user_id: claims.sub,
        })
    }
}

/// The authenticated device, extracted from the `X-Api-Token` header.
///
/// Authentication only: the path-id match and the suspended gate happen in
/// the handler, in pipeline order.
#[derive(Debug, Clone)]
pub struct DeviceAuth(pub Device);

#[async_trait]
impl FromRequestParts<AppState> for DeviceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("x-api-token")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Api-Token header".to_string()))?;

        let device = state
            .db
            .devices
            .find_by_api_token(token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid device credential".to_string()))?;

        Ok(DeviceAuth(device))
    }
}

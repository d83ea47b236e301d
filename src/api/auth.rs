//! Admin authentication: Argon2id password hashes and HS256 JWTs.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::admins::AdminRow;

const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Claims carried by every admin access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin id (UUID string).
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(admin: &AdminRow, secret: &str) -> ApiResult<String> {
    let now = Utc::now().timestamp();
    let claims = AdminClaims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        role: admin.role.clone(),
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("JWT encode: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> ApiResult<AdminClaims> {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ApiError::Unauthorized("token expired".to_string())
        }
        _ => ApiError::Unauthorized("invalid token".to_string()),
    })
}

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(format!("password hash: {e}")))
}

/// `Ok(true)` on match, `Ok(false)` on mismatch, `Err` only for a
/// malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("invalid password hash: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("password verify: {e}"))),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("expected bearer token".to_string()))?;
        verify_token(token, &state.config.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn admin() -> AdminRow {
        AdminRow {
            id: Uuid::new_v4(),
            email: "ops@seekon.example".into(),
            password_hash: String::new(),
            name: "Ops".into(),
            role: "admin".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trips() {
        let admin = admin();
        let token = issue_token(&admin, "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, admin.id.to_string());
        assert_eq!(claims.email, admin.email);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&admin(), "secret").unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt", "secret").is_err());
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("hunter2", "not-a-phc-string").is_err());
    }
}

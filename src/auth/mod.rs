use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::database::models::group::Role;

pub mod cookie;
pub mod password;

/// Distinguishes short-lived access tokens from cookie-borne refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i32,
    pub email: String,
    pub group_id: Option<i32>,
    pub role: Option<Role>,
    pub auth_provider: String,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(
        kind: TokenKind,
        user_id: i32,
        email: String,
        auth_provider: String,
        membership: Option<(i32, Role)>,
        security: &SecurityConfig,
    ) -> Self {
        let now = Utc::now();
        let lifetime = match kind {
            TokenKind::Access => Duration::minutes(security.access_token_minutes),
            TokenKind::Refresh => Duration::days(security.refresh_token_days),
        };

        Self {
            user_id,
            email,
            group_id: membership.map(|(id, _)| id),
            role: membership.map(|(_, role)| role),
            auth_provider,
            kind,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Invalid JWT token: {0}")]
    Invalid(String),

    #[error("Expected {expected:?} token, got {actual:?}")]
    WrongTokenType { expected: TokenKind, actual: TokenKind },
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Decodes a token and checks signature, expiry and that it is of the expected kind.
pub fn validate_jwt(token: &str, expected: TokenKind, security: &SecurityConfig) -> Result<Claims, JwtError> {
    let secret = &security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::Invalid(e.to_string()))?
        .claims;

    if claims.kind != expected {
        return Err(JwtError::WrongTokenType {
            expected,
            actual: claims.kind,
        });
    }

    Ok(claims)
}

/// Issues an access/refresh pair for the same identity and membership.
pub fn issue_token_pair(
    user_id: i32,
    email: &str,
    auth_provider: &str,
    membership: Option<(i32, Role)>,
    security: &SecurityConfig,
) -> Result<(String, String), JwtError> {
    let claims = |kind| {
        Claims::new(
            kind,
            user_id,
            email.to_string(),
            auth_provider.to_string(),
            membership,
            security,
        )
    };

    Ok((
        generate_jwt(&claims(TokenKind::Access), security)?,
        generate_jwt(&claims(TokenKind::Refresh), security)?,
    ))
}

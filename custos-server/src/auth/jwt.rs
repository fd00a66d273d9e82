use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::infra::config::Config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Any parse, signature, algorithm, or expiry failure. Callers are not
    /// told which check failed.
    #[error("invalid token")]
    Invalid,

    #[error("token signing failed")]
    Signing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct TokenKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKey {
    fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }
}

/// Issues and validates the two signed session artifacts. Access and refresh
/// tokens use distinct symmetric secrets, so neither kind can ever validate
/// as the other. Secrets and TTLs are fixed at startup.
pub struct TokenService {
    access: TokenKey,
    refresh: TokenKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            access: TokenKey::new(&config.access_token_key, config.access_token_ttl_secs),
            refresh: TokenKey::new(&config.refresh_token_key, config.refresh_token_ttl_secs),
        }
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        issue(&self.access, user_id)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        issue(&self.refresh, user_id)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, TokenError> {
        validate(&self.access, token)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Uuid, TokenError> {
        validate(&self.refresh, token)
    }

    /// Token rotation: a valid refresh token yields a brand-new pair. A
    /// signing failure for either artifact fails the whole operation.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let user_id = self.validate_refresh_token(refresh_token)?;

        let access_token = self.issue_access_token(user_id)?;
        let refresh_token = self.issue_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn issue(key: &TokenKey, user_id: Uuid) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + key.ttl).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &key.encoding).map_err(|_| TokenError::Signing)
}

fn validate(key: &TokenKey, token: &str) -> Result<Uuid, TokenError> {
    // Validation::new pins the algorithm set to HS256, so a token signed with
    // any other algorithm is rejected before its signature is considered.
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key.decoding, &validation)
        .map(|data| data.claims.sub)
        .map_err(|_| TokenError::Invalid)
}

//! Signed access and refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;

/// Lifetime of an access token in seconds: 15 minutes.
pub const ACCESS_TOKEN_TTL: i64 = 900;

/// Lifetime of a refresh token in seconds: 7 days.
pub const REFRESH_TOKEN_TTL: i64 = 604_800;

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the user the token was issued to.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Email of that user at issue time.
    pub email: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Returns the claims as a JSON object keyed like the wire format.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("userId".to_string(), Value::from(self.user_id));
        map.insert("email".to_string(), Value::from(self.email.clone()));
        map.insert("exp".to_string(), Value::from(self.exp));
        map
    }
}

/// Issues and verifies HS256 tokens.
///
/// Access and refresh tokens are signed with different secrets, so one kind
/// never verifies as the other.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Creates a service with the default lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_TTL),
        }
    }

    /// Overrides the token lifetimes.
    #[must_use]
    pub fn with_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_ttl = access;
        self.refresh_ttl = refresh;
        self
    }

    pub fn issue_access(&self, user_id: i64, email: &str) -> Result<String> {
        issue(&self.access_secret, self.access_ttl, user_id, email)
    }

    pub fn issue_refresh(&self, user_id: i64, email: &str) -> Result<String> {
        issue(&self.refresh_secret, self.refresh_ttl, user_id, email)
    }

    /// Verifies signature and expiry of an access token.
    pub fn verify_access(&self, token: &str) -> Result<Claims> {
        verify(&self.access_secret, token)
    }

    /// Verifies signature and expiry of a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims> {
        verify(&self.refresh_secret, token)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn issue(secret: &str, ttl: Duration, user_id: i64, email: &str) -> Result<String> {
    let claims = Claims {
        user_id,
        email: email.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

fn verify(secret: &str, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .inspect_err(|e| debug!(error = %e, "token rejected"))?;

    Ok(data.claims)
}

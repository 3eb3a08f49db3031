//! Access token claims issued to users.

use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use super::ISS;
use super::auth_body::AuthBody;
use super::jwt::JwtKeys;
use crate::prelude::*;

/// JWT claims identifying a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Subject (user email).
    pub sub: String,
    /// User ID.
    pub uid: i32,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at time.
    pub iat: i64,
    /// Not before time.
    pub nbf: i64,
    /// JWT ID.
    pub jti: Uuid,
}

impl AuthToken {
    /// Creates claims for `user_id` valid for `token_duration`.
    ///
    /// ```rust
    /// use chrono::TimeDelta;
    /// use imged::auth::auth_token::AuthToken;
    ///
    /// let token = AuthToken::new(7, "user@example.com", TimeDelta::minutes(30)).unwrap();
    /// assert_eq!(token.uid, 7);
    /// assert!(token.exp > token.iat);
    /// ```
    pub fn new(user_id: i32, email: &str, token_duration: TimeDelta) -> Result<Self> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(token_duration)
            .ok_or(Error::AuthTokenCreation)?;

        Ok(Self {
            sub: String::from(email),
            uid: user_id,
            iss: String::from(ISS),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4(),
        })
    }
}

/// Signs `token` into a bearer body.
pub fn encode_token(token: &AuthToken, keys: &JwtKeys) -> Result<AuthBody> {
    let token = keys.encode(token).map_err(|err| {
        error!("Failed to encode JWT {err}");
        err
    })?;

    Ok(AuthBody::new(token))
}

/// Verifies a presented bearer token.
pub fn decode_token(
    token: &str,
    keys: &JwtKeys,
) -> std::result::Result<AuthToken, super::error::Error> {
    Ok(keys.decode::<AuthToken>(token)?.claims)
}

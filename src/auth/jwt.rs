//! JWT signing and verification.
//!
//! The signing secret and algorithm come from `JWT_SECRET` and
//! `JWT_ALGORITHM`; [`JwtKeys`] holds the derived keys for the lifetime of the
//! server and is shared through the application state.
//!
//! ```rust
//! use imged::auth::jwt::JwtKeys;
//! use jsonwebtoken::Algorithm;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
//! struct Claims {
//!     sub: String,
//!     exp: usize,
//! }
//!
//! let keys = JwtKeys::new(b"MySuperSecret", Algorithm::HS256);
//! let claims = Claims { sub: "user@example.com".to_string(), exp: 4118335200 };
//!
//! let token = keys.encode(&claims).unwrap();
//! assert_eq!(keys.decode::<Claims>(&token).unwrap().claims, claims);
//! ```

use std::fmt::Debug;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::{Serialize, de::DeserializeOwned};

use super::error::Error;

/// Key pair and algorithm used for every token the service issues.
#[derive(Clone)]
pub struct JwtKeys {
    /// Key used for signing new tokens.
    encoding: EncodingKey,
    /// Key used for verifying presented tokens.
    decoding: DecodingKey,
    algorithm: Algorithm,
}

impl JwtKeys {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
        }
    }

    /// Creates a signed token from `body`.
    pub fn encode<T>(&self, body: &T) -> Result<String, Error>
    where
        T: Serialize,
    {
        let header = Header::new(self.algorithm);
        Ok(encode(&header, body, &self.encoding)?)
    }

    /// Verifies the signature and expiry of `token` and extracts its claims.
    pub fn decode<T>(&self, token: &str) -> Result<TokenData<T>, Error>
    where
        T: DeserializeOwned,
    {
        decode(token, &self.decoding, &Validation::new(self.algorithm)).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::InvalidToken,
            }
        })
    }
}

impl Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

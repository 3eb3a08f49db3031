//! Request context for authenticated users.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};

use crate::auth::auth_token::{AuthToken, decode_token};
use crate::auth::error::Error as AuthError;
use crate::auth::jwt::JwtKeys;
use crate::auth::{AUTH_HEADER, AUTH_HEADER_PREFIX};
use crate::prelude::*;

/// The name of the cookie used to store authentication tokens.
pub const AUTH_TOKEN_COOKIE: &str = "auth-token";

/// The user a request is made on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtxUser {
    pub id: i32,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Ctx {
    pub user: CtxUser,
}

impl From<AuthToken> for Ctx {
    fn from(token: AuthToken) -> Self {
        Self {
            user: CtxUser {
                id: token.uid,
                email: token.sub,
            },
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(AUTH_HEADER_PREFIX))
}

/// Resolves the request context from the `auth-token` cookie or the
/// `Authorization: Bearer` header.
///
/// A cookie that fails to decode is removed and the header is tried instead.
/// The outcome, successful or not, is stored in the request extensions;
/// rejecting unauthenticated requests is left to [`mw_require_auth`].
///
/// [`mw_require_auth`]: super::mw_auth::mw_require_auth
pub async fn mw_ctx_resolver(
    State(keys): State<JwtKeys>,
    cookies: Cookies,
    headers: HeaderMap,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let from_cookie = cookies
        .get(AUTH_TOKEN_COOKIE)
        .map(|c| decode_token(c.value(), &keys).map(Ctx::from));
    if let Some(Err(_)) = &from_cookie {
        cookies.remove(Cookie::from(AUTH_TOKEN_COOKIE));
    }

    let ctx = match from_cookie {
        Some(Ok(ctx)) => Ok(ctx),
        from_cookie => match bearer_token(&headers) {
            Some(token) => decode_token(token, &keys).map(Ctx::from),
            None => from_cookie.unwrap_or(Err(AuthError::TokenMissing)),
        },
    };
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

/// Stores `token` in the auth cookie for subsequent requests.
pub fn set_auth_cookie(cookies: &Cookies, token: &str) {
    let mut cookie = Cookie::new(AUTH_TOKEN_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Ok(parts
            .extensions
            .get::<std::result::Result<Ctx, AuthError>>()
            .ok_or(Error::CtxMissing)?
            .clone()?)
    }
}

//! Account registration and login.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::auth_token::{AuthToken, encode_token};
use super::jwt::JwtKeys;
use super::secret_hash::{generate_secret_hash, is_secret_valid};
use crate::models::user::UserDb;
use crate::prelude::*;
use crate::store::Store;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Credentials returned after a successful registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i32,
    pub email: String,
}

/// Accepts `local@domain.tld` shaped addresses.
///
/// ```rust
/// use imged::auth::account::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(!is_valid_email("user@example"));
/// assert!(!is_valid_email("not an email"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && tld.len() >= 2 && !name.ends_with('.'),
        None => false,
    }
}

/// Creates an account and logs it in straight away.
pub fn register(
    store: &dyn Store,
    keys: &JwtKeys,
    token_duration: TimeDelta,
    email: &str,
    password: &str,
) -> Result<LoginData> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(Error::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    if store.fetch_user_by_email(email)?.is_some() {
        return Err(Error::EmailTaken);
    }

    let hash = generate_secret_hash(password)?;
    let user = store.create_user(email, &hash)?;
    info!("Registered user {} ({})", user.id, user.email);
    issue(&user, keys, token_duration)
}

/// Checks `username` (the account email) and `password`.
///
/// Unknown users and wrong passwords fail the same way.
pub fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    token_duration: TimeDelta,
    username: &str,
    password: &str,
) -> Result<LoginData> {
    let user = store
        .fetch_user_by_email(username.trim())?
        .ok_or(Error::WrongCredentials)?;

    if !is_secret_valid(password, &user.hashed_password)? {
        debug!("Wrong password for user {}", user.id);
        return Err(Error::WrongCredentials);
    }
    issue(&user, keys, token_duration)
}

fn issue(user: &UserDb, keys: &JwtKeys, token_duration: TimeDelta) -> Result<LoginData> {
    let claims = AuthToken::new(user.id, &user.email, token_duration)?;
    let body = encode_token(&claims, keys)?;
    Ok(LoginData {
        access_token: body.access_token,
        token_type: body.token_type,
        user_id: user.id,
        email: user.email.clone(),
    })
}

//! Authentication: password hashing, JWT handling and account operations.

pub mod account;
pub mod auth_body;
pub mod auth_token;
pub mod error;
pub mod jwt;
pub mod secret_hash;

pub const CONNECTION_TOKEN_TYPE: &str = "Bearer";
pub const AUTH_HEADER: &str = "Authorization";
pub const AUTH_HEADER_PREFIX: &str = "Bearer ";
pub const ISS: &str = "IMGED";

//! Common types and utilities.

/// Crate error type.
pub use crate::error::Error;

/// Crate result type.
pub type Result<T> = core::result::Result<T, Error>;


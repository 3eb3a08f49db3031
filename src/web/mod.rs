//! HTTP plumbing shared by every route: request context, authentication
//! middleware, and the response envelope errors are rendered into.

pub mod ctx;
pub mod error;
pub mod mw_auth;
pub mod response;

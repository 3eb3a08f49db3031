//! Authentication middleware for protecting routes.

use axum::{extract::Request, middleware::Next, response::Response};

use super::ctx::Ctx;
use crate::prelude::*;

/// Rejects requests without a valid [`Ctx`].
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use imged::web::mw_auth::mw_require_auth;
///
/// let app: Router<()> = Router::new()
///     .route("/protected", get(protected_handler))
///     .layer(axum::middleware::from_fn(mw_require_auth));
///
/// async fn protected_handler() -> &'static str {
///     "This requires authentication"
/// }
/// ```
pub async fn mw_require_auth(ctx: Result<Ctx>, req: Request, next: Next) -> Result<Response> {
    ctx?;
    Ok(next.run(req).await)
}

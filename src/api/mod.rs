//! HTTP API.
//!
//! | Route                       | Auth | Purpose                          |
//! |-----------------------------|------|----------------------------------|
//! | `GET /`                     | no   | liveness message                 |
//! | `GET /health`               | no   | health check                     |
//! | `POST /auth/register`       | no   | create an account                |
//! | `POST /auth/login`          | no   | obtain a token (and cookie)      |
//! | `POST /api/jobs`            | yes  | submit a generation or edit job  |
//! | `GET /api/jobs`             | yes  | list own jobs, newest first      |
//! | `GET /api/jobs/{id}`        | yes  | fetch one job                    |
//! | `GET /api/jobs/{id}/status` | yes  | re-check a job with the provider |

mod auth;
mod jobs;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use chrono::TimeDelta;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use crate::auth::jwt::JwtKeys;
use crate::prelude::*;
use crate::provider::ImageProvider;
use crate::store::Store;
use crate::tracker::JobTracker;
use crate::upload::MAX_IMAGE_BYTES;
use crate::web::ctx::mw_ctx_resolver;
use crate::web::mw_auth::mw_require_auth;
use crate::web::response::ApiResponse;

/// Room for the image plus the other multipart fields.
const MAX_UPLOAD_BODY: usize = MAX_IMAGE_BYTES + 2 * 1024 * 1024;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn ImageProvider>,
    pub tracker: JobTracker,
    pub keys: JwtKeys,
    pub token_duration: TimeDelta,
}

pub fn router(state: AppState) -> Router {
    let job_routes = Router::new()
        .route("/api/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/api/jobs/{id}", get(jobs::get_job))
        .route("/api/jobs/{id}/status", get(jobs::job_status))
        .route_layer(middleware::from_fn(mw_require_auth))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(job_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(
            state.keys.clone(),
            mw_ctx_resolver,
        ))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Binds `address` and serves the API in a background task.
pub async fn setup_api(
    address: SocketAddr,
    state: AppState,
) -> Result<JoinHandle<Result<()>>> {
    let listener = TcpListener::bind(address).await?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(serve(listener, state))
}

/// Serves the API on an already bound listener.
pub fn serve(listener: TcpListener, state: AppState) -> JoinHandle<Result<()>> {
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    })
}

async fn root() -> ApiResponse<Value> {
    ApiResponse::ok(
        "AI Image Editor API is running",
        json!({"message": "AI Image Editor API is running"}),
    )
}

async fn health() -> ApiResponse<Value> {
    ApiResponse::ok(
        "Service is healthy",
        json!({"status": "healthy", "service": "AI Image Editor API"}),
    )
}

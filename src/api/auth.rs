use axum::extract::{Form, State, rejection::FormRejection};
use serde::Deserialize;
use tower_cookies::Cookies;

use super::AppState;
use crate::auth::account::{self, LoginData};
use crate::prelude::*;
use crate::web::ctx::set_auth_cookie;
use crate::web::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn form<T>(form: std::result::Result<Form<T>, FormRejection>) -> Result<T> {
    form.map(|Form(value)| value)
        .map_err(|rejection| Error::InvalidRequest(rejection.body_text()))
}

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Form<RegisterForm>, FormRejection>,
) -> Result<ApiResponse<LoginData>> {
    let payload = form(payload)?;
    let data = account::register(
        state.store.as_ref(),
        &state.keys,
        state.token_duration,
        &payload.email,
        &payload.password,
    )?;
    Ok(ApiResponse::ok("User registered successfully", data))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: std::result::Result<Form<LoginForm>, FormRejection>,
) -> Result<ApiResponse<LoginData>> {
    let payload = form(payload)?;
    let data = account::login(
        state.store.as_ref(),
        &state.keys,
        state.token_duration,
        &payload.username,
        &payload.password,
    )?;
    set_auth_cookie(&cookies, &data.access_token);
    Ok(ApiResponse::ok("Login successful", data))
}

use std::error::Error;

use common::{PASSWORD, register_and_login, test_context::TestContext};
use imged::auth::account::LoginData;
use imged::auth::auth_token::decode_token;
use imged::models::job::JobDb;
use reqwest::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_root_and_health() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;

    let (status, root) = ctx.api.get::<Value>(&ctx.client, "").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(root.success);
    assert_eq!(root.message, "AI Image Editor API is running");

    let (status, health) = ctx.api.get::<Value>(&ctx.client, "health").await?;
    assert_eq!(status, StatusCode::OK);
    let data = health.data.ok_or("health returned no data")?;
    assert_eq!(data["status"], "healthy");
    assert_eq!(data["service"], "AI Image Editor API");
    Ok(())
}

#[tokio::test]
async fn test_register_returns_token() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;

    let (status, response) = ctx
        .api
        .post_form::<LoginData>(
            &ctx.client,
            "auth/register",
            &[("email", "fox@example.com"), ("password", PASSWORD)],
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(response.success);
    assert_eq!(response.message, "User registered successfully");

    let data = response.data.ok_or("register returned no data")?;
    assert_eq!(data.email, "fox@example.com");
    assert_eq!(data.token_type, "Bearer");
    let claims = decode_token(&data.access_token, &ctx.keys)?;
    assert_eq!(claims.uid, data.user_id);
    Ok(())
}

#[tokio::test]
async fn test_register_validation() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;

    let cases = [
        ("not-an-email", PASSWORD, StatusCode::BAD_REQUEST, "Invalid email format"),
        (
            "fox@example.com",
            "12345",
            StatusCode::BAD_REQUEST,
            "Password must be at least 6 characters long",
        ),
    ];
    for (email, password, expected_status, expected_message) in cases {
        let (status, response) = ctx
            .api
            .post_form::<Value>(
                &ctx.client,
                "auth/register",
                &[("email", email), ("password", password)],
            )
            .await?;
        assert_eq!(status, expected_status);
        assert!(!response.success);
        assert_eq!(response.message, expected_message);
        assert!(response.data.is_none());
    }

    let (status, response) = ctx
        .api
        .post_form::<Value>(&ctx.client, "auth/register", &[("email", "fox@example.com")])
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!response.success);
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_email() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;
    register_and_login(&ctx, "fox@example.com").await?;

    let (status, response) = ctx
        .api
        .post_form::<Value>(
            &ctx.client,
            "auth/register",
            &[("email", "fox@example.com"), ("password", "another-pass")],
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response.message, "Email already registered");
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_wrong_credentials() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;
    register_and_login(&ctx, "fox@example.com").await?;

    for (username, password) in [
        ("fox@example.com", "wrong-password"),
        ("wolf@example.com", PASSWORD),
    ] {
        let client = TestContext::new_client();
        let (status, response) = ctx
            .api
            .post_form::<Value>(
                &client,
                "auth/login",
                &[("username", username), ("password", password)],
            )
            .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.message, "Invalid credentials");

        let (status, _) = ctx.api.get::<Value>(&client, "api/jobs").await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn test_jobs_require_authentication() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;

    let (status, response) = ctx.api.get::<Value>(&ctx.client, "api/jobs").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!response.success);
    assert_eq!(response.message, "Authentication required");

    let (status, response) = ctx
        .api
        .get_with_token::<Value>(&ctx.client, "api/jobs", "garbage")
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message, "Invalid authentication token");
    Ok(())
}

#[tokio::test]
async fn test_cookie_and_bearer_authentication() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;
    let login = register_and_login(&ctx, "fox@example.com").await?;

    let (status, response) = ctx.api.get::<Vec<JobDb>>(&ctx.client, "api/jobs").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.data, Some(Vec::new()));

    let fresh = TestContext::new_client();
    let (status, _) = ctx
        .api
        .get_with_token::<Vec<JobDb>>(&fresh, "api/jobs", &login.access_token)
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_bearer_token_wins_over_stale_cookie() -> Result<(), Box<dyn Error>> {
    let ctx = TestContext::start().await;
    let login = register_and_login(&ctx, "fox@example.com").await?;

    let response = TestContext::new_client()
        .get(format!("{}/api/jobs", ctx.api.url))
        .header(reqwest::header::COOKIE, "auth-token=expired-or-garbage")
        .bearer_auth(&login.access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = TestContext::new_client()
        .get(format!("{}/api/jobs", ctx.api.url))
        .header(reqwest::header::COOKIE, "auth-token=expired-or-garbage")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

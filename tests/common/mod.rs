#![allow(dead_code)]

use std::error::Error;
use std::time::Duration;

use imged::auth::account::LoginData;
use imged::models::job::JobDb;
use reqwest::StatusCode;
use test_context::TestContext;

pub mod api_client;
pub mod mock_provider;
pub mod test_context;

pub const PASSWORD: &str = "hunter22";

pub async fn register_and_login(
    ctx: &TestContext,
    email: &str,
) -> Result<LoginData, Box<dyn Error>> {
    let (status, _) = ctx
        .api
        .post_form::<LoginData>(
            &ctx.client,
            "auth/register",
            &[("email", email), ("password", PASSWORD)],
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, login) = ctx
        .api
        .post_form::<LoginData>(
            &ctx.client,
            "auth/login",
            &[("username", email), ("password", PASSWORD)],
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(login.data.ok_or("login returned no data")?)
}

/// Polls the job through the API until `done` holds.
pub async fn wait_for_job(
    ctx: &TestContext,
    job_id: i32,
    done: impl Fn(&JobDb) -> bool,
) -> Result<JobDb, Box<dyn Error>> {
    for _ in 0..200 {
        let (_, response) = ctx
            .api
            .get::<JobDb>(&ctx.client, &format!("api/jobs/{job_id}"))
            .await?;
        if let Some(job) = response.data {
            if done(&job) {
                return Ok(job);
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Err(format!("job {job_id} never reached the expected state").into())
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("Failed to encode test image");
    bytes.into_inner()
}

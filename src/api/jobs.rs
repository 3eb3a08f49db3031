use axum::extract::{
    Multipart, Path, Query, State,
    multipart::MultipartRejection,
    rejection::{PathRejection, QueryRejection},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::AppState;
use crate::models::job::JobDb;
use crate::models::job_status::JobStatus;
use crate::prelude::*;
use crate::provider::GenerationRequest;
use crate::store::NewJob;
use crate::upload::{ValidatedImage, validate_image};
use crate::web::ctx::Ctx;
use crate::web::response::ApiResponse;

const DEFAULT_STRENGTH: f64 = 0.7;
const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Payload of the status endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusData {
    pub job_id: i32,
    pub status: JobStatus,
    pub provider_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
}

/// Fields of the job submission form.
#[derive(Debug, Default)]
struct JobForm {
    prompt: Option<String>,
    strength: Option<String>,
    image: Option<ValidatedImage>,
}

async fn read_job_form(mut multipart: Multipart) -> Result<JobForm> {
    let mut form = JobForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("prompt") => form.prompt = Some(field.text().await?),
            Some("strength") => form.strength = Some(field.text().await?),
            Some("image") => {
                // Browsers send an empty part when no file was picked.
                if field.file_name().is_none_or(str::is_empty) {
                    continue;
                }
                let content_type = field.content_type().map(String::from);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                form.image = Some(validate_image(content_type.as_deref(), bytes.to_vec())?);
            }
            _ => {}
        }
    }
    Ok(form)
}

fn parse_strength(value: Option<&str>) -> Result<f64> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_STRENGTH);
    };
    value
        .parse::<f64>()
        .ok()
        .filter(|strength| (0.0..=1.0).contains(strength))
        .ok_or_else(|| Error::InvalidRequest(String::from("Strength must be between 0 and 1")))
}

fn job_id(path: std::result::Result<Path<i32>, PathRejection>) -> Result<i32> {
    path.map(|Path(id)| id)
        .map_err(|rejection| Error::InvalidRequest(rejection.body_text()))
}

pub async fn create_job(
    State(state): State<AppState>,
    ctx: Ctx,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<JobDb>> {
    let multipart = multipart.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;
    let form = read_job_form(multipart).await?;

    let prompt = form
        .prompt
        .map(|prompt| prompt.trim().to_string())
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| Error::InvalidRequest(String::from("Prompt is required")))?;
    let strength = parse_strength(form.strength.as_deref())?;

    let request = GenerationRequest {
        prompt,
        image_url: form.image.as_ref().map(ValidatedImage::data_url),
    };
    let submission = state.provider.submit(&request).await?;

    let job = state.store.create_job(NewJob {
        owner_id: ctx.user.id,
        strength: request.image_url.as_ref().map(|_| strength),
        prompt: request.prompt,
        image_url: request.image_url,
        application: String::from(submission.application.id()),
        provider_request_id: Some(submission.request_id),
    })?;
    info!(
        "User {} created job {} on {}",
        ctx.user.id, job.id, job.application
    );

    if let Err(err) = state.tracker.monitor(job.id).await {
        error!("Failed to start monitoring job {} - {err}", job.id);
    }

    Ok(ApiResponse::ok("Job created successfully", job))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    ctx: Ctx,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<ApiResponse<Vec<JobDb>>> {
    let Query(params) =
        params.map_err(|rejection| Error::InvalidRequest(rejection.body_text()))?;

    let page = params.page.unwrap_or(1);
    if page < 1 {
        return Err(Error::InvalidRequest(String::from(
            "Page must be at least 1",
        )));
    }
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(Error::InvalidRequest(format!(
            "Limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }

    let jobs = state.store.list_jobs_for_owner(ctx.user.id, page, limit)?;
    Ok(ApiResponse::ok("Jobs retrieved successfully", jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    ctx: Ctx,
    path: std::result::Result<Path<i32>, PathRejection>,
) -> Result<ApiResponse<JobDb>> {
    let job = state
        .store
        .fetch_job_for_owner(job_id(path)?, ctx.user.id)?
        .ok_or(Error::JobNotFound)?;
    Ok(ApiResponse::ok("Job retrieved successfully", job))
}

pub async fn job_status(
    State(state): State<AppState>,
    ctx: Ctx,
    path: std::result::Result<Path<i32>, PathRejection>,
) -> Result<ApiResponse<JobStatusData>> {
    let job = state
        .store
        .fetch_job_for_owner(job_id(path)?, ctx.user.id)?
        .ok_or(Error::JobNotFound)?;
    let job = state.tracker.refresh(job).await?;

    Ok(ApiResponse::ok(
        "Job status retrieved successfully",
        JobStatusData {
            job_id: job.id,
            status: job.status,
            provider_request_id: job.provider_request_id,
            result_url: job.result_url,
        },
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strength_defaults_and_bounds() {
        assert_eq!(parse_strength(None).unwrap(), 0.7);
        assert_eq!(parse_strength(Some(" ")).unwrap(), 0.7);
        assert_eq!(parse_strength(Some("0")).unwrap(), 0.0);
        assert_eq!(parse_strength(Some("1.0")).unwrap(), 1.0);
        assert!(parse_strength(Some("1.5")).is_err());
        assert!(parse_strength(Some("-0.1")).is_err());
        assert!(parse_strength(Some("strong")).is_err());
        assert!(parse_strength(Some("NaN")).is_err());
    }
}

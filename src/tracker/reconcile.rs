//! Mapping of remote provider state onto local job transitions.

use tracing::warn;

use crate::models::job::{JobDb, JobUpdate};
use crate::models::job_status::JobStatus;
use crate::provider::{Application, ImageProvider, QueueStatus};

/// What the provider currently says about a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteState {
    /// No usable answer. `error` is set when the provider could not be reached.
    Pending { error: Option<String> },
    Queued,
    Processing,
    Completed {
        result_url: Option<String>,
        description: String,
    },
    Failed { error: String },
}

/// Asks the provider for the state of `request_id`.
///
/// When the status query itself fails, the result is fetched directly: the
/// request may have completed and expired from the status queue.
pub async fn check_remote(
    provider: &dyn ImageProvider,
    application: Application,
    request_id: &str,
) -> RemoteState {
    match provider.status(application, request_id).await {
        Ok(QueueStatus::Completed) => match provider.result(application, request_id).await {
            Ok(output) => RemoteState::Completed {
                result_url: output.result_url,
                description: output.description,
            },
            Err(err) => RemoteState::Failed {
                error: format!("Job marked as completed but result unavailable: {err}"),
            },
        },
        Ok(QueueStatus::InProgress) => RemoteState::Processing,
        Ok(QueueStatus::InQueue { .. }) => RemoteState::Queued,
        Ok(QueueStatus::Unknown(status)) => {
            warn!("Request {request_id} reported unknown status '{status}'");
            RemoteState::Pending { error: None }
        }
        Err(status_err) => {
            warn!("Failed to check status of request {request_id}: {status_err}");
            match provider.result(application, request_id).await {
                Ok(output) => RemoteState::Completed {
                    result_url: output.result_url,
                    description: output.description,
                },
                Err(_) => RemoteState::Pending {
                    error: Some(format!("Unable to determine job status: {status_err}")),
                },
            }
        }
    }
}

/// Computes the update that brings `job` in line with `remote`.
///
/// Returns `None` when nothing changes: the job is terminal, the provider has
/// no answer, or the remote state would move the job backwards.
pub fn reconcile(job: &JobDb, remote: &RemoteState) -> Option<JobUpdate> {
    if job.status.is_terminal() {
        return None;
    }

    let update = match remote {
        RemoteState::Pending { .. } => return None,
        RemoteState::Queued => JobUpdate {
            status: Some(JobStatus::Queued),
            ..Default::default()
        },
        RemoteState::Processing => JobUpdate {
            status: Some(JobStatus::Processing),
            ..Default::default()
        },
        RemoteState::Completed {
            result_url: Some(url),
            description,
        } => JobUpdate {
            status: Some(JobStatus::Completed),
            result_url: Some(url.clone()),
            description: Some(description.clone()).filter(|text| !text.is_empty()),
            ..Default::default()
        },
        RemoteState::Completed {
            result_url: None, ..
        } => JobUpdate {
            status: Some(JobStatus::Failed),
            error: Some(String::from("Provider returned no image")),
            ..Default::default()
        },
        RemoteState::Failed { error } => JobUpdate {
            status: Some(JobStatus::Failed),
            error: Some(error.clone()),
            ..Default::default()
        },
    };

    match update.status {
        Some(next) if job.status.can_transition_to(next) => Some(update),
        _ => None,
    }
}

//! FAL queue REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    Application, GenerationOutput, GenerationRequest, ImageProvider, QueueStatus, Submission,
};
use crate::config::FalConfig;
use crate::prelude::*;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    queue_position: Option<u64>,
}

/// Talks to `{queue_url}/{application}` with `Authorization: Key {FAL_KEY}`.
pub struct FalClient {
    client: Client,
    config: FalConfig,
}

impl FalClient {
    /// Stalled requests fail with [`Error::Http`] once
    /// [`FalConfig::request_timeout`] elapses.
    pub fn new(config: FalConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout))
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let key = self
            .config
            .key
            .as_deref()
            .ok_or(Error::ProviderNotConfigured)?;
        Ok(builder.header(header::AUTHORIZATION, format!("Key {key}")))
    }

    fn request_url(&self, application: Application, request_id: &str) -> String {
        format!(
            "{}/{}/requests/{request_id}",
            self.config.queue_url,
            application.queue_root()
        )
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Provider {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ImageProvider for FalClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission> {
        let application = request.application();
        let url = format!("{}/{}", self.config.queue_url, application.id());
        let response = self
            .authorized(self.client.post(url))?
            .json(&request.arguments())
            .send()
            .await?;
        let submitted: SubmitResponse = Self::checked(response).await?.json().await?;
        info!(
            "Submitted request {} to {}",
            submitted.request_id,
            application.id()
        );
        Ok(Submission {
            request_id: submitted.request_id,
            application,
        })
    }

    async fn status(&self, application: Application, request_id: &str) -> Result<QueueStatus> {
        let url = format!("{}/status", self.request_url(application, request_id));
        let response = self.authorized(self.client.get(url))?.send().await?;
        let status: StatusResponse = Self::checked(response).await?.json().await?;
        debug!("Request {request_id} status {}", status.status);
        Ok(match status.status.as_str() {
            "IN_QUEUE" => QueueStatus::InQueue {
                position: status.queue_position,
            },
            "IN_PROGRESS" => QueueStatus::InProgress,
            "COMPLETED" => QueueStatus::Completed,
            _ => QueueStatus::Unknown(status.status),
        })
    }

    async fn result(
        &self,
        application: Application,
        request_id: &str,
    ) -> Result<GenerationOutput> {
        let url = self.request_url(application, request_id);
        let response = self.authorized(self.client.get(url))?.send().await?;
        let output: Value = Self::checked(response).await?.json().await?;
        debug!("Request {request_id} result {output}");
        Ok(GenerationOutput::from_value(&output))
    }
}

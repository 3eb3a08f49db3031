//! Image generation providers.
//!
//! Jobs are handed to a remote queue and processed asynchronously: a
//! submission returns a request id, and the request is later polled through
//! [`ImageProvider::status`] and [`ImageProvider::result`].

pub mod fal;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::prelude::*;

/// Provider endpoint a job runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Application {
    /// Text-to-image generation.
    TextToImage,
    /// Image-to-image editing.
    ImageEdit,
}

impl Application {
    pub fn id(&self) -> &'static str {
        match self {
            Application::TextToImage => "fal-ai/nano-banana",
            Application::ImageEdit => "fal-ai/nano-banana/edit",
        }
    }

    /// Parses an id previously returned by [`Application::id`].
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "fal-ai/nano-banana" => Ok(Application::TextToImage),
            "fal-ai/nano-banana/edit" => Ok(Application::ImageEdit),
            other => Err(Error::UnknownApplication(String::from(other))),
        }
    }

    /// `owner/alias` part of the id; queue status and result paths omit the
    /// sub-path.
    ///
    /// ```rust
    /// use imged::provider::Application;
    ///
    /// assert_eq!(Application::ImageEdit.queue_root(), "fal-ai/nano-banana");
    /// ```
    pub fn queue_root(&self) -> &'static str {
        let id = self.id();
        match id.match_indices('/').nth(1) {
            Some((index, _)) => &id[..index],
            None => id,
        }
    }
}

/// A generation or edit request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Source image as a data URL. Its presence turns the request into an edit.
    pub image_url: Option<String>,
}

impl GenerationRequest {
    pub fn application(&self) -> Application {
        match self.image_url {
            Some(_) => Application::ImageEdit,
            None => Application::TextToImage,
        }
    }

    /// Input payload for the selected application.
    pub fn arguments(&self) -> Value {
        match &self.image_url {
            Some(image_url) => json!({
                "prompt": self.prompt,
                "image_urls": [image_url],
                "num_images": 1,
                "output_format": "jpeg",
            }),
            None => json!({
                "prompt": self.prompt,
                "num_images": 1,
                "output_format": "jpeg",
                "aspect_ratio": "1:1",
            }),
        }
    }
}

/// Accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub request_id: String,
    pub application: Application,
}

/// Queue position of a request as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueStatus {
    InQueue { position: Option<u64> },
    InProgress,
    Completed,
    Unknown(String),
}

/// Output of a completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutput {
    /// URL of the first generated image.
    pub result_url: Option<String>,
    pub description: String,
}

impl GenerationOutput {
    pub fn from_value(raw: &Value) -> Self {
        let result_url = raw
            .get("images")
            .and_then(|images| images.get(0))
            .and_then(|image| image.get("url"))
            .and_then(Value::as_str)
            .map(String::from);
        let description = raw
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            result_url,
            description,
        }
    }
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Enqueues `request` and returns as soon as the provider accepted it.
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission>;

    async fn status(&self, application: Application, request_id: &str) -> Result<QueueStatus>;

    async fn result(&self, application: Application, request_id: &str)
    -> Result<GenerationOutput>;
}

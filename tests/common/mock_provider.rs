use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use imged::prelude::*;
use imged::provider::{
    Application, GenerationOutput, GenerationRequest, ImageProvider, QueueStatus, Submission,
};
use serde_json::{Value, json};

/// Provider whose queue state is driven by the test.
pub struct MockProvider {
    configured: bool,
    status: Mutex<QueueStatus>,
    output: Mutex<Option<Value>>,
    submitted: Mutex<Vec<GenerationRequest>>,
    next_request: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            configured: true,
            status: Mutex::new(QueueStatus::InQueue { position: Some(0) }),
            output: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            next_request: AtomicUsize::new(0),
        }
    }

    /// Behaves like a provider without an API key.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn set_status(&self, status: QueueStatus) {
        *self.status.lock().unwrap() = status;
    }

    /// Finishes every request with an image at `url`.
    pub fn complete(&self, url: &str) {
        *self.output.lock().unwrap() =
            Some(json!({"images": [{"url": url}], "description": "Here you go"}));
        self.set_status(QueueStatus::Completed);
    }

    pub fn submitted(&self) -> Vec<GenerationRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for MockProvider {
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission> {
        if !self.configured {
            return Err(Error::ProviderNotConfigured);
        }
        let id = self.next_request.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        Ok(Submission {
            request_id: format!("req-{id}"),
            application: request.application(),
        })
    }

    async fn status(&self, _application: Application, _request_id: &str) -> Result<QueueStatus> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn result(
        &self,
        _application: Application,
        request_id: &str,
    ) -> Result<GenerationOutput> {
        self.output
            .lock()
            .unwrap()
            .as_ref()
            .map(GenerationOutput::from_value)
            .ok_or_else(|| Error::Provider {
                status: 404,
                body: format!("no result for {request_id}"),
            })
    }
}

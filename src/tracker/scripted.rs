use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::prelude::*;
use crate::provider::{
    Application, GenerationOutput, GenerationRequest, ImageProvider, QueueStatus, Submission,
};

/// Replays a fixed list of status answers. `None` steps fail; the last step
/// repeats once the list is exhausted.
pub struct ScriptedProvider {
    steps: Vec<Option<QueueStatus>>,
    output: Option<Value>,
    status_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Option<QueueStatus>>, output: Option<Value>) -> Self {
        Self {
            steps,
            output,
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission> {
        Ok(Submission {
            request_id: String::from("req-1"),
            application: request.application(),
        })
    }

    async fn status(&self, _application: Application, _request_id: &str) -> Result<QueueStatus> {
        let call = self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.steps
            .get(call)
            .or(self.steps.last())
            .cloned()
            .flatten()
            .ok_or(Error::Provider {
                status: 500,
                body: String::from("status unavailable"),
            })
    }

    async fn result(
        &self,
        _application: Application,
        _request_id: &str,
    ) -> Result<GenerationOutput> {
        self.output
            .as_ref()
            .map(GenerationOutput::from_value)
            .ok_or(Error::Provider {
                status: 404,
                body: String::from("result not found"),
            })
    }
}

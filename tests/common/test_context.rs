use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use imged::api::{AppState, serve};
use imged::auth::jwt::JwtKeys;
use imged::prelude::*;
use imged::store::memory::MemoryStore;
use imged::tracker::{JobTracker, TrackerSettings};
use jsonwebtoken::Algorithm;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::api_client::ApiClient;
use super::mock_provider::MockProvider;

pub const JWT_SECRET: &[u8] = b"integration-test-secret";

/// A server on an ephemeral port backed by the in-memory store.
pub struct TestContext {
    pub api: ApiClient,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<MockProvider>,
    pub keys: JwtKeys,
    server: JoinHandle<Result<()>>,
    tracker: JoinHandle<()>,
}

impl TestContext {
    pub async fn start() -> Self {
        Self::with_provider(MockProvider::new()).await
    }

    pub async fn with_provider(provider: MockProvider) -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(provider);
        let settings = TrackerSettings {
            poll_interval: Duration::from_millis(20),
            max_attempts: 500,
        };
        let (tracker, tracker_handle) =
            JobTracker::create(store.clone(), provider.clone(), settings);
        let keys = JwtKeys::new(JWT_SECRET, Algorithm::HS256);

        let state = AppState {
            store: store.clone(),
            provider: provider.clone(),
            tracker,
            keys: keys.clone(),
            token_duration: TimeDelta::minutes(5),
        };

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = listener.local_addr().expect("Listener has no address");
        let server = serve(listener, state);

        Self {
            api: ApiClient {
                url: format!("http://{address}"),
            },
            client: Self::new_client(),
            store,
            provider,
            keys,
            server,
            tracker: tracker_handle,
        }
    }

    /// A client with its own cookie jar.
    pub fn new_client() -> reqwest::Client {
        reqwest::ClientBuilder::new()
            .cookie_store(true)
            .build()
            .expect("Failed to build reqwest Client")
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
        self.tracker.abort();
    }
}

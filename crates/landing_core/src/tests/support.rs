//! Backend doubles shared by the controller tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::protocol::{RegisterRequest, RegisterResponse};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};

use crate::backend::{CounterFetchError, RegisterOutcome, RegistrationBackend, TransportError};

pub(crate) struct FakeBackend {
    pub requests: Mutex<Vec<RegisterRequest>>,
    register_reply: Mutex<Result<RegisterOutcome, TransportError>>,
    count_reply: Mutex<Result<u64, CounterFetchError>>,
    pub count_calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn accepting() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            register_reply: Mutex::new(Ok(RegisterOutcome::Accepted(RegisterResponse {
                message: Some("Registration successful!".into()),
            }))),
            count_reply: Mutex::new(Ok(0)),
            count_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn replying(reply: Result<RegisterOutcome, TransportError>) -> Self {
        let backend = Self::accepting();
        *backend.register_reply.try_lock().expect("fresh lock") = reply;
        backend
    }

    pub fn with_count(self, reply: Result<u64, CounterFetchError>) -> Self {
        *self.count_reply.try_lock().expect("fresh lock") = reply;
        self
    }

    /// Holds every `register` call until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub async fn set_register_reply(&self, reply: Result<RegisterOutcome, TransportError>) {
        *self.register_reply.lock().await = reply;
    }

    pub async fn set_count_reply(&self, reply: Result<u64, CounterFetchError>) {
        *self.count_reply.lock().await = reply;
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrationBackend for FakeBackend {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterOutcome, TransportError> {
        self.requests.lock().await.push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.register_reply.lock().await.clone()
    }

    async fn registrant_count(&self) -> Result<u64, CounterFetchError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.count_reply.lock().await.clone()
    }
}

#[derive(Clone)]
struct MockState {
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    register: (StatusCode, String),
    count: (StatusCode, String),
}

async fn handle_register(
    State(state): State<MockState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.received.lock().await.push(payload);
    let (status, body) = state.register.clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

async fn handle_count(State(state): State<MockState>) -> impl IntoResponse {
    let (status, body) = state.count.clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

pub(crate) struct MockServer {
    pub base_url: String,
    pub received: Arc<Mutex<Vec<serde_json::Value>>>,
}

/// Serves both endpoints with canned status codes and raw bodies.
pub(crate) async fn spawn_mock_backend(
    register: (StatusCode, &str),
    count: (StatusCode, &str),
) -> Result<MockServer> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        received: Arc::clone(&received),
        register: (register.0, register.1.to_string()),
        count: (count.0, count.1.to_string()),
    };
    let app = Router::new()
        .route("/api/register/", post(handle_register))
        .route("/api/users/count/", get(handle_count))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(MockServer {
        base_url: format!("http://{addr}"),
        received,
    })
}

/// A loopback address nothing listens on.
pub(crate) async fn unreachable_base_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

//! In-process mock llama-server for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use llamalink_core::Endpoint;
use llamalink_runtime::Transport;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Number of `/models` polls a load or unload takes to settle.
pub const TRANSITION_POLLS: u32 = 2;

#[derive(Debug, Clone)]
pub struct MockModel {
    pub status: String,
    pub args: Vec<String>,
    pub preset: String,
    pending: Option<(String, u32)>,
}

impl MockModel {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            args: vec!["--ctx-size".to_string(), "4096".to_string()],
            preset: String::new(),
            pending: None,
        }
    }
}

#[derive(Default)]
pub struct MockState {
    pub models: Mutex<BTreeMap<String, MockModel>>,
    /// Body returned by `POST /v1/chat/completions` when streaming.
    pub stream_body: Mutex<String>,
    pub load_calls: AtomicUsize,
    pub unload_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub last_metrics_query: Mutex<Option<String>>,
    pub infinite_dropped: AtomicBool,
    /// Answer load and unload requests with 503.
    pub reject_transitions: AtomicBool,
}

impl MockState {
    pub fn with_models(models: &[(&str, &str)]) -> Self {
        let state = Self::default();
        {
            let mut map = state.models.lock().unwrap();
            for (id, status) in models {
                map.insert((*id).to_string(), MockModel::new(status));
            }
        }
        state
    }

    pub fn set_stream_body(&self, body: &str) {
        *self.stream_body.lock().unwrap() = body.to_string();
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(state: MockState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::serve(listener, state)
    }

    /// Serve on a specific port (for tests that bind late).
    pub async fn start_on(port: u16, state: MockState) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        Self::serve(listener, state)
    }

    fn serve(listener: TcpListener, state: MockState) -> Self {
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(state);
        let app = router(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::local(self.addr.port())
    }

    pub fn transport(&self) -> Transport {
        Transport::new(self.endpoint()).unwrap()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Reserve a free port by binding and immediately releasing it.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Join chunk objects into a `data:` framed body ending with `[DONE]`.
pub fn sse_body(chunks: &[Value]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("data: ");
        body.push_str(&chunk.to_string());
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// A chat chunk carrying a single delta.
pub fn delta(delta: Value) -> Value {
    json!({"object": "chat.completion.chunk", "choices": [{"index": 0, "delta": delta}]})
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/models", get(list_models))
        .route("/v1/models", get(list_models))
        .route("/models/load", post(load_model))
        .route("/models/unload", post(unload_model))
        .route("/v1/chat/completions", post(chat))
        .route("/v1/infinite", post(infinite))
        .route("/metrics", get(metrics))
        .route("/tokenize", post(tokenize))
        .route("/detokenize", post(detokenize))
        .route("/props", get(props))
        .route(
            "/teapot",
            get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
        )
        .with_state(state)
}

async fn list_models(State(state): State<Arc<MockState>>) -> Json<Value> {
    let mut models = state.models.lock().unwrap();
    let mut data = Vec::new();
    for (id, model) in models.iter_mut() {
        if let Some((target, remaining)) = model.pending.take() {
            if remaining <= 1 {
                model.status = target;
            } else {
                model.pending = Some((target, remaining - 1));
            }
        }
        data.push(json!({
            "id": id,
            "path": format!("/models/{id}.gguf"),
            "status": {"value": model.status, "args": model.args, "preset": model.preset},
            "meta": {"vocab_type": 2, "n_vocab": 151_936, "n_ctx_train": 40_960, "n_embd": 4096}
        }));
    }
    Json(json!({"data": data}))
}

fn begin_transition(
    state: &MockState,
    body: &Value,
    transitional: &str,
    target: &str,
) -> (StatusCode, Json<Value>) {
    if state.reject_transitions.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": {"code": 503, "message": "server busy", "type": "unavailable_error"}})),
        );
    }
    let id = body["model"].as_str().unwrap_or_default();
    let mut models = state.models.lock().unwrap();
    let Some(model) = models.get_mut(id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": 404, "message": "model not found", "type": "not_found_error"}})),
        );
    };
    model.status = transitional.to_string();
    model.pending = Some((target.to_string(), TRANSITION_POLLS));
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn load_model(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.load_calls.fetch_add(1, Ordering::SeqCst);
    begin_transition(&state, &body, "loading", "loaded")
}

async fn unload_model(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.unload_calls.fetch_add(1, Ordering::SeqCst);
    begin_transition(&state, &body, "unloading", "unloaded")
}

async fn chat(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.chat_calls.fetch_add(1, Ordering::SeqCst);
    if body["stream"].as_bool() == Some(true) {
        let text = state.stream_body.lock().unwrap().clone();
        ([(header::CONTENT_TYPE, "text/event-stream")], text).into_response()
    } else {
        Json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "pong"}}]
        }))
        .into_response()
    }
}

/// Flags the shared state when the response body is dropped.
struct DropFlag(Arc<MockState>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.infinite_dropped.store(true, Ordering::SeqCst);
    }
}

async fn infinite(State(state): State<Arc<MockState>>) -> Response {
    let flag = DropFlag(state);
    let chunk = format!("data: {}\n\n", delta(json!({"content": "x"})));
    let stream = futures_util::stream::unfold(flag, move |flag| {
        let chunk = chunk.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Some((Ok::<_, std::io::Error>(Bytes::from(chunk)), flag))
        }
    });
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response()
}

async fn metrics(
    State(state): State<Arc<MockState>>,
    Query(query): Query<BTreeMap<String, String>>,
) -> String {
    *state.last_metrics_query.lock().unwrap() = query.get("model").cloned();
    "# HELP llamacpp:prompt_tokens_total Prompt tokens.\n\
     # TYPE llamacpp:prompt_tokens_total counter\n\
     llamacpp:prompt_tokens_total 42\n\
     llamacpp:tokens_predicted_seconds_total 1.5\n\
     llamacpp:requests_processing{slot=\"0\"} 1\n"
        .to_string()
}

async fn tokenize(Json(body): Json<Value>) -> Json<Value> {
    if body["with_pieces"].as_bool() == Some(true) {
        Json(json!({"tokens": [{"id": 15043, "piece": "Hello"}, {"id": 3186, "piece": " world"}]}))
    } else {
        Json(json!({"tokens": [15043, 3186]}))
    }
}

async fn detokenize(Json(body): Json<Value>) -> Json<Value> {
    let count = body["tokens"].as_array().map_or(0, Vec::len);
    Json(json!({"content": format!("{count} tokens")}))
}

async fn props() -> Json<Value> {
    Json(json!({
        "model_path": "/models/qwen3.gguf",
        "default_generation_settings": {"n_ctx": 8192},
        "chat_template": "{{ messages }}",
        "is_sleeping": false
    }))
}

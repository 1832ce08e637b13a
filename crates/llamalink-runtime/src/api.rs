//! High-level facade over the llama-server HTTP API.

use llamalink_core::{
    ChatCompletionRequest, ChatMessage, ClientSettings, CompletionRequest, Metrics, ModelProps,
    ModelRecord, RegistryListing, StreamClassifier,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::classify::{EventStream, classify_with};
use crate::health::{HealthStatus, probe};
use crate::transport::{ChunkStream, Payload, Transport, TransportError};

/// Model name sent with embedding requests when no model is configured.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// A token returned by `/tokenize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Id(i64),
    /// Returned when pieces are requested. `piece` is a string, or a byte
    /// array when the piece is not valid UTF-8.
    WithPiece { id: i64, piece: Value },
}

impl Token {
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Id(id) | Self::WithPiece { id, .. } => *id,
        }
    }
}

/// Response of a generation call.
pub enum Generation {
    /// Full JSON body of a non-streaming call.
    Complete(Value),
    /// Raw chunk stream of a streaming call.
    Streaming(ChunkStream),
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete(value) => f.debug_tuple("Complete").field(value).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Typed access to llama-server endpoints, with per-session settings.
#[derive(Debug, Clone)]
pub struct LlamaApi {
    transport: Transport,
    settings: ClientSettings,
}

impl LlamaApi {
    #[must_use]
    pub const fn new(transport: Transport, settings: ClientSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ClientSettings {
        &mut self.settings
    }

    /// `GET /health`. Never fails; connection errors become `Unavailable`.
    pub async fn health(&self) -> HealthStatus {
        probe(&self.transport).await
    }

    /// `GET /slots`.
    pub async fn slots(&self) -> Result<Value, TransportError> {
        json_or_unexpected(self.transport.get("/slots", &[]).await?, "/slots")
    }

    /// `GET /v1/models`.
    pub async fn models(&self) -> Result<RegistryListing, TransportError> {
        self.transport
            .get("/v1/models", &[])
            .await?
            .into_typed("/v1/models")
    }

    /// The `/v1/models` entry at `slot`, carrying path and GGUF metadata.
    pub async fn model_record(&self, slot: usize) -> Result<ModelRecord, TransportError> {
        let listing = self.models().await?;
        let count = listing.data.len();
        listing
            .data
            .into_iter()
            .nth(slot)
            .ok_or_else(|| TransportError::UnexpectedResponse {
                path: "/v1/models".to_string(),
                reason: format!("no model in slot {slot} ({count} listed)"),
            })
    }

    /// `GET /props`, optionally for one model in router mode.
    pub async fn props(&self, model: Option<&str>) -> Result<ModelProps, TransportError> {
        let params = model_param(model);
        let raw = json_or_unexpected(self.transport.get("/props", &params).await?, "/props")?;
        Ok(ModelProps::from_value(&raw))
    }

    /// `GET /metrics`, decoded. Requires the server to run with `--metrics`.
    pub async fn metrics(&self, model: Option<&str>) -> Result<Metrics, TransportError> {
        let params = model_param(model);
        let text = self.transport.get("/metrics", &params).await?.into_text();
        Ok(Metrics::parse(&text))
    }

    /// `POST /tokenize`.
    pub async fn tokenize(
        &self,
        content: &str,
        add_special: bool,
        with_pieces: bool,
    ) -> Result<Vec<Token>, TransportError> {
        let body = json!({
            "content": content,
            "add_special": add_special,
            "with_pieces": with_pieces,
        });
        let raw = json_or_unexpected(self.transport.post("/tokenize", &body).await?, "/tokenize")?;
        let tokens = raw.get("tokens").cloned().unwrap_or(Value::Array(Vec::new()));
        serde_json::from_value(tokens).map_err(|e| TransportError::UnexpectedResponse {
            path: "/tokenize".to_string(),
            reason: e.to_string(),
        })
    }

    /// `POST /detokenize`. Accepts plain ids or tokens with pieces.
    pub async fn detokenize(&self, tokens: &[Token]) -> Result<String, TransportError> {
        let ids: Vec<i64> = tokens.iter().map(Token::id).collect();
        let raw = json_or_unexpected(
            self.transport
                .post("/detokenize", &json!({ "tokens": ids }))
                .await?,
            "/detokenize",
        )?;
        raw.get("content")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| TransportError::UnexpectedResponse {
                path: "/detokenize".to_string(),
                reason: "missing 'content'".to_string(),
            })
    }

    /// `POST /v1/embeddings` for one or more inputs.
    pub async fn embeddings(&self, input: &[String]) -> Result<Value, TransportError> {
        let model = self
            .settings
            .model
            .as_deref()
            .unwrap_or(DEFAULT_EMBEDDING_MODEL);
        let body = json!({
            "input": input,
            "model": model,
            "encoding_format": "float",
        });
        json_or_unexpected(
            self.transport.post("/v1/embeddings", &body).await?,
            "/v1/embeddings",
        )
    }

    /// `POST /v1/completions`, streaming according to the settings.
    pub async fn completion(&self, prompt: &str) -> Result<Generation, TransportError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            prompt: prompt.to_string(),
            stream: self.settings.effective_stream(),
            sampling: self.settings.sampling.clone(),
        };
        self.generate("/v1/completions", &request, request.stream)
            .await
    }

    /// `POST /v1/chat/completions`, streaming according to the settings.
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<Vec<Value>>,
    ) -> Result<Generation, TransportError> {
        let request = self.chat_request(messages, tools, self.settings.effective_stream());
        self.generate("/v1/chat/completions", &request, request.stream)
            .await
    }

    /// Streaming chat completion decoded into events. Always streams.
    pub async fn chat_events(
        &self,
        messages: &[ChatMessage],
        tools: Option<Vec<Value>>,
        classifier: StreamClassifier,
    ) -> Result<EventStream, TransportError> {
        let request = self.chat_request(messages, tools, true);
        let chunks = self
            .transport
            .stream("/v1/chat/completions", &request)
            .await?;
        Ok(classify_with(chunks, classifier))
    }

    fn chat_request(
        &self,
        messages: &[ChatMessage],
        tools: Option<Vec<Value>>,
        stream: bool,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: messages.to_vec(),
            stream,
            sampling: self.settings.sampling.clone(),
            tools,
        }
    }

    async fn generate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        stream: bool,
    ) -> Result<Generation, TransportError> {
        if stream {
            Ok(Generation::Streaming(self.transport.stream(path, body).await?))
        } else {
            let payload = self.transport.post(path, body).await?;
            Ok(Generation::Complete(json_or_unexpected(payload, path)?))
        }
    }
}

fn model_param(model: Option<&str>) -> Vec<(&str, &str)> {
    model.map(|m| vec![("model", m)]).unwrap_or_default()
}

fn json_or_unexpected(payload: Payload, path: &str) -> Result<Value, TransportError> {
    match payload {
        Payload::Json(value) => Ok(value),
        Payload::Text(_) => Err(TransportError::UnexpectedResponse {
            path: path.to_string(),
            reason: "expected a JSON body".to_string(),
        }),
    }
}

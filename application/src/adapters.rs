//! Bind the OpenAI-compatible backends to the call shapes the RAG engine
//! expects. Both adapters forward exactly one backend call per invocation and
//! return its result untouched.

use async_trait::async_trait;
use domain::ingestion::EmbeddingSpec;
use domain::models::ChatMessage;
use domain::ports::{
    CompletionBackend, CompletionRequest, EmbeddingBackend, EmbeddingRequest, Endpoint,
    LanguageModel, TextEmbedder,
};
use serde_json::{Map, Value};
use shared::types::Result;
use std::sync::Arc;

pub struct LlmAdapter {
    backend: Arc<dyn CompletionBackend>,
    endpoint: Endpoint,
    extra: Map<String, Value>,
}

impl LlmAdapter {
    pub fn new(backend: Arc<dyn CompletionBackend>, endpoint: Endpoint) -> Self {
        Self {
            backend,
            endpoint,
            extra: Map::new(),
        }
    }

    /// Add a keyword option (temperature, max_tokens, ...) forwarded on every call.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl LanguageModel for LlmAdapter {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<String> {
        self.backend
            .complete(CompletionRequest {
                model: self.endpoint.model.clone(),
                prompt: prompt.to_string(),
                system_prompt: system_prompt.map(str::to_string),
                history_messages: history.to_vec(),
                api_key: self.endpoint.api_key.clone(),
                base_url: self.endpoint.api_base.clone(),
                extra: self.extra.clone(),
            })
            .await
    }
}

pub struct EmbeddingAdapter {
    backend: Arc<dyn EmbeddingBackend>,
    endpoint: Endpoint,
    spec: EmbeddingSpec,
}

impl EmbeddingAdapter {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, endpoint: Endpoint, spec: EmbeddingSpec) -> Self {
        Self {
            backend,
            endpoint,
            spec,
        }
    }
}

#[async_trait]
impl TextEmbedder for EmbeddingAdapter {
    fn model(&self) -> &str {
        &self.endpoint.model
    }

    fn spec(&self) -> EmbeddingSpec {
        self.spec
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.backend
            .embed(EmbeddingRequest {
                texts: texts.to_vec(),
                model: self.endpoint.model.clone(),
                api_key: self.endpoint.api_key.clone(),
                base_url: self.endpoint.api_base.clone(),
            })
            .await
    }
}

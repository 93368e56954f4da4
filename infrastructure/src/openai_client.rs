use anyhow::{anyhow, Context};
use async_trait::async_trait;
use domain::models::ChatMessage;
use domain::ports::{CompletionBackend, CompletionRequest, EmbeddingBackend, EmbeddingRequest};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared::types::Result;
use std::sync::Arc;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for any server speaking the OpenAI REST shape (vLLM, LocalAI, ...).
/// Endpoint and key travel with each request, so one client serves every model.
#[derive(Clone, Default)]
pub struct OpenAiClient {
    client: Arc<Client>,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn post(&self, base_url: &str, path: &str, api_key: &str) -> RequestBuilder {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
        let builder = self.client.post(url);
        if api_key.is_empty() {
            builder
        } else {
            builder.bearer_auth(api_key)
        }
    }
}

/// System prompt first, then prior turns, then the new user prompt.
pub fn build_messages(
    prompt: &str,
    system_prompt: Option<&str>,
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(prompt));
    messages
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: build_messages(
                &request.prompt,
                request.system_prompt.as_deref(),
                &request.history_messages,
            ),
            extra: &request.extra,
        };
        tracing::debug!(
            model = %request.model,
            messages = body.messages.len(),
            "sending chat completion"
        );

        let response = self
            .post(&request.base_url, "chat/completions", &request.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed contacting {}", request.base_url))?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("Completion API error ({}): {}", status, text));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).context("Malformed chat completion response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Completion response contained no choices"))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiClient {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingsRequest {
            model: &request.model,
            input: &request.texts,
            encoding_format: "float",
        };
        tracing::debug!(model = %request.model, texts = request.texts.len(), "sending embeddings");

        let response = self
            .post(&request.base_url, "embeddings", &request.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed contacting {}", request.base_url))?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!("Embedding API error ({}): {}", status, text));
        }

        let mut parsed: EmbeddingsResponse =
            serde_json::from_str(&text).context("Malformed embeddings response")?;
        if parsed.data.len() != request.texts.len() {
            return Err(anyhow!(
                "Embedding API returned {} vectors for {} inputs",
                parsed.data.len(),
                request.texts.len()
            ));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

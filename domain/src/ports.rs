//! Seams to the collaborators the demo drives but does not implement: the
//! OpenAI-compatible HTTP client, the RAG engine, and the page canvas.

use crate::error::DemoError;
use crate::ingestion::{EmbeddingSpec, IngestionConfig, ParseMethod};
use crate::models::{ChatMessage, QueryMode};
use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::types::Result;
use std::path::Path;
use std::sync::Arc;

/// Model plus the OpenAI-compatible server that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub model: String,
    pub api_base: String,
    pub api_key: String,
}

impl Endpoint {
    pub fn new(
        model: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    /// Same server and key, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

/// Arguments of one chat-completion call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub history_messages: Vec<ChatMessage>,
    pub api_key: String,
    pub base_url: String,
    /// Extra body fields (temperature, max_tokens, ...) sent as-is.
    pub extra: Map<String, Value>,
}

/// Arguments of one embedding call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddingRequest {
    pub texts: Vec<String>,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>>;
}

/// Text generation as the RAG engine sees it.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<String>;
}

/// Embedding as the RAG engine sees it.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Model that produced the vectors; stored alongside them.
    fn model(&self) -> &str;

    fn spec(&self) -> EmbeddingSpec;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait RagEngine: Send + Sync {
    /// Parse, chunk, embed and persist one document.
    async fn process_document_complete(
        &self,
        file_path: &Path,
        output_dir: &Path,
        parse_method: ParseMethod,
    ) -> Result<()>;

    async fn query(&self, query: &str, mode: QueryMode) -> Result<String>;
}

/// Resolves and constructs a RAG engine.
pub trait RagBackend: Send + Sync {
    /// Confirms everything the engine needs at runtime is present.
    fn probe(&self, config: &IngestionConfig) -> std::result::Result<(), DemoError>;

    fn create(
        &self,
        config: IngestionConfig,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Box<dyn RagEngine>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

/// The standard PDF base-14 faces the fixture needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
}

/// Single-page drawing surface in PDF user space (origin bottom-left).
pub trait PageCanvas: Sized {
    fn create(path: &Path, size: PageSize) -> Result<Self>;

    fn page_size(&self) -> PageSize;

    fn set_font(&mut self, font: Font, size: f32);

    fn set_stroke_color(&mut self, color: Rgb);

    fn draw_string(&mut self, x: f32, y: f32, text: &str);

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);

    fn save(self) -> Result<()>;
}

//! Collaborator mocks shared by the scenario tests.

use async_trait::async_trait;
use domain::error::DemoError;
use domain::ingestion::{IngestionConfig, ParseMethod};
use domain::models::QueryMode;
use domain::ports::{
    CompletionBackend, CompletionRequest, EmbeddingBackend, EmbeddingRequest, LanguageModel,
    RagBackend, RagEngine, TextEmbedder,
};
use mockall::mock;
use shared::types::Result;
use std::path::Path;
use std::sync::Arc;

mock! {
    pub Completion {}
    #[async_trait]
    impl CompletionBackend for Completion {
        async fn complete(&self, request: CompletionRequest) -> Result<String>;
    }
}

mock! {
    pub Embeddings {}
    #[async_trait]
    impl EmbeddingBackend for Embeddings {
        async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>>;
    }
}

mock! {
    pub Engine {}
    #[async_trait]
    impl RagEngine for Engine {
        async fn process_document_complete(
            &self,
            file_path: &Path,
            output_dir: &Path,
            parse_method: ParseMethod,
        ) -> Result<()>;
        async fn query(&self, query: &str, mode: QueryMode) -> Result<String>;
    }
}

mock! {
    pub Backend {}
    impl RagBackend for Backend {
        fn probe(&self, config: &IngestionConfig) -> std::result::Result<(), DemoError>;
        fn create(
            &self,
            config: IngestionConfig,
            llm: Arc<dyn LanguageModel>,
            embedder: Arc<dyn TextEmbedder>,
        ) -> Result<Box<dyn RagEngine>>;
    }
}

/// HTTP backends that panic on any call.
pub fn offline_backends() -> (Arc<MockCompletion>, Arc<MockEmbeddings>) {
    let mut completion = MockCompletion::new();
    completion.expect_complete().never();
    let mut embeddings = MockEmbeddings::new();
    embeddings.expect_embed().never();
    (Arc::new(completion), Arc::new(embeddings))
}

/// A backend that hands out `engine` once, after a successful probe.
pub fn backend_with(engine: MockEngine) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_probe().times(1).returning(|_| Ok(()));
    let mut engine = Some(engine);
    backend.expect_create().times(1).returning(move |_, _, _| {
        let engine = engine
            .take()
            .ok_or_else(|| anyhow::anyhow!("engine already created"))?;
        Ok(Box::new(engine) as Box<dyn RagEngine>)
    });
    backend
}

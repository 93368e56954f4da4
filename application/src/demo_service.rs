use crate::adapters::{EmbeddingAdapter, LlmAdapter};
use domain::ingestion::{EmbeddingSpec, IngestionConfig, ParseMethod};
use domain::models::QueryMode;
use domain::ports::{CompletionBackend, EmbeddingBackend, RagBackend, RagEngine};
use domain::run_config::RunConfig;
use shared::types::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings that do not come from the command line.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub ingestion: IngestionConfig,
    pub output_dir: PathBuf,
    /// Falls back to the chat model when `None`.
    pub embedding_model: Option<String>,
    pub embedding: EmbeddingSpec,
}

/// Drives the ingest-then-query flow against whatever backends it is given.
pub struct DemoService {
    rag: Arc<dyn RagBackend>,
    completion: Arc<dyn CompletionBackend>,
    embeddings: Arc<dyn EmbeddingBackend>,
}

impl DemoService {
    pub fn new(
        rag: Arc<dyn RagBackend>,
        completion: Arc<dyn CompletionBackend>,
        embeddings: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            rag,
            completion,
            embeddings,
        }
    }

    /// Probe the engine's requirements, bind both adapters and create the
    /// engine. Nothing is sent over the network here.
    pub fn prepare(&self, run: &RunConfig, options: DemoOptions) -> Result<PreparedDemo> {
        self.rag.probe(&options.ingestion)?;

        let chat = run.endpoint();
        let embed = match &options.embedding_model {
            Some(model) => chat.with_model(model.clone()),
            None => chat.clone(),
        };
        tracing::info!(
            chat_model = %chat.model,
            embedding_model = %embed.model,
            api_base = %chat.api_base,
            "binding model adapters"
        );
        let llm = LlmAdapter::new(self.completion.clone(), chat);
        let embedder = EmbeddingAdapter::new(self.embeddings.clone(), embed, options.embedding);

        let parse_method = options.ingestion.parse_method();
        let engine = self
            .rag
            .create(options.ingestion, Arc::new(llm), Arc::new(embedder))?;

        Ok(PreparedDemo {
            engine,
            input_file: run.input_file().to_path_buf(),
            output_dir: options.output_dir,
            parse_method,
            query: run.query().to_string(),
        })
    }

    /// The whole flow in one call; returns the answer text.
    pub async fn run(&self, run: &RunConfig, options: DemoOptions) -> Result<String> {
        let demo = self.prepare(run, options)?;
        demo.ingest().await?;
        demo.answer().await
    }
}

/// An engine bound to one input document and one question.
pub struct PreparedDemo {
    engine: Box<dyn RagEngine>,
    input_file: PathBuf,
    output_dir: PathBuf,
    parse_method: ParseMethod,
    query: String,
}

impl PreparedDemo {
    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn ingest(&self) -> Result<()> {
        self.engine
            .process_document_complete(&self.input_file, &self.output_dir, self.parse_method)
            .await
    }

    pub async fn answer(&self) -> Result<String> {
        self.engine.query(&self.query, QueryMode::Hybrid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::error::DemoError;
    use domain::ingestion::ParserKind;
    use domain::ports::{CompletionRequest, EmbeddingRequest, LanguageModel, TextEmbedder};
    use mockall::{mock, Sequence};
    use std::sync::Mutex;

    mock! {
        Completion {}
        #[async_trait]
        impl CompletionBackend for Completion {
            async fn complete(&self, request: CompletionRequest) -> Result<String>;
        }
    }

    mock! {
        Embeddings {}
        #[async_trait]
        impl EmbeddingBackend for Embeddings {
            async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>>;
        }
    }

    mock! {
        Engine {}
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
        Backend {}
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

    fn run_config() -> RunConfig {
        RunConfig::new(
            "Qwen/Qwen2.5-7B-Instruct",
            "http://localhost:8000/v1",
            "EMPTY",
            "doc.pdf",
            "Q?",
        )
        .unwrap()
    }

    fn options(embedding_model: Option<&str>) -> DemoOptions {
        DemoOptions {
            ingestion: IngestionConfig::demo("./rag", ParserKind::MinerU, ParseMethod::Auto)
                .unwrap(),
            output_dir: PathBuf::from("./out"),
            embedding_model: embedding_model.map(str::to_string),
            embedding: EmbeddingSpec::default(),
        }
    }

    /// Backends that fail the test if the flow ever reaches the network.
    fn silent_backends() -> (Arc<MockCompletion>, Arc<MockEmbeddings>) {
        let mut completion = MockCompletion::new();
        completion.expect_complete().never();
        let mut embeddings = MockEmbeddings::new();
        embeddings.expect_embed().never();
        (Arc::new(completion), Arc::new(embeddings))
    }

    #[tokio::test]
    async fn ingests_once_then_queries_once_in_hybrid_mode() {
        let mut seq = Sequence::new();
        let mut engine = MockEngine::new();
        engine
            .expect_process_document_complete()
            .withf(|file, out, method| {
                file == Path::new("doc.pdf") && out == Path::new("./out") && *method == ParseMethod::Auto
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        engine
            .expect_query()
            .withf(|q, mode| q == "Q?" && *mode == QueryMode::Hybrid)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("The document validates the vLLM backend.".to_string()));

        let mut backend = MockBackend::new();
        backend.expect_probe().times(1).returning(|_| Ok(()));
        let mut engine = Some(engine);
        backend
            .expect_create()
            .withf(|config, _, embedder| {
                !config.enable_image_processing()
                    && config.enable_table_processing()
                    && config.enable_equation_processing()
                    && embedder.spec() == EmbeddingSpec::default()
            })
            .times(1)
            .returning(move |_, _, _| {
                let engine = engine.take().ok_or_else(|| anyhow::anyhow!("engine created twice"))?;
                Ok(Box::new(engine) as Box<dyn RagEngine>)
            });

        let (completion, embeddings) = silent_backends();
        let service = DemoService::new(Arc::new(backend), completion, embeddings);
        let answer = service.run(&run_config(), options(None)).await.unwrap();
        assert_eq!(answer, "The document validates the vLLM backend.");
    }

    #[tokio::test]
    async fn probe_failure_stops_before_engine_and_network() {
        let mut backend = MockBackend::new();
        backend.expect_probe().times(1).returning(|_| {
            Err(DemoError::missing_dependency("mineru", "No such file or directory (os error 2)"))
        });
        backend.expect_create().never();

        let (completion, embeddings) = silent_backends();
        let service = DemoService::new(Arc::new(backend), completion, embeddings);
        let err = service.run(&run_config(), options(None)).await.unwrap_err();
        match err.downcast_ref::<DemoError>() {
            Some(DemoError::MissingDependency { name, reason }) => {
                assert_eq!(name, "mineru");
                assert!(reason.contains("No such file or directory"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn engine_adapters_reach_the_bound_endpoints() {
        let mut completion = MockCompletion::new();
        completion
            .expect_complete()
            .withf(|req| req.model == "Qwen/Qwen2.5-7B-Instruct" && req.prompt == "ping")
            .times(1)
            .returning(|_| Ok("pong".to_string()));
        let mut embeddings = MockEmbeddings::new();
        embeddings
            .expect_embed()
            .withf(|req| req.model == "bge-m3" && req.base_url == "http://localhost:8000/v1")
            .times(1)
            .returning(|req| Ok(vec![vec![0.0; 768]; req.texts.len()]));

        type Bound = (Arc<dyn LanguageModel>, Arc<dyn TextEmbedder>);
        let bound: Arc<Mutex<Option<Bound>>> = Arc::default();
        let slot = bound.clone();
        let mut backend = MockBackend::new();
        backend.expect_probe().returning(|_| Ok(()));
        backend.expect_create().times(1).returning(move |_, llm, embedder| {
            *slot.lock().unwrap() = Some((llm, embedder));
            Ok(Box::new(MockEngine::new()) as Box<dyn RagEngine>)
        });

        let service = DemoService::new(Arc::new(backend), Arc::new(completion), Arc::new(embeddings));
        let demo = service.prepare(&run_config(), options(Some("bge-m3"))).unwrap();
        assert_eq!(demo.input_file(), Path::new("doc.pdf"));
        assert_eq!(demo.query(), "Q?");

        let (llm, embedder) = bound.lock().unwrap().take().unwrap();
        assert_eq!(llm.generate("ping", None, &[]).await.unwrap(), "pong");
        assert_eq!(embedder.embed(&["x".to_string()]).await.unwrap()[0].len(), 768);
    }
}

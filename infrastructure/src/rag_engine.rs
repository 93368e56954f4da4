use crate::chunker::Chunker;
use crate::content_blocks::{document_text, select};
use crate::document_parser::DocumentParser;
use crate::embedder::Embedder;
use crate::embedding_storage::{EmbeddingStorage, IndexStamp};
use crate::search::SearchEngine;
use async_trait::async_trait;
use domain::error::DemoError;
use domain::ingestion::{IngestionConfig, ParseMethod};
use domain::models::{Embedding, QueryMode};
use domain::ports::{LanguageModel, RagBackend, RagEngine, TextEmbedder};
use shared::telemetry::Telemetry;
use shared::types::Result;
use std::path::Path;
use std::sync::Arc;

pub const STORE_FILE: &str = "rag_store.db";
const TOP_K: usize = 8;
pub const NO_CONTEXT_ANSWER: &str = "No relevant document context found for this query.";

const SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about documents. \
Answer only from the provided context. If the context does not contain the answer, say so. \
Be concise and keep table values and equations exact.";

/// Backend that builds [`LocalRagEngine`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRagBackend;

impl RagBackend for LocalRagBackend {
    fn probe(&self, config: &IngestionConfig) -> std::result::Result<(), DemoError> {
        DocumentParser::probe(config.parser())
    }

    fn create(
        &self,
        config: IngestionConfig,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Box<dyn RagEngine>> {
        Ok(Box::new(LocalRagEngine::open(config, llm, embedder)?))
    }
}

/// Parse → chunk → embed → SQLite, then retrieve and answer through the
/// supplied model functions.
pub struct LocalRagEngine {
    config: IngestionConfig,
    parser: DocumentParser,
    chunker: Chunker,
    embedder: Embedder,
    llm: Arc<dyn LanguageModel>,
    storage: EmbeddingStorage,
}

impl LocalRagEngine {
    pub fn open(
        config: IngestionConfig,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self> {
        let storage = EmbeddingStorage::new(config.working_dir().join(STORE_FILE))?;
        tracing::info!(
            working_dir = %config.working_dir().display(),
            parser = %config.parser(),
            "RAG engine ready"
        );
        Ok(Self {
            parser: DocumentParser::new(config.parser()),
            chunker: Chunker::for_token_budget(embedder.spec().max_token_size),
            embedder: Embedder::new(embedder),
            llm,
            storage,
            config,
        })
    }

    pub fn chunk_count(&self) -> Result<usize> {
        self.storage.chunk_count()
    }

    /// Stored vectors must match the current embedder before they can be
    /// compared with a query vector.
    fn check_stored_vectors(&self, stored: &[Embedding]) -> Result<()> {
        let expected = self.embedder.embedding_dim();
        if let Some(bad) = stored.iter().find(|e| e.vector.len() != expected) {
            return Err(DemoError::DimensionMismatch {
                expected,
                actual: bad.vector.len(),
            }
            .into());
        }
        let foreign = self
            .storage
            .foreign_document_count(self.embedder.model(), expected)?;
        if foreign > 0 {
            tracing::warn!(
                documents = foreign,
                model = %self.embedder.model(),
                "store holds documents embedded with another model; re-ingest them"
            );
        }
        Ok(())
    }

    fn answer_prompt(query: &str, context: &str) -> String {
        format!(
            "---Context---\n{context}\n\n---Question---\n{query}\n\n\
             Answer the question using the context above."
        )
    }
}

#[async_trait]
impl RagEngine for LocalRagEngine {
    async fn process_document_complete(
        &self,
        file_path: &Path,
        output_dir: &Path,
        parse_method: ParseMethod,
    ) -> Result<()> {
        let timer = Telemetry::new();
        let blocks = self.parser.parse(file_path, output_dir, parse_method).await?;
        let total_blocks = blocks.len();
        let blocks = select(blocks, &self.config);
        tracing::info!(
            file = %file_path.display(),
            parsed = total_blocks,
            kept = blocks.len(),
            "document parsed"
        );

        let text = document_text(&blocks);
        if text.is_empty() {
            tracing::warn!(file = %file_path.display(), "no content extracted; nothing indexed");
            return Ok(());
        }

        let file_key = std::fs::canonicalize(file_path)
            .unwrap_or_else(|_| file_path.to_path_buf())
            .to_string_lossy()
            .to_string();
        let doc_id = format!("doc-{:x}", md5::compute(file_key.as_bytes()));
        let stamp = IndexStamp {
            content_hash: format!("{:x}", md5::compute(text.as_bytes())),
            embedding_model: self.embedder.model().to_string(),
            embedding_dim: self.embedder.embedding_dim(),
        };
        match self.storage.get_index_stamp(&doc_id)? {
            Some(stored) if stored == stamp => {
                tracing::info!(doc_id = %doc_id, "document unchanged; skipping re-index");
                return Ok(());
            }
            Some(stored) if stored.content_hash == stamp.content_hash => tracing::info!(
                doc_id = %doc_id,
                from_model = %stored.embedding_model,
                to_model = %stamp.embedding_model,
                "embedding model or dimension changed; re-indexing"
            ),
            _ => {}
        }

        let chunks = self.chunker.chunk(&doc_id, &text);
        let embeddings = self.embedder.embed_chunks(&doc_id, &chunks).await?;
        self.storage
            .replace_document(&doc_id, &file_key, &stamp, &embeddings)?;
        tracing::info!(
            doc_id = %doc_id,
            chunks = embeddings.len(),
            elapsed_ms = timer.elapsed_ms() as u64,
            "document indexed"
        );
        Ok(())
    }

    async fn query(&self, query: &str, mode: QueryMode) -> Result<String> {
        if mode == QueryMode::Bypass {
            return self.llm.generate(query, None, &[]).await;
        }

        let all_embeddings = self.storage.get_all_embeddings()?;
        if all_embeddings.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let query_embedding = if SearchEngine::uses_vectors(mode) {
            self.check_stored_vectors(&all_embeddings)?;
            Some(self.embedder.embed_query(query).await?)
        } else {
            None
        };
        let relevant = SearchEngine::find_relevant_chunks(
            mode,
            query,
            query_embedding.as_deref(),
            &all_embeddings,
            TOP_K,
        );
        tracing::info!(mode = %mode, candidates = all_embeddings.len(), selected = relevant.len(), "retrieved context");
        if relevant.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        let context = relevant
            .iter()
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
            .join("\n-----\n");
        self.llm
            .generate(&Self::answer_prompt(query, &context), Some(SYSTEM_PROMPT), &[])
            .await
    }
}

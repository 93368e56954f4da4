use crate::chunker::Chunk;
use domain::error::DemoError;
use domain::models::Embedding;
use domain::ports::TextEmbedder;
use shared::types::Result;
use std::sync::Arc;

const BATCH_SIZE: usize = 32;

/// Embeds chunks in fixed-size batches and checks every vector against the
/// embedder's declared dimension.
pub struct Embedder {
    embedder: Arc<dyn TextEmbedder>,
}

impl Embedder {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }

    pub fn model(&self) -> &str {
        self.embedder.model()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedder.spec().embedding_dim
    }

    pub async fn embed_chunks(&self, doc_id: &str, chunks: &[Chunk]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(BATCH_SIZE) {
            tracing::debug!(count = batch.len(), "embedding batch");
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embed_texts(&texts).await?;
            embeddings.extend(batch.iter().zip(vectors).map(|(chunk, vector)| Embedding {
                id: chunk.id.clone(),
                vector,
                text: chunk.text.clone(),
                doc_id: doc_id.to_string(),
            }));
        }
        Ok(embeddings)
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_texts(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding call returned no vector for the query"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed(texts).await?;
        if vectors.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Embedding call returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            ));
        }
        let expected = self.embedding_dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(DemoError::DimensionMismatch {
                expected,
                actual: bad.len(),
            }
            .into());
        }
        Ok(vectors)
    }
}

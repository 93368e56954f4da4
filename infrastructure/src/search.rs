use domain::models::{Embedding, QueryMode};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Reciprocal-rank-fusion damping constant.
const RRF_K: f32 = 60.0;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "shall", "this",
    "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "me", "him", "her",
    "us", "them", "my", "your", "his", "its", "our", "their", "what", "which", "who", "when",
    "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other", "some",
    "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "just",
    "now", "here", "there", "then", "once", "also", "about",
];

pub struct SearchEngine;

impl SearchEngine {
    /// Zero for vectors of different lengths or with no magnitude.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }

    /// Lowercased content words, stop words and one-letter tokens removed.
    pub fn terms(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() > 1)
            .map(str::to_lowercase)
            .filter(|t| !STOP_WORDS.contains(&t.as_str()))
            .collect()
    }

    /// Indices ranked by cosine similarity, best first.
    pub fn rank_by_vector(query_embedding: &[f32], embeddings: &[Embedding]) -> Vec<usize> {
        let scores: Vec<f32> = embeddings
            .par_iter()
            .map(|emb| Self::cosine_similarity(query_embedding, &emb.vector))
            .collect();
        Self::order(&scores, |_| true)
    }

    /// Indices of chunks sharing at least one query term, ranked by the
    /// fraction of query terms they contain.
    pub fn rank_by_terms(query: &str, embeddings: &[Embedding]) -> Vec<usize> {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }
        let scores: Vec<f32> = embeddings
            .iter()
            .map(|emb| {
                let chunk_terms = Self::terms(&emb.text);
                let hits = query_terms.intersection(&chunk_terms).count();
                hits as f32 / query_terms.len() as f32
            })
            .collect();
        Self::order(&scores, |score| score > 0.0)
    }

    /// Reciprocal-rank fusion of several rankings.
    pub fn fuse(rankings: &[Vec<usize>]) -> Vec<usize> {
        let mut fused: HashMap<usize, f32> = HashMap::new();
        for ranking in rankings {
            for (rank, &idx) in ranking.iter().enumerate() {
                *fused.entry(idx).or_default() += 1.0 / (RRF_K + rank as f32 + 1.0);
            }
        }
        let mut items: Vec<(usize, f32)> = fused.into_iter().collect();
        items.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        items.into_iter().map(|(idx, _)| idx).collect()
    }

    /// Pick the context chunks for `mode`. `query_embedding` is only read by
    /// modes that use vector similarity.
    pub fn find_relevant_chunks<'a>(
        mode: QueryMode,
        query: &str,
        query_embedding: Option<&[f32]>,
        embeddings: &'a [Embedding],
        top_k: usize,
    ) -> Vec<&'a Embedding> {
        let by_vector = || {
            query_embedding
                .map(|q| Self::rank_by_vector(q, embeddings))
                .unwrap_or_default()
        };
        let ranking = match mode {
            QueryMode::Bypass => Vec::new(),
            QueryMode::Naive => by_vector(),
            QueryMode::Local => Self::rank_by_terms(query, embeddings),
            QueryMode::Global | QueryMode::Hybrid | QueryMode::Mix => {
                Self::fuse(&[by_vector(), Self::rank_by_terms(query, embeddings)])
            }
        };
        ranking
            .into_iter()
            .take(top_k)
            .map(|idx| &embeddings[idx])
            .collect()
    }

    /// Whether `mode` needs a query embedding.
    pub fn uses_vectors(mode: QueryMode) -> bool {
        !matches!(mode, QueryMode::Bypass | QueryMode::Local)
    }

    fn order(scores: &[f32], keep: impl Fn(f32) -> bool) -> Vec<usize> {
        let mut ranked: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, s)| keep(*s))
            .collect();
        ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        ranked.into_iter().map(|(idx, _)| idx).collect()
    }
}

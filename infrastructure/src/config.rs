use domain::error::DemoError;
use domain::ingestion::{
    EmbeddingSpec, IngestionConfig, ParseMethod, ParserKind, DEFAULT_EMBEDDING_DIM,
    DEFAULT_MAX_TOKEN_SIZE,
};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_WORKING_DIR: &str = "./rag_storage_vllm";
pub const DEFAULT_OUTPUT_DIR: &str = "./output_vllm";

/// Settings the demo takes from the environment rather than the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub working_dir: PathBuf,
    pub output_dir: PathBuf,
    pub parser: ParserKind,
    pub parse_method: ParseMethod,
    /// Falls back to the chat model when unset.
    pub embedding_model: Option<String>,
    pub embedding: EmbeddingSpec,
}

impl Config {
    pub fn load() -> Result<Self, DemoError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DemoError> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let parser = match value("RAG_PARSER") {
            Some(raw) => raw.parse()?,
            None => ParserKind::MinerU,
        };
        let parse_method = match value("RAG_PARSE_METHOD") {
            Some(raw) => raw.parse()?,
            None => ParseMethod::Auto,
        };
        let embedding_dim = parse_usize("EMBEDDING_DIM", value("EMBEDDING_DIM"), DEFAULT_EMBEDDING_DIM)?;
        let max_token_size = parse_usize(
            "MAX_EMBED_TOKEN_SIZE",
            value("MAX_EMBED_TOKEN_SIZE"),
            DEFAULT_MAX_TOKEN_SIZE,
        )?;

        Ok(Self {
            working_dir: value("RAG_WORKING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIR)),
            output_dir: value("RAG_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            parser,
            parse_method,
            embedding_model: value("VLLM_EMBEDDING_MODEL"),
            embedding: EmbeddingSpec::new(embedding_dim, max_token_size)?,
        })
    }

    pub fn ingestion_config(&self) -> Result<IngestionConfig, DemoError> {
        IngestionConfig::demo(self.working_dir.clone(), self.parser, self.parse_method)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            parser: ParserKind::MinerU,
            parse_method: ParseMethod::Auto,
            embedding_model: None,
            embedding: EmbeddingSpec::default(),
        }
    }
}

fn parse_usize(key: &str, raw: Option<String>, default: usize) -> Result<usize, DemoError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DemoError::invalid_config(format!("{key}='{raw}' is not a number"))),
    }
}

//! Settings handed to the RAG engine when it is constructed.

use crate::error::DemoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_EMBEDDING_DIM: usize = 768;
pub const DEFAULT_MAX_TOKEN_SIZE: usize = 8192;

/// Which document parser the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// External `mineru` executable (layout-aware, emits a content list).
    MinerU,
    /// In-process text extraction (pdf-extract, docx-rs, plain text).
    Builtin,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::MinerU => "mineru",
            ParserKind::Builtin => "builtin",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mineru" => Ok(ParserKind::MinerU),
            "builtin" => Ok(ParserKind::Builtin),
            other => Err(DemoError::invalid_config(format!(
                "unknown parser '{other}' (expected mineru or builtin)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMethod {
    #[default]
    Auto,
    Txt,
    Ocr,
}

impl ParseMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMethod::Auto => "auto",
            ParseMethod::Txt => "txt",
            ParseMethod::Ocr => "ocr",
        }
    }
}

impl fmt::Display for ParseMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMethod {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ParseMethod::Auto),
            "txt" => Ok(ParseMethod::Txt),
            "ocr" => Ok(ParseMethod::Ocr),
            other => Err(DemoError::invalid_config(format!(
                "unknown parse method '{other}' (expected auto, txt or ocr)"
            ))),
        }
    }
}

/// Immutable engine configuration. Build it through [`IngestionConfig::new`]
/// or [`IngestionConfig::demo`]; both validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionConfig {
    working_dir: PathBuf,
    parser: ParserKind,
    parse_method: ParseMethod,
    enable_image_processing: bool,
    enable_table_processing: bool,
    enable_equation_processing: bool,
}

impl IngestionConfig {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        parser: ParserKind,
        parse_method: ParseMethod,
        enable_image_processing: bool,
        enable_table_processing: bool,
        enable_equation_processing: bool,
    ) -> Result<Self, DemoError> {
        let working_dir = working_dir.into();
        if working_dir.as_os_str().is_empty() {
            return Err(DemoError::invalid_config("working directory must not be empty"));
        }
        Ok(Self {
            working_dir,
            parser,
            parse_method,
            enable_image_processing,
            enable_table_processing,
            enable_equation_processing,
        })
    }

    /// The demo's fixed modality policy: images off, tables and equations on.
    pub fn demo(
        working_dir: impl Into<PathBuf>,
        parser: ParserKind,
        parse_method: ParseMethod,
    ) -> Result<Self, DemoError> {
        Self::new(working_dir, parser, parse_method, false, true, true)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn parser(&self) -> ParserKind {
        self.parser
    }

    pub fn parse_method(&self) -> ParseMethod {
        self.parse_method
    }

    pub fn enable_image_processing(&self) -> bool {
        self.enable_image_processing
    }

    pub fn enable_table_processing(&self) -> bool {
        self.enable_table_processing
    }

    pub fn enable_equation_processing(&self) -> bool {
        self.enable_equation_processing
    }
}

/// Shape of the vectors the embedding adapter promises to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSpec {
    pub embedding_dim: usize,
    pub max_token_size: usize,
}

impl EmbeddingSpec {
    pub fn new(embedding_dim: usize, max_token_size: usize) -> Result<Self, DemoError> {
        if embedding_dim == 0 {
            return Err(DemoError::invalid_config("embedding_dim must be positive"));
        }
        if max_token_size == 0 {
            return Err(DemoError::invalid_config("max_token_size must be positive"));
        }
        Ok(Self {
            embedding_dim,
            max_token_size,
        })
    }
}

impl Default for EmbeddingSpec {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_token_size: DEFAULT_MAX_TOKEN_SIZE,
        }
    }
}

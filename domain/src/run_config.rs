use crate::error::DemoError;
use crate::ports::Endpoint;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-7B-Instruct";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/v1";
pub const DEFAULT_API_KEY: &str = "EMPTY";
pub const DEFAULT_QUERY: &str = "What is the summary of this document?";

/// Parameters of one demo invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    model: String,
    api_base: String,
    api_key: String,
    input_file: PathBuf,
    query: String,
}

impl RunConfig {
    pub fn new(
        model: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        input_file: impl Into<PathBuf>,
        query: impl Into<String>,
    ) -> Result<Self, DemoError> {
        let model = model.into();
        let api_base = api_base.into();
        let input_file = input_file.into();
        let query = query.into();

        if model.trim().is_empty() {
            return Err(DemoError::invalid_config("model name must not be empty"));
        }
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(DemoError::invalid_config(format!(
                "api base '{api_base}' must start with http:// or https://"
            )));
        }
        if input_file.as_os_str().is_empty() {
            return Err(DemoError::invalid_config("input file must not be empty"));
        }
        if query.trim().is_empty() {
            return Err(DemoError::invalid_config("query must not be empty"));
        }

        Ok(Self {
            model,
            api_base,
            api_key: api_key.into(),
            input_file,
            query,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Endpoint bound by the LLM adapter.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.model, &self.api_base, &self.api_key)
    }
}

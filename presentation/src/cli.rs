use application::demo_service::{DemoOptions, DemoService};
use application::fixture_service::{FixtureService, DEFAULT_FIXTURE_PATH};
use clap::Parser;
use colored::Colorize;
use domain::error::DemoError;
use domain::ports::{CompletionBackend, EmbeddingBackend, RagBackend};
use domain::run_config::{
    RunConfig, DEFAULT_API_BASE, DEFAULT_API_KEY, DEFAULT_MODEL, DEFAULT_QUERY,
};
use infrastructure::config::Config;
use infrastructure::openai_client::OpenAiClient;
use infrastructure::pdf_canvas::PdfCanvas;
use infrastructure::rag_engine::LocalRagBackend;
use shared::telemetry::Telemetry;
use shared::types::Result;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rag_vllm_demo")]
#[command(about = "Run RAG ingestion and a hybrid query against a vLLM server")]
pub struct Cli {
    /// Model name served by vLLM
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// vLLM API base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// vLLM API key
    #[arg(long, default_value = DEFAULT_API_KEY)]
    pub api_key: String,

    /// Path to the input PDF/document
    #[arg(long)]
    pub input_file: PathBuf,

    /// Question to ask about the document
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub query: String,
}

impl Cli {
    pub fn run_config(&self) -> std::result::Result<RunConfig, DemoError> {
        RunConfig::new(
            self.model.as_str(),
            self.api_base.as_str(),
            self.api_key.as_str(),
            self.input_file.as_path(),
            self.query.as_str(),
        )
    }
}

#[derive(Parser, Debug)]
#[command(name = "generate_fixture")]
#[command(about = "Write the single-page PDF used to validate document ingestion")]
pub struct FixtureCli {
    /// Where to write the PDF
    #[arg(default_value = DEFAULT_FIXTURE_PATH)]
    pub output: PathBuf,
}

pub struct CliApp {
    rag: Arc<dyn RagBackend>,
    completion: Arc<dyn CompletionBackend>,
    embeddings: Arc<dyn EmbeddingBackend>,
}

impl CliApp {
    pub fn new() -> Self {
        let client = Arc::new(OpenAiClient::new());
        Self::with_backends(Arc::new(LocalRagBackend), client.clone(), client)
    }

    pub fn with_backends(
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

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        let run = cli.run_config()?;
        let settings = Config::load()?;
        let options = DemoOptions {
            ingestion: settings.ingestion_config()?,
            output_dir: settings.output_dir.clone(),
            embedding_model: settings.embedding_model.clone(),
            embedding: settings.embedding,
        };

        println!("{}", "🚀 Starting RAG-Anything with vLLM Backend".bold());
        println!("   Model: {}", run.model().cyan());
        println!("   URL:   {}", run.api_base().cyan());
        println!("   Input: {}", run.input_file().display().to_string().cyan());

        let timer = Telemetry::new();
        let service = DemoService::new(
            self.rag.clone(),
            self.completion.clone(),
            self.embeddings.clone(),
        );
        let demo = service.prepare(&run, options)?;

        println!("\n{}", "[1] Ingesting Document...".yellow());
        demo.ingest().await?;

        println!("\n{}", format!("[2] Querying: '{}'", demo.query()).yellow());
        let answer = demo.answer().await?;

        let rule = "=".repeat(50);
        println!("\n{}", rule);
        println!("{}", "ANSWER FROM vLLM:".green().bold());
        println!("{}", answer);
        println!("{}\n", rule);

        tracing::info!(elapsed_ms = timer.elapsed_ms() as u64, "demo finished");
        Ok(())
    }

    pub fn generate_fixture(cli: &FixtureCli) -> Result<()> {
        FixtureService::generate::<PdfCanvas>(&cli.output)?;
        println!("Created {}", cli.output.display());
        Ok(())
    }

    /// Print a failure for the user.
    pub fn report_error(err: &anyhow::Error) {
        eprintln!("{}", diagnostic(err));
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing runtime dependencies get their error text and an install hint
/// instead of a bare error chain.
fn diagnostic(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DemoError>() {
        Some(DemoError::MissingDependency { name, reason }) => format!(
            "{}\n{}",
            format!("Error loading the RAG engine: `{}` is unavailable: {}", name, reason).red(),
            install_hint(name)
        ),
        _ => format!("{} {:#}", "Error:".red().bold(), err),
    }
}

fn install_hint(name: &str) -> String {
    match name {
        "mineru" => "Install MinerU (`pip install -U \"mineru[core]\"`) so `mineru` is on PATH, \
                     or set RAG_PARSER=builtin to use the built-in parser."
            .to_string(),
        other => format!("Make sure `{}` is installed and on PATH.", other),
    }
}

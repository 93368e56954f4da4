use application::demo_service::{DemoOptions, DemoService};
use domain::ingestion::{EmbeddingSpec, IngestionConfig, ParseMethod, ParserKind};
use domain::run_config::RunConfig;
use infrastructure::rag_engine::LocalRagBackend;
use std::sync::Arc;
use tests::{MockCompletion, MockEmbeddings};

const DIM: usize = 4;

fn toy_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    ["mineru", "vllm", "table", "status"]
        .iter()
        .map(|w| lower.matches(w).count() as f32)
        .collect()
}

#[tokio::test]
async fn builtin_parser_pipeline_answers_from_document_context() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.md");
    std::fs::write(
        &input,
        "The backend being used right now is vLLM.\n\n\
         | Component | Status |\n| MinerU Parser | Active |\n\n\
         ![layout](figures/layout.png)",
    )
    .unwrap();

    let mut embeddings = MockEmbeddings::new();
    embeddings
        .expect_embed()
        .withf(|req| req.model == "Qwen/Qwen2.5-7B-Instruct" && !req.texts.is_empty())
        .times(2)
        .returning(|req| Ok(req.texts.iter().map(|t| toy_vector(t)).collect()));

    let mut completion = MockCompletion::new();
    completion
        .expect_complete()
        .withf(|req| {
            req.system_prompt.is_some()
                && req.prompt.contains("MinerU Parser")
                && req.prompt.contains("Which backend is used?")
                && !req.prompt.contains("layout.png")
        })
        .times(1)
        .returning(|_| Ok("vLLM".to_string()));

    let run = RunConfig::new(
        "Qwen/Qwen2.5-7B-Instruct",
        "http://localhost:8000/v1",
        "EMPTY",
        input.as_path(),
        "Which backend is used?",
    )
    .unwrap();
    let options = DemoOptions {
        ingestion: IngestionConfig::demo(dir.path().join("rag"), ParserKind::Builtin, ParseMethod::Auto)
            .unwrap(),
        output_dir: dir.path().join("out"),
        embedding_model: None,
        embedding: EmbeddingSpec::new(DIM, 512).unwrap(),
    };

    let service = DemoService::new(
        Arc::new(LocalRagBackend),
        Arc::new(completion),
        Arc::new(embeddings),
    );
    let answer = service.run(&run, options).await.unwrap();

    assert_eq!(answer, "vLLM");
    assert!(dir.path().join("out").join("notes.md").is_file());
    assert!(dir.path().join("rag").join("rag_store.db").is_file());
}

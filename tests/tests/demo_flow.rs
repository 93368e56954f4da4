use clap::Parser;
use domain::error::DemoError;
use domain::ingestion::ParseMethod;
use domain::models::QueryMode;
use mockall::Sequence;
use presentation::cli::{Cli, CliApp};
use std::path::Path;
use std::sync::Arc;
use tests::{backend_with, offline_backends, MockBackend, MockEngine};

#[tokio::test]
async fn demo_ingests_the_input_then_asks_one_hybrid_question() {
    let mut seq = Sequence::new();
    let mut engine = MockEngine::new();
    engine
        .expect_process_document_complete()
        .withf(|file, _, method| file == Path::new("doc.pdf") && *method == ParseMethod::Auto)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(()));
    engine
        .expect_query()
        .withf(|q, mode| q == "Q?" && *mode == QueryMode::Hybrid)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok("summary".to_string()));

    let (completion, embeddings) = offline_backends();
    let mut app = CliApp::with_backends(Arc::new(backend_with(engine)), completion, embeddings);
    let cli = Cli::try_parse_from(["rag_vllm_demo", "--input-file", "doc.pdf", "--query", "Q?"])
        .unwrap();
    app.run(cli).await.unwrap();
}

#[test]
fn missing_input_file_is_a_usage_error() {
    let err = Cli::try_parse_from(["rag_vllm_demo", "--model", "m"]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("--input-file"));
}

#[tokio::test]
async fn missing_dependency_stops_before_engine_creation() {
    let mut backend = MockBackend::new();
    backend.expect_probe().times(1).returning(|_| {
        Err(DemoError::missing_dependency(
            "mineru",
            "No such file or directory (os error 2)",
        ))
    });
    backend.expect_create().never();

    let (completion, embeddings) = offline_backends();
    let mut app = CliApp::with_backends(Arc::new(backend), completion, embeddings);
    let cli = Cli::try_parse_from(["rag_vllm_demo", "--input-file", "doc.pdf"]).unwrap();
    let err = app.run(cli).await.unwrap_err();

    match err.downcast_ref::<DemoError>() {
        Some(DemoError::MissingDependency { reason, .. }) => {
            assert!(reason.contains("No such file or directory"))
        }
        other => panic!("expected a missing dependency, got {other:?}"),
    }
}

#[tokio::test]
async fn ingestion_failure_skips_the_query() {
    let mut engine = MockEngine::new();
    engine
        .expect_process_document_complete()
        .times(1)
        .returning(|_, _, _| Err(anyhow::anyhow!("Input file not found: doc.pdf")));
    engine.expect_query().never();

    let (completion, embeddings) = offline_backends();
    let mut app = CliApp::with_backends(Arc::new(backend_with(engine)), completion, embeddings);
    let cli = Cli::try_parse_from(["rag_vllm_demo", "--input-file", "doc.pdf"]).unwrap();
    let err = app.run(cli).await.unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

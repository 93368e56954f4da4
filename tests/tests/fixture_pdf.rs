use application::fixture_service::TITLE;
use infrastructure::pdf_canvas::PageSummary;
use lopdf::Document;
use presentation::cli::{CliApp, FixtureCli};

#[test]
fn fixture_pdf_has_title_table_and_rules() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("demo_data").join("test_doc.pdf");
    CliApp::generate_fixture(&FixtureCli {
        output: output.clone(),
    })
    .unwrap();

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let summary = PageSummary::read(&output).unwrap();
    assert_eq!(summary.page_count, 1);
    assert!(summary.strings.iter().any(|s| s == TITLE));
    for label in ["Component", "Status", "MinerU Parser", "vLLM Backend"] {
        assert_eq!(summary.strings.iter().filter(|s| *s == label).count(), 1, "{label}");
    }
    assert_eq!(summary.strings.iter().filter(|s| *s == "Active").count(), 2);

    let rules = summary.horizontal_rules();
    assert_eq!(rules.len(), 3);
    assert!(rules.iter().all(|(x1, _, x2, _)| *x1 == 72.0 && *x2 == 400.0));
}

#[test]
fn fixture_generation_fails_on_unwritable_target() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let err = CliApp::generate_fixture(&FixtureCli {
        output: blocker.join("test_doc.pdf"),
    });
    assert!(err.is_err());
}

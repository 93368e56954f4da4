use domain::ports::{Font, PageCanvas, PageSize, Rgb};
use shared::types::Result;
use std::path::Path;

pub const DEFAULT_FIXTURE_PATH: &str = "demo_data/test_doc.pdf";
pub const TITLE: &str = "RAG-Anything w/ vLLM Validation";

const BODY: &str = "
This is a validation document for the RAG-Anything system running with vLLM.

RAG-Anything is a framework that uses a Dual-Graph approach:
1. Semantic Graph: Connects concepts.
2. Structural Graph: Connects document layout elements.

The backend being used right now is vLLM, which provides an OpenAI-compatible API.
If you are reading this, the parsing step by Mineru was successful.
";

const MARGIN: f32 = 72.0;
const STATUS_COLUMN: f32 = 200.0;
const RULE_END: f32 = 400.0;
const LINE_STEP: f32 = 20.0;
const TABLE_GAP: f32 = 50.0;

pub const TABLE_ROWS: [(&str, &str); 2] = [("MinerU Parser", "Active"), ("vLLM Backend", "Active")];

/// Draws the single-page ingestion fixture: title, body text and a small
/// ruled status table.
pub struct FixtureService;

impl FixtureService {
    pub fn generate<C: PageCanvas>(path: &Path) -> Result<()> {
        let mut canvas = C::create(path, PageSize::LETTER)?;
        Self::draw(&mut canvas);
        canvas.save()?;
        tracing::info!(path = %path.display(), "fixture written");
        Ok(())
    }

    pub fn draw<C: PageCanvas>(canvas: &mut C) {
        let height = canvas.page_size().height;

        canvas.set_font(Font::HelveticaBold, 24.0);
        canvas.draw_string(MARGIN, height - 72.0, TITLE);

        canvas.set_font(Font::Helvetica, 12.0);
        let mut y = height - 120.0;
        for line in BODY.split('\n') {
            let line = line.trim();
            if !line.is_empty() {
                canvas.draw_string(MARGIN, y, line);
            }
            y -= LINE_STEP;
        }

        y -= TABLE_GAP;
        canvas.set_stroke_color(Rgb::BLACK);
        canvas.line(MARGIN, y, RULE_END, y);
        canvas.draw_string(MARGIN, y - 15.0, "Component");
        canvas.draw_string(STATUS_COLUMN, y - 15.0, "Status");
        canvas.line(MARGIN, y - 20.0, RULE_END, y - 20.0);
        let [(first_label, first_status), (second_label, second_status)] = TABLE_ROWS;
        canvas.draw_string(MARGIN, y - 35.0, first_label);
        canvas.draw_string(STATUS_COLUMN, y - 35.0, first_status);
        canvas.draw_string(MARGIN, y - 55.0, second_label);
        canvas.draw_string(STATUS_COLUMN, y - 55.0, second_status);
        canvas.line(MARGIN, y - 60.0, RULE_END, y - 60.0);
    }
}

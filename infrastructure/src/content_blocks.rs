//! Parsed document content, one entry per layout block, in the shape MinerU
//! writes to `<stem>_content_list.json`.

use anyhow::Context;
use domain::ingestion::IngestionConfig;
use serde::Deserialize;
use serde_json::Value;
use shared::types::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Table {
        #[serde(default)]
        table_body: String,
        #[serde(default)]
        table_caption: Vec<String>,
        #[serde(default)]
        table_footnote: Vec<String>,
    },
    Equation {
        text: String,
    },
    Image {
        #[serde(default)]
        img_path: String,
        #[serde(default)]
        img_caption: Vec<String>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
        }
    }

    /// Flatten to the text that gets chunked and embedded.
    pub fn render(&self) -> String {
        match self {
            ContentBlock::Text { text, .. } => text.trim().to_string(),
            ContentBlock::Table {
                table_body,
                table_caption,
                table_footnote,
                ..
            } => {
                let mut parts = vec!["TABLE:".to_string()];
                parts.extend(table_caption.iter().map(|c| c.trim().to_string()));
                parts.push(table_body.trim().to_string());
                parts.extend(table_footnote.iter().map(|f| f.trim().to_string()));
                join_non_empty(parts)
            }
            ContentBlock::Equation { text, .. } => format!("EQUATION: {}", text.trim()),
            ContentBlock::Image {
                img_path,
                img_caption,
                ..
            } => {
                let caption = img_caption.join(" ");
                if caption.trim().is_empty() {
                    format!("IMAGE: {}", img_path)
                } else {
                    format!("IMAGE: {} ({})", caption.trim(), img_path)
                }
            }
        }
    }
}

fn join_non_empty(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a MinerU content list. Block types this engine does not model are
/// skipped.
pub fn parse_content_list(json: &str) -> Result<Vec<ContentBlock>> {
    let raw: Vec<Value> = serde_json::from_str(json).context("Malformed content list")?;
    let mut blocks = Vec::with_capacity(raw.len());
    for item in raw {
        let kind = item
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        match serde_json::from_value::<ContentBlock>(item) {
            Ok(block) => blocks.push(block),
            Err(err) => tracing::debug!(kind = %kind, error = %err, "skipping content block"),
        }
    }
    Ok(blocks)
}

/// Split markdown-ish text into blocks: pipe tables, `$$` display math and
/// image references get their own kinds, everything else is text.
pub fn blocks_from_markdown(text: &str) -> Vec<ContentBlock> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|paragraph| {
            if paragraph.starts_with('|') {
                ContentBlock::Table {
                    table_body: paragraph.to_string(),
                    table_caption: Vec::new(),
                    table_footnote: Vec::new(),
                }
            } else if paragraph.len() > 4 && paragraph.starts_with("$$") && paragraph.ends_with("$$")
            {
                ContentBlock::Equation {
                    text: paragraph.to_string(),
                }
            } else if let Some(block) = image_reference(paragraph) {
                block
            } else {
                ContentBlock::text(paragraph)
            }
        })
        .collect()
}

fn image_reference(paragraph: &str) -> Option<ContentBlock> {
    let rest = paragraph.strip_prefix("![")?;
    let (alt, rest) = rest.split_once("](")?;
    let path = rest.strip_suffix(')')?;
    Some(ContentBlock::Image {
        img_path: path.to_string(),
        img_caption: if alt.is_empty() {
            Vec::new()
        } else {
            vec![alt.to_string()]
        },
    })
}

/// Drop blocks whose modality is switched off.
pub fn select(blocks: Vec<ContentBlock>, config: &IngestionConfig) -> Vec<ContentBlock> {
    blocks
        .into_iter()
        .filter(|block| match block {
            ContentBlock::Text { .. } => true,
            ContentBlock::Table { .. } => config.enable_table_processing(),
            ContentBlock::Equation { .. } => config.enable_equation_processing(),
            ContentBlock::Image { .. } => config.enable_image_processing(),
        })
        .collect()
}

pub fn document_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(ContentBlock::render)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ingestion::{ParseMethod, ParserKind};

    const CONTENT_LIST: &str = r#"[
        {"type": "text", "text": "RAG-Anything w/ vLLM Validation", "text_level": 1, "page_idx": 0},
        {"type": "image", "img_path": "images/a.jpg", "img_caption": ["Figure 1"], "page_idx": 0},
        {"type": "table", "table_body": "<table><tr><td>Component</td><td>Status</td></tr></table>",
         "table_caption": ["Backends"], "page_idx": 0},
        {"type": "equation", "text": "$$E = mc^2$$", "text_format": "latex", "page_idx": 0},
        {"type": "discarded", "text": "page header"}
    ]"#;

    #[test]
    fn content_list_skips_unknown_kinds() {
        let blocks = parse_content_list(CONTENT_LIST).unwrap();
        assert_eq!(blocks.len(), 4);
        assert!(matches!(blocks[0], ContentBlock::Text { .. }));
        assert!(matches!(blocks[1], ContentBlock::Image { .. }));
        assert!(matches!(blocks[2], ContentBlock::Table { .. }));
        assert!(matches!(blocks[3], ContentBlock::Equation { .. }));
    }

    #[test]
    fn malformed_content_list_is_an_error() {
        assert!(parse_content_list("{not json").is_err());
    }

    #[test]
    fn demo_policy_drops_images_keeps_tables_and_equations() {
        let config =
            IngestionConfig::demo("./store", ParserKind::MinerU, ParseMethod::Auto).unwrap();
        let selected = select(parse_content_list(CONTENT_LIST).unwrap(), &config);
        assert_eq!(selected.len(), 3);
        assert!(!selected
            .iter()
            .any(|b| matches!(b, ContentBlock::Image { .. })));

        let text = document_text(&selected);
        assert!(text.contains("TABLE:\nBackends\n<table>"));
        assert!(text.contains("EQUATION: $$E = mc^2$$"));
        assert!(!text.contains("IMAGE:"));
    }

    #[test]
    fn everything_off_leaves_plain_text() {
        let config = IngestionConfig::new(
            "./store",
            ParserKind::Builtin,
            ParseMethod::Auto,
            false,
            false,
            false,
        )
        .unwrap();
        let selected = select(parse_content_list(CONTENT_LIST).unwrap(), &config);
        assert_eq!(selected, vec![ContentBlock::text("RAG-Anything w/ vLLM Validation")]);
    }

    #[test]
    fn markdown_paragraphs_are_classified() {
        let md = "# Title\n\nPlain paragraph.\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n$$x^2$$\n\n![chart](img/c.png)\n\n";
        let blocks = blocks_from_markdown(md);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0], ContentBlock::text("# Title"));
        assert!(matches!(blocks[2], ContentBlock::Table { .. }));
        assert!(matches!(blocks[3], ContentBlock::Equation { .. }));
        assert_eq!(blocks[4].render(), "IMAGE: chart (img/c.png)");
    }
}

use anyhow::Context;
use domain::ports::{Font, PageCanvas, PageSize, Rgb};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use shared::types::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One-page PDF writer over lopdf. Operations are buffered and the document
/// is assembled on `save`.
pub struct PdfCanvas {
    path: PathBuf,
    size: PageSize,
    font: (Font, f32),
    font_names: BTreeMap<Font, String>,
    operations: Vec<Operation>,
}

impl PdfCanvas {
    fn font_resource(&mut self, font: Font) -> String {
        let next = format!("F{}", self.font_names.len() + 1);
        self.font_names.entry(font).or_insert(next).clone()
    }

    fn build_document(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for (font, name) in &self.font_names {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(name.as_bytes().to_vec(), font_id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
        });

        let content = Content {
            operations: self.operations.clone(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(self.size.width),
                Object::Real(self.size.height),
            ],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }
}

impl PageCanvas for PdfCanvas {
    fn create(path: &Path, size: PageSize) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            size,
            // Same default face and size as most PDF canvas libraries.
            font: (Font::Helvetica, 12.0),
            font_names: BTreeMap::new(),
            operations: Vec::new(),
        })
    }

    fn page_size(&self) -> PageSize {
        self.size
    }

    fn set_font(&mut self, font: Font, size: f32) {
        self.font = (font, size);
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.operations.push(Operation::new(
            "RG",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        ));
    }

    fn draw_string(&mut self, x: f32, y: f32, text: &str) {
        let (font, size) = self.font;
        let resource = self.font_resource(font);
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(resource.into_bytes()), Object::Real(size)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.operations.extend([
            Operation::new("m", vec![Object::Real(x1), Object::Real(y1)]),
            Operation::new("l", vec![Object::Real(x2), Object::Real(y2)]),
            Operation::new("S", vec![]),
        ]);
    }

    fn save(self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut doc = self.build_document()?;
        doc.save(&self.path)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), ops = self.operations.len(), "pdf written");
        Ok(())
    }
}

/// What a written page contains, read back from the content stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSummary {
    pub page_count: usize,
    pub strings: Vec<String>,
    /// `(x1, y1, x2, y2)` for each stroked `m`/`l` pair.
    pub segments: Vec<(f32, f32, f32, f32)>,
}

impl PageSummary {
    pub fn read(path: &Path) -> Result<Self> {
        let doc = Document::load(path)
            .with_context(|| format!("Failed to load PDF {}", path.display()))?;
        let pages = doc.get_pages();
        let mut summary = PageSummary {
            page_count: pages.len(),
            ..Default::default()
        };

        for (_, page_id) in pages {
            let content = Content::decode(&doc.get_page_content(page_id)?)?;
            let mut cursor: Option<(f32, f32)> = None;
            for op in content.operations {
                match op.operator.as_str() {
                    "Tj" => {
                        if let Some(Object::String(bytes, _)) = op.operands.first() {
                            summary.strings.push(String::from_utf8_lossy(bytes).into_owned());
                        }
                    }
                    "m" => cursor = point(&op.operands),
                    "l" => {
                        if let (Some((x1, y1)), Some((x2, y2))) = (cursor, point(&op.operands)) {
                            summary.segments.push((x1, y1, x2, y2));
                            cursor = Some((x2, y2));
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(summary)
    }

    /// Segments whose end points share a y coordinate.
    pub fn horizontal_rules(&self) -> Vec<(f32, f32, f32, f32)> {
        self.segments
            .iter()
            .copied()
            .filter(|(_, y1, _, y2)| (y1 - y2).abs() < f32::EPSILON)
            .collect()
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn point(operands: &[Object]) -> Option<(f32, f32)> {
    Some((number(operands.first()?)?, number(operands.get(1)?)?))
}

use crate::content_blocks::{blocks_from_markdown, parse_content_list, ContentBlock};
use anyhow::{anyhow, Context};
use docx_rs::{read_docx, DocumentChild};
use domain::error::DemoError;
use domain::ingestion::{ParseMethod, ParserKind};
use memmap2::Mmap;
use shared::types::Result;
use shared::utils::{document_stem, extension_of, is_supported_document};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

const MINERU_BIN: &str = "mineru";

/// Turns a source document into content blocks, leaving the parsed form in
/// the output directory.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParser {
    kind: ParserKind,
}

impl DocumentParser {
    pub fn new(kind: ParserKind) -> Self {
        Self { kind }
    }

    /// Check the parser's runtime requirements without touching any document.
    pub fn probe(kind: ParserKind) -> std::result::Result<(), DemoError> {
        match kind {
            ParserKind::Builtin => Ok(()),
            ParserKind::MinerU => {
                let output = Command::new(MINERU_BIN)
                    .arg("--version")
                    .output()
                    .map_err(|e| DemoError::missing_dependency(MINERU_BIN, e.to_string()))?;
                if output.status.success() {
                    Ok(())
                } else {
                    Err(DemoError::missing_dependency(
                        MINERU_BIN,
                        String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    ))
                }
            }
        }
    }

    pub async fn parse(
        &self,
        file_path: &Path,
        output_dir: &Path,
        method: ParseMethod,
    ) -> Result<Vec<ContentBlock>> {
        if !file_path.is_file() {
            return Err(anyhow!("Input file not found: {}", file_path.display()));
        }
        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        match self.kind {
            ParserKind::MinerU => parse_with_mineru(file_path, output_dir, method).await,
            ParserKind::Builtin => {
                let file = file_path.to_path_buf();
                let out = output_dir.to_path_buf();
                tokio::task::spawn_blocking(move || parse_builtin(&file, &out)).await?
            }
        }
    }
}

async fn parse_with_mineru(
    file_path: &Path,
    output_dir: &Path,
    method: ParseMethod,
) -> Result<Vec<ContentBlock>> {
    tracing::info!(file = %file_path.display(), method = %method, "running mineru");
    let output = tokio::process::Command::new(MINERU_BIN)
        .arg("-p")
        .arg(file_path)
        .arg("-o")
        .arg(output_dir)
        .arg("-m")
        .arg(method.as_str())
        .output()
        .await
        .with_context(|| format!("Failed to spawn {MINERU_BIN}"))?;
    if !output.status.success() {
        return Err(anyhow!(
            "{} failed ({}): {}",
            MINERU_BIN,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    let stem = document_stem(file_path);
    for dir in mineru_result_dirs(output_dir, &stem, method) {
        let content_list = dir.join(format!("{stem}_content_list.json"));
        if content_list.is_file() {
            let json = tokio::fs::read_to_string(&content_list).await?;
            return parse_content_list(&json);
        }
        let markdown = dir.join(format!("{stem}.md"));
        if markdown.is_file() {
            let text = tokio::fs::read_to_string(&markdown).await?;
            return Ok(blocks_from_markdown(&text));
        }
    }
    Err(anyhow!(
        "{} produced no output for {} under {}",
        MINERU_BIN,
        file_path.display(),
        output_dir.display()
    ))
}

/// Where MinerU may have put its results: the requested method first, then
/// the layouts other backends use.
fn mineru_result_dirs(output_dir: &Path, stem: &str, method: ParseMethod) -> Vec<PathBuf> {
    let base = output_dir.join(stem);
    let mut dirs = vec![base.join(method.as_str())];
    for other in ["auto", "vlm", "txt", "ocr"] {
        let dir = base.join(other);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs.push(base);
    dirs
}

fn parse_builtin(file_path: &Path, output_dir: &Path) -> Result<Vec<ContentBlock>> {
    if !is_supported_document(file_path) {
        return Err(DemoError::UnsupportedDocument(format!(
            "{} (builtin parser reads pdf, docx, md and txt)",
            file_path.display()
        ))
        .into());
    }

    let text = match extension_of(file_path).as_str() {
        "pdf" => pdf_extract::extract_text(file_path)
            .map_err(|e| anyhow!("Error extracting text from PDF '{}': {}", file_path.display(), e))?,
        "docx" => extract_docx(file_path)?,
        _ => {
            let file = File::open(file_path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            // Lossy conversion keeps stray non-UTF8 bytes from aborting ingestion.
            String::from_utf8_lossy(&mmap).into_owned()
        }
    };
    let text = normalize_lines(&text);

    let markdown_path = parsed_copy_path(file_path, output_dir);
    std::fs::write(&markdown_path, &text)
        .with_context(|| format!("Failed to write {}", markdown_path.display()))?;
    tracing::debug!(path = %markdown_path.display(), bytes = text.len(), "builtin parse written");

    Ok(blocks_from_markdown(&text))
}

/// `<stem>.md` in the output directory, or `<stem>.parsed.md` when that
/// would be the input itself.
fn parsed_copy_path(file_path: &Path, output_dir: &Path) -> PathBuf {
    let stem = document_stem(file_path);
    let candidate = output_dir.join(format!("{stem}.md"));
    let is_input = match (std::fs::canonicalize(&candidate), std::fs::canonicalize(file_path)) {
        (Ok(target), Ok(input)) => target == input,
        _ => false,
    };
    if is_input {
        output_dir.join(format!("{stem}.parsed.md"))
    } else {
        candidate
    }
}

fn extract_docx(file_path: &Path) -> Result<String> {
    let bytes = std::fs::read(file_path)?;
    let docx = read_docx(&bytes)
        .map_err(|e| anyhow!("Error parsing DOCX '{}': {}", file_path.display(), e))?;
    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => paragraphs.push(p.raw_text()),
            DocumentChild::Table(_) => {
                tracing::warn!(file = %file_path.display(), "docx table skipped by builtin parser")
            }
            _ => {}
        }
    }
    Ok(paragraphs.join("\n\n"))
}

/// Trim each line and collapse runs of blank lines to one paragraph break.
fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}

use std::path::Path;

/// Lowercased file extension, empty when absent.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub fn is_supported_document(path: &Path) -> bool {
    matches!(
        extension_of(path).as_str(),
        "pdf" | "docx" | "md" | "txt" | "markdown"
    )
}

/// File stem used to name parser output, `document` when the path has none.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}

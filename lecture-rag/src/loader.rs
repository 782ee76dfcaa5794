//! Loading source documents from a directory.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Turns a file into plain text.
///
/// PDF and other binary formats are handled by implementations outside this
/// crate.
pub trait TextExtractor: Send + Sync {
    /// Whether this extractor handles `path`.
    fn accepts(&self, path: &Path) -> bool;

    /// Extract the text of `path`.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Reads `.txt` and `.md` files as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"))
    }

    fn extract(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }
}

/// Load every accepted file directly inside `dir`, sorted by file name.
///
/// Files the extractor fails on, and files with no text, are logged and
/// skipped. Subdirectories are not descended into.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `dir` is not a directory.
pub fn load_documents(
    dir: impl AsRef<Path>,
    extractor: &dyn TextExtractor,
) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(RagError::ConfigError(format!(
            "document directory {} does not exist",
            dir.display()
        )));
    }

    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| extractor.accepts(entry.path()));

    let mut documents = Vec::new();
    for entry in files {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let text = match extractor.extract(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(document = %name, error = %e, "text extraction failed; document skipped");
                continue;
            }
        };
        let text = text.trim();
        if text.is_empty() {
            debug!(document = %name, "document has no text; skipped");
            continue;
        }
        documents.push(Document::new(name, text));
    }

    info!(dir = %dir.display(), documents = documents.len(), "loaded documents");
    Ok(documents)
}

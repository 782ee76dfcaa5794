//! Source-attributed context assembly for downstream prompts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::document::RetrievalResult;

/// Source name used for passages that carry none.
pub const DEFAULT_SOURCE_NAME: &str = "unknown_document.pdf";

const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// A piece of retrieved text and the document it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextPassage {
    pub text: String,
    pub source: Option<String>,
}

impl ContextPassage {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { text: text.into(), source: Some(source.into()) }
    }

    /// A passage with no known source.
    pub fn unattributed(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: None }
    }

    /// The source name, or [`DEFAULT_SOURCE_NAME`].
    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or(DEFAULT_SOURCE_NAME)
    }
}

impl From<RetrievalResult> for ContextPassage {
    fn from(result: RetrievalResult) -> Self {
        Self { text: result.text, source: Some(result.doc_name) }
    }
}

impl From<&RetrievalResult> for ContextPassage {
    fn from(result: &RetrievalResult) -> Self {
        Self { text: result.text.clone(), source: Some(result.doc_name.clone()) }
    }
}

/// Render passages as `[SOURCE: name]` blocks separated by `---` rules.
///
/// ```
/// use lecture_rag::{ContextPassage, format_context};
///
/// let context = format_context(&[
///     ContextPassage::new("Backpropagation computes gradients.", "nn.pdf"),
///     ContextPassage::unattributed("Loss goes down."),
/// ]);
/// assert_eq!(
///     context,
///     "[SOURCE: nn.pdf]\nBackpropagation computes gradients.\n\n---\n\n\
///      [SOURCE: unknown_document.pdf]\nLoss goes down."
/// );
/// ```
pub fn format_context(passages: &[ContextPassage]) -> String {
    passages
        .iter()
        .map(|p| format!("[SOURCE: {}]\n{}", p.source_name(), p.text))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

/// Sorted, de-duplicated source names of `passages`.
pub fn unique_sources(passages: &[ContextPassage]) -> Vec<String> {
    passages
        .iter()
        .map(|p| p.source_name())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

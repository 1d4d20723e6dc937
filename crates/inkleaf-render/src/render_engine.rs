use core::fmt;
use std::sync::Arc;

use inkleaf::{AssetSet, DiagramIndex, Document, DocumentError};

use crate::render_ir::{RenderPage, ResolvedTextStyle};
use crate::render_layout::{LayoutConfig, LayoutEngine, TextMeasurer};

/// Errors that abort generation before any page is emitted.
///
/// Partial output is never returned: validation runs first, and directive
/// leniency (unknown assets, malformed tokens) is handled below this level
/// without ever escalating.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// Input text is blank or whitespace-only.
    EmptyInput,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "nothing to render: input text is empty"),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<DocumentError> for GenerateError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::EmptyInput => Self::EmptyInput,
        }
    }
}

/// One-shot generation pipeline: validate, index, wrap, paginate.
///
/// Stateless between calls; identical inputs produce identical pages.
#[derive(Clone, Default)]
pub struct RenderEngine {
    measurer: Option<Arc<dyn TextMeasurer>>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a shared glyph-accurate measurer. Without one the engine
    /// falls back to the heuristic measurer.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    /// Generate the page sequence for one document.
    ///
    /// `directives` is the raw diagram-directive text; `assets` the uploaded
    /// diagram set. Returns at least one page on success.
    pub fn generate(
        &self,
        document: &Document,
        directives: &str,
        assets: &AssetSet,
    ) -> Result<Vec<RenderPage>, GenerateError> {
        document.validate()?;

        let style = ResolvedTextStyle {
            size_px: document.font_size,
            color: document.color,
        };
        let index = DiagramIndex::parse(directives, assets);
        let mut engine = LayoutEngine::new(LayoutConfig::new(document.geometry));
        if let Some(measurer) = self.measurer.clone() {
            engine = engine.with_text_measurer(measurer);
        }

        let lines = engine.wrap(&document.text, &style);
        if lines.is_empty() {
            // split_whitespace found no words; same user-facing condition
            // as blank text.
            return Err(GenerateError::EmptyInput);
        }

        let pages = engine.paginate(&lines, &style, &index, assets);
        log::debug!(
            "generated {} page(s) from {} line(s), {} diagram placement(s)",
            pages.len(),
            lines.len(),
            index.placement_count()
        );
        Ok(pages)
    }
}

impl fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngine")
            .field("has_text_measurer", &self.measurer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_aborts_with_zero_pages() {
        let engine = RenderEngine::new();
        let result = engine.generate(&Document::new(""), "", &AssetSet::new());
        assert_eq!(result, Err(GenerateError::EmptyInput));
    }

    #[test]
    fn short_text_produces_exactly_one_page() {
        let engine = RenderEngine::new();
        let pages = engine
            .generate(&Document::new("hello world"), "", &AssetSet::new())
            .expect("generation");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].metrics.line_count, 1);
    }

    #[test]
    fn generation_is_deterministic() {
        let engine = RenderEngine::new();
        let doc = Document::new("repeatable output for identical inputs, page after page");
        let first = engine.generate(&doc, "", &AssetSet::new()).expect("first");
        let second = engine.generate(&doc, "", &AssetSet::new()).expect("second");
        assert_eq!(first, second);
    }
}

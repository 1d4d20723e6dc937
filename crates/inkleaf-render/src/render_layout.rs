use std::sync::Arc;

use inkleaf::{AssetSet, DiagramIndex, PageGeometry};
use serde::{Deserialize, Serialize};

use crate::render_ir::{
    DrawCommand, ImageCommand, RenderPage, ResolvedTextStyle, TextCommand,
};

/// Text measurement hook for glyph-accurate line fitting.
///
/// `measure_text_px` returns the tight `(width, height)` bounding box of
/// `text` rendered in `style`, both non-negative. Implementations must be
/// pure: the wrapper queries prefixes of the same line repeatedly and the
/// paginator re-measures committed lines.
pub trait TextMeasurer: Send + Sync {
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> (f32, f32);
}

/// Deterministic measurer used when no font face is installed.
///
/// Per-glyph em-width classes beat a single scalar across sizes; height is
/// one em. Layout tests run against this so they need no font fixtures.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let em_sum: f32 = text.chars().map(glyph_em_width).sum();
        (em_sum * style.size_px, style.size_px)
    }
}

fn glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' => 0.30,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 0.32,
        'f' | 'r' | 't' | '(' | ')' | '[' | ']' | '-' => 0.40,
        'm' | 'w' => 0.85,
        'M' | 'W' => 0.95,
        c if c.is_ascii_uppercase() => 0.72,
        c if c.is_ascii_digit() => 0.55,
        _ => 0.52,
    }
}

/// One wrapped, width-bounded segment of the input text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogicalLine {
    /// Words joined by single spaces, in input order.
    pub text: String,
    /// Measured width of `text` (no trailing space).
    pub width_px: f32,
}

/// Greedy single-pass word wrap against `content_width`.
///
/// Pure function: words in, lines out, no state escapes. Each candidate is
/// measured with its trailing space still attached, matching the source
/// behavior so break points are identical. A word wider than the content
/// width is never split; the width check only gates *adding* a word to a
/// non-empty accumulator, so a lone oversized word lands on its own line
/// and is allowed to overflow.
///
/// Empty or whitespace-only input yields zero lines; callers surface that
/// as an input error rather than rendering a blank page.
pub fn wrap_text(
    text: &str,
    style: &ResolvedTextStyle,
    content_width: f32,
    measurer: &dyn TextMeasurer,
) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut acc = String::new();

    let commit = |line: &str, lines: &mut Vec<LogicalLine>| {
        let (width_px, _) = measurer.measure_text_px(line, style);
        lines.push(LogicalLine {
            text: line.to_string(),
            width_px,
        });
    };

    for word in text.split_whitespace() {
        let candidate = if acc.is_empty() {
            word.to_string()
        } else {
            format!("{acc} {word}")
        };
        let probe = format!("{candidate} ");
        let (candidate_width, _) = measurer.measure_text_px(&probe, style);
        if candidate_width <= content_width {
            acc = candidate;
        } else {
            if !acc.is_empty() {
                commit(&acc, &mut lines);
            }
            acc = word.to_string();
        }
    }
    if !acc.is_empty() {
        commit(&acc, &mut lines);
    }
    lines
}

/// Layout configuration for page construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Page geometry shared by every emitted page.
    pub geometry: PageGeometry,
}

impl LayoutConfig {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    fn content_width(&self) -> f32 {
        self.geometry.content_width() as f32
    }

    fn content_bottom(&self) -> f32 {
        self.geometry.content_bottom() as f32
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
        }
    }
}

/// Deterministic paginator that emits render pages.
///
/// Walks the wrapped lines top to bottom with a 1-based counter; diagrams
/// bound to a line are placed strictly before its text, in declaration
/// order. Any element that would push the cursor past the bottom margin
/// seals the page first. The in-progress page is sealed unconditionally at
/// the end, so any non-empty input produces at least one page.
#[derive(Clone)]
pub struct LayoutEngine {
    cfg: LayoutConfig,
    measurer: Arc<dyn TextMeasurer>,
}

impl core::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutEngine").field("cfg", &self.cfg).finish()
    }
}

impl LayoutEngine {
    /// Create an engine with the heuristic measurer.
    pub fn new(cfg: LayoutConfig) -> Self {
        Self {
            cfg,
            measurer: Arc::new(HeuristicTextMeasurer),
        }
    }

    /// Install a shared text measurer for glyph-accurate fitting.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Wrap `text` against this engine's content width.
    pub fn wrap(&self, text: &str, style: &ResolvedTextStyle) -> Vec<LogicalLine> {
        wrap_text(text, style, self.cfg.content_width(), self.measurer.as_ref())
    }

    /// Paginate wrapped lines and their diagram placements into pages.
    pub fn paginate(
        &self,
        lines: &[LogicalLine],
        style: &ResolvedTextStyle,
        index: &DiagramIndex,
        assets: &AssetSet,
    ) -> Vec<RenderPage> {
        let mut st = LayoutState::new(self.cfg);
        let gap = style.line_gap_px();

        for (i, line) in lines.iter().enumerate() {
            let line_no = (i + 1) as u32;
            for &asset_id in index.assets_for_line(line_no) {
                let Some(asset) = assets.get(asset_id) else {
                    continue;
                };
                let (width, height) =
                    fit_to_content_width(asset.width, asset.height, self.cfg.content_width());
                st.ensure_fits(height as f32);
                st.page.push_command(DrawCommand::Image(ImageCommand {
                    asset: asset_id,
                    name: asset.name.clone(),
                    x: self.cfg.geometry.margin,
                    y: st.cursor_y.round() as i32,
                    width,
                    height,
                }));
                st.cursor_y += height as f32 + gap;
            }

            let (_, text_height) = self.measurer.measure_text_px(&line.text, style);
            st.ensure_fits(text_height);
            st.page.push_command(DrawCommand::Text(TextCommand {
                x: self.cfg.geometry.margin,
                y: st.cursor_y.round() as i32,
                text: line.text.clone(),
                style: *style,
            }));
            st.cursor_y += text_height + gap;
        }

        st.into_pages()
    }
}

/// Uniform downscale to the content width, aspect ratio preserved.
///
/// Assets at or under the content width keep their intrinsic size.
fn fit_to_content_width(width: u32, height: u32, content_width: f32) -> (u32, u32) {
    let w = width as f32;
    if w <= content_width || width == 0 {
        return (width, height);
    }
    let scale = content_width / w;
    let scaled_height = (height as f32 * scale).round().max(1.0) as u32;
    (content_width as u32, scaled_height)
}

struct LayoutState {
    cfg: LayoutConfig,
    page_no: usize,
    cursor_y: f32,
    page: RenderPage,
    emitted: Vec<RenderPage>,
}

impl LayoutState {
    fn new(cfg: LayoutConfig) -> Self {
        Self {
            cfg,
            page_no: 1,
            cursor_y: cfg.geometry.start_offset as f32,
            page: RenderPage::new(1),
            emitted: Vec::with_capacity(2),
        }
    }

    /// Seal the page first when `element_height` would cross the bottom
    /// margin. An oversized element on a fresh page is placed anyway; it
    /// can only overflow, never loop.
    fn ensure_fits(&mut self, element_height: f32) {
        if self.cursor_y + element_height > self.cfg.content_bottom() {
            self.start_next_page();
        }
    }

    fn start_next_page(&mut self) {
        self.flush_page_if_non_empty();
        self.cursor_y = self.cfg.geometry.start_offset as f32;
    }

    fn flush_page_if_non_empty(&mut self) {
        if self.page.is_empty() {
            return;
        }
        self.page_no += 1;
        let page = core::mem::replace(&mut self.page, RenderPage::new(self.page_no));
        self.emitted.push(page);
    }

    /// Seal the in-progress page unconditionally and return all pages.
    fn into_pages(mut self) -> Vec<RenderPage> {
        if !self.page.is_empty() || self.emitted.is_empty() {
            self.emitted.push(self.page);
        }
        self.emitted
    }
}

//! Render IR and layout engine for `inkleaf`.
//!
//! The layout engine turns a [`inkleaf::Document`] plus diagram directives
//! into backend-agnostic [`RenderPage`] command lists. Text width fitting
//! goes through the [`TextMeasurer`] contract so the same engine runs
//! against a glyph-accurate backend or the built-in heuristic.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod render_engine;
mod render_ir;
mod render_layout;

pub use render_engine::{GenerateError, RenderEngine};
pub use render_ir::{
    DrawCommand, ImageCommand, PageMetrics, RenderPage, ResolvedTextStyle, TextCommand,
};
pub use render_layout::{
    wrap_text, HeuristicTextMeasurer, LayoutConfig, LayoutEngine, LogicalLine, TextMeasurer,
};

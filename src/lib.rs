//! Core document model for `inkleaf`.
//!
//! This crate holds the pure data side of the pipeline: the [`Document`]
//! (input text plus pen and page settings), the uploaded [`DiagramAsset`]
//! set, and the [`DiagramIndex`] that binds assets to 1-based wrapped-line
//! indices. Layout lives in `inkleaf-render`; drawing lives in the raster
//! backend crate. Nothing here touches pixels.

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

mod directives;
mod document;

pub use directives::{AssetId, AssetSet, DiagramAsset, DiagramIndex};
pub use document::{Document, DocumentError, PageGeometry, PenColor};

//! tiny-skia raster backend for `inkleaf-render` pages.
//!
//! Supplies the glyph-accurate [`FaceMeasurer`] the layout engine fits text
//! with, decodes uploaded diagrams, rasterizes sealed pages onto white
//! canvases, and PNG-encodes the result. Layout decisions stay upstream in
//! `inkleaf-render`; this crate only puts pixels where commands say.

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

mod fonts;
mod raster;

pub use fonts::{resolve_font, FaceMeasurer, FontError, FontFace, FontSource};
pub use raster::{
    decode_assets, encode_png, render_document, DecodedAssets, PageRasterizer, RasterError,
    RenderDocumentError,
};

use std::io::Cursor;

use inkleaf::Document;
use inkleaf_render::GenerateError;
use inkleaf_tiny_skia::{render_document, FontFace, RasterError, RenderDocumentError};

/// Bundled face, so these tests run on fontless machines too.
fn fixture_face() -> FontFace {
    let bytes = include_bytes!("fixtures/DejaVuSansMono.ttf");
    FontFace::from_bytes(bytes.to_vec()).expect("fixture face parses")
}

fn png_upload(name: &str, width: u32, height: u32) -> (String, Vec<u8>) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 255, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode fixture");
    (name.to_string(), out.into_inner())
}

#[test]
fn full_pipeline_renders_ink_on_white_pages() {
    let face = fixture_face();
    let doc = Document::new("hello world from the handwriting pipeline");
    let uploads = vec![png_upload("figure.png", 300, 200)];
    let canvases =
        render_document(&doc, "figure.png:1", &uploads, face).expect("render");

    assert!(!canvases.is_empty());
    let first = &canvases[0];
    assert_eq!(first.width(), 1240);
    assert_eq!(first.height(), 1754);

    let mut saw_ink = false;
    let mut saw_blue = false;
    for px in first.pixels() {
        let c = px.demultiply();
        if (c.red(), c.green(), c.blue()) != (255, 255, 255) {
            saw_ink = true;
        }
        if c.blue() > 200 && c.red() < 60 {
            saw_blue = true;
        }
    }
    assert!(saw_ink, "glyphs must leave non-white pixels");
    assert!(saw_blue, "the pasted diagram must be visible");
}

#[test]
fn empty_text_aborts_before_rasterization() {
    let err = render_document(&Document::new("   "), "", &[], fixture_face())
        .expect_err("blank input must fail");
    assert_eq!(
        err,
        RenderDocumentError::Generate(GenerateError::EmptyInput)
    );
}

#[test]
fn undecodable_upload_aborts_before_any_page() {
    let uploads = vec![("broken.png".to_string(), b"not an image".to_vec())];
    let err = render_document(
        &Document::new("some text"),
        "broken.png:1",
        &uploads,
        fixture_face(),
    )
    .expect_err("bad upload must fail");
    assert_eq!(
        err,
        RenderDocumentError::Raster(RasterError::AssetDecode {
            name: "broken.png".to_string()
        })
    );
}

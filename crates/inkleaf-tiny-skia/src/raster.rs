use core::fmt;
use std::sync::Arc;

use inkleaf::{AssetSet, DiagramAsset, Document, PageGeometry};
use inkleaf_render::{
    DrawCommand, GenerateError, ImageCommand, RenderEngine, RenderPage, TextCommand,
};
use tiny_skia::{
    Color, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Transform,
};
use ttf_parser::{Face, OutlineBuilder};

use crate::fonts::{FaceMeasurer, FontFace};

/// Raster-side errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RasterError {
    /// An uploaded diagram could not be decoded as an image. Fatal for the
    /// request; raised before pagination begins.
    AssetDecode { name: String },
    /// Canvas allocation failed (zero or absurd dimensions).
    Canvas { width: u32, height: u32 },
    /// PNG encoding failed.
    PngEncode(String),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetDecode { name } => {
                write!(f, "uploaded diagram {name:?} could not be decoded")
            }
            Self::Canvas { width, height } => {
                write!(f, "cannot allocate a {width}x{height} canvas")
            }
            Self::PngEncode(msg) => write!(f, "png encoding failed: {msg}"),
        }
    }
}

impl std::error::Error for RasterError {}

/// Decoded diagram pixel data, parallel to the generation's [`AssetSet`].
#[derive(Clone, Debug, Default)]
pub struct DecodedAssets {
    pixmaps: Vec<Pixmap>,
}

impl DecodedAssets {
    pub fn get(&self, id: usize) -> Option<&Pixmap> {
        self.pixmaps.get(id)
    }

    pub fn len(&self) -> usize {
        self.pixmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixmaps.is_empty()
    }
}

/// Decode every upload up front.
///
/// Any failure aborts the request before layout starts; pages are never
/// produced from a partially decoded asset set. Re-uploads under the same
/// name replace both the metadata entry and the pixels.
pub fn decode_assets(
    uploads: &[(String, Vec<u8>)],
) -> Result<(AssetSet, DecodedAssets), RasterError> {
    let mut set = AssetSet::new();
    let mut pixmaps: Vec<Pixmap> = Vec::with_capacity(uploads.len());
    for (name, bytes) in uploads {
        let decoded = image::load_from_memory(bytes).map_err(|err| {
            log::error!("diagram {name:?} failed to decode: {err}");
            RasterError::AssetDecode { name: name.clone() }
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixmap = pixmap_from_rgba(width, height, rgba.as_raw())
            .ok_or(RasterError::Canvas { width, height })?;
        let id = set.insert(DiagramAsset {
            name: name.clone(),
            width,
            height,
        });
        if id < pixmaps.len() {
            pixmaps[id] = pixmap;
        } else {
            pixmaps.push(pixmap);
        }
    }
    Ok((set, DecodedAssets { pixmaps }))
}

fn pixmap_from_rgba(width: u32, height: u32, data: &[u8]) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    for (px, chunk) in pixmap.pixels_mut().iter_mut().zip(data.chunks_exact(4)) {
        *px = tiny_skia::ColorU8::from_rgba(chunk[0], chunk[1], chunk[2], chunk[3]).premultiply();
    }
    Some(pixmap)
}

/// Thin drawing layer: text and diagram pixels onto a white page canvas.
///
/// All positions come from the layout commands; nothing here makes layout
/// decisions.
#[derive(Clone, Debug)]
pub struct PageRasterizer {
    face: FontFace,
    geometry: PageGeometry,
}

impl PageRasterizer {
    pub fn new(face: FontFace, geometry: PageGeometry) -> Self {
        Self { face, geometry }
    }

    /// Rasterize one sealed page.
    pub fn rasterize(
        &self,
        page: &RenderPage,
        assets: &DecodedAssets,
    ) -> Result<Pixmap, RasterError> {
        let width = self.geometry.page_width.max(1) as u32;
        let height = self.geometry.page_height.max(1) as u32;
        let mut canvas = Pixmap::new(width, height)
            .ok_or(RasterError::Canvas { width, height })?;
        canvas.fill(Color::WHITE);

        for cmd in &page.commands {
            match cmd {
                DrawCommand::Text(text) => self.draw_text(&mut canvas, text),
                DrawCommand::Image(image) => draw_image(&mut canvas, image, assets),
            }
        }
        Ok(canvas)
    }

    fn draw_text(&self, canvas: &mut Pixmap, cmd: &TextCommand) {
        let Ok(face) = Face::parse(self.face.data_ref(), 0) else {
            return;
        };
        let units = f32::from(face.units_per_em().max(1));
        let scale = cmd.style.size_px / units;
        let baseline_y = cmd.y as f32 + self.face.ascent_px(cmd.style.size_px);

        let mut paint = Paint::default();
        paint.set_color_rgba8(cmd.style.color.r, cmd.style.color.g, cmd.style.color.b, 255);
        paint.anti_alias = true;

        let mut pen_x = cmd.x as f32;
        for ch in cmd.text.chars() {
            let Some(gid) = face.glyph_index(ch) else {
                pen_x += cmd.style.size_px * 0.5;
                continue;
            };
            let mut builder = GlyphPathBuilder::new(pen_x, baseline_y, scale);
            if face.outline_glyph(gid, &mut builder).is_some() {
                if let Some(path) = builder.finish() {
                    canvas.fill_path(
                        &path,
                        &paint,
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            let adv = face.glyph_hor_advance(gid).unwrap_or(0);
            pen_x += if adv > 0 {
                f32::from(adv) * scale
            } else {
                cmd.style.size_px * 0.5
            };
        }
    }
}

fn draw_image(canvas: &mut Pixmap, cmd: &ImageCommand, assets: &DecodedAssets) {
    let Some(src) = assets.get(cmd.asset) else {
        log::warn!("image command for unknown asset id {}", cmd.asset);
        return;
    };
    if cmd.width == 0 || cmd.height == 0 || src.width() == 0 || src.height() == 0 {
        return;
    }
    let sx = cmd.width as f32 / src.width() as f32;
    let sy = cmd.height as f32 / src.height() as f32;
    let transform = Transform::from_row(sx, 0.0, 0.0, sy, cmd.x as f32, cmd.y as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
}

/// Builds glyph outlines into a `tiny-skia` path, flipping the font's
/// y-up coordinates into canvas y-down space around the baseline.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(
            self.origin_x + x1 * self.scale,
            self.origin_y - y1 * self.scale,
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.origin_x + x1 * self.scale,
            self.origin_y - y1 * self.scale,
            self.origin_x + x2 * self.scale,
            self.origin_y - y2 * self.scale,
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// PNG-encode one page canvas.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RasterError> {
    pixmap
        .encode_png()
        .map_err(|err| RasterError::PngEncode(err.to_string()))
}

/// Full-pipeline errors for [`render_document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderDocumentError {
    Generate(GenerateError),
    Raster(RasterError),
}

impl fmt::Display for RenderDocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate(err) => err.fmt(f),
            Self::Raster(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RenderDocumentError {}

impl From<GenerateError> for RenderDocumentError {
    fn from(err: GenerateError) -> Self {
        Self::Generate(err)
    }
}

impl From<RasterError> for RenderDocumentError {
    fn from(err: RasterError) -> Self {
        Self::Raster(err)
    }
}

/// Decode, lay out, and rasterize one document end to end.
///
/// Asset decoding runs first so an undecodable upload aborts before any
/// page exists. Returns one canvas per sealed page, in order.
pub fn render_document(
    document: &Document,
    directives: &str,
    uploads: &[(String, Vec<u8>)],
    face: FontFace,
) -> Result<Vec<Pixmap>, RenderDocumentError> {
    let (assets, decoded) = decode_assets(uploads)?;
    let engine =
        RenderEngine::new().with_text_measurer(Arc::new(FaceMeasurer::new(face.clone())));
    let pages = engine.generate(document, directives, &assets)?;
    let rasterizer = PageRasterizer::new(face, document.geometry);
    let mut canvases = Vec::with_capacity(pages.len());
    for page in &pages {
        canvases.push(rasterizer.rasterize(page, &decoded)?);
    }
    Ok(canvases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("encode fixture");
        out.into_inner()
    }

    #[test]
    fn decode_assets_records_intrinsic_size() {
        let uploads = vec![("dot.png".to_string(), png_bytes(3, 2, [255, 0, 0, 255]))];
        let (set, decoded) = decode_assets(&uploads).expect("decode");
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(0).map(|a| (a.width, a.height)),
            Some((3, 2))
        );
        assert_eq!(decoded.get(0).map(|p| (p.width(), p.height())), Some((3, 2)));
    }

    #[test]
    fn undecodable_upload_is_fatal() {
        let uploads = vec![("broken.png".to_string(), vec![0u8; 16])];
        let err = decode_assets(&uploads).expect_err("must fail");
        assert_eq!(
            err,
            RasterError::AssetDecode {
                name: "broken.png".to_string()
            }
        );
    }

    #[test]
    fn reupload_replaces_pixels_in_place() {
        let uploads = vec![
            ("a.png".to_string(), png_bytes(2, 2, [0, 0, 0, 255])),
            ("a.png".to_string(), png_bytes(5, 4, [0, 255, 0, 255])),
        ];
        let (set, decoded) = decode_assets(&uploads).expect("decode");
        assert_eq!(set.len(), 1);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get(0).map(|p| p.width()), Some(5));
    }

    #[test]
    fn draw_image_scales_into_the_target_rect() {
        let uploads = vec![("red.png".to_string(), png_bytes(2, 2, [255, 0, 0, 255]))];
        let (_, decoded) = decode_assets(&uploads).expect("decode");

        let mut canvas = Pixmap::new(40, 40).expect("canvas");
        canvas.fill(Color::WHITE);
        draw_image(
            &mut canvas,
            &ImageCommand {
                asset: 0,
                name: "red.png".to_string(),
                x: 10,
                y: 10,
                width: 20,
                height: 20,
            },
            &decoded,
        );

        let px_at = |x: u32, y: u32| {
            let idx = (y * 40 + x) as usize;
            canvas.pixels()[idx].demultiply()
        };
        // Center of the placed rect is red; outside stays white.
        let center = px_at(20, 20);
        assert_eq!((center.red(), center.green(), center.blue()), (255, 0, 0));
        let corner = px_at(2, 2);
        assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
    }

    #[test]
    fn encode_png_round_trips_through_the_decoder() {
        let mut pixmap = Pixmap::new(4, 3).expect("pixmap");
        pixmap.fill(Color::from_rgba8(12, 34, 56, 255));
        let bytes = encode_png(&pixmap).expect("encode");
        let back = image::load_from_memory(&bytes).expect("decode");
        assert_eq!((back.width(), back.height()), (4, 3));
    }

    #[test]
    fn semi_transparent_pixels_premultiply() {
        let pixmap = pixmap_from_rgba(1, 1, &[200, 100, 0, 128]).expect("pixmap");
        let px = pixmap.pixels()[0];
        assert!(px.red() <= 128);
        assert_eq!(px.alpha(), 128);
    }
}

//! Command-line input surface for the handwriting page generator.
//!
//! Reads text, a font, optional diagram uploads, and a diagram-directive
//! file; writes one PNG per page plus an optional first-page preview.

use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use inkleaf::{Document, PageGeometry, PenColor};
use inkleaf_render::RenderEngine;
use inkleaf_tiny_skia::{
    decode_assets, encode_png, render_document, resolve_font, FaceMeasurer, FontSource,
};

#[derive(Parser, Debug)]
#[command(name = "inkleaf", about = "Render text as handwritten page images")]
struct Args {
    /// Input text file, or "-" for stdin.
    text: PathBuf,

    /// TTF/OTF font file.
    #[arg(long)]
    font: Option<PathBuf>,

    /// System font family name, tried after --font.
    #[arg(long)]
    font_name: Option<String>,

    /// Pen size in pixels (clamped to 20-100).
    #[arg(long, default_value_t = 40.0)]
    size: f32,

    /// Pen color as a hex string; malformed values fall back to black.
    #[arg(long, default_value = "#000000")]
    color: String,

    /// Diagram image files, referenced by file name in directives.
    #[arg(long, value_name = "FILE")]
    asset: Vec<PathBuf>,

    /// Diagram directive file (`filename:n1,n2,...` per line).
    #[arg(long)]
    directives: Option<PathBuf>,

    /// Output directory for page PNGs.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Also write the first page to this path as a preview.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Print the layout command structure as JSON instead of rendering.
    #[arg(long)]
    dump_layout: bool,

    #[arg(long, default_value_t = 1240)]
    page_width: i32,

    #[arg(long, default_value_t = 1754)]
    page_height: i32,

    #[arg(long, default_value_t = 100)]
    margin: i32,
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Args::parse()) {
        eprintln!("inkleaf: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let text = read_text(&args.text)?;
    let geometry = PageGeometry {
        page_width: args.page_width,
        page_height: args.page_height,
        margin: args.margin,
        start_offset: args.margin,
    };
    let document = Document::new(text)
        .with_font_size(args.size.clamp(20.0, 100.0))
        .with_color(PenColor::parse_lossy(&args.color))
        .with_geometry(geometry);

    let directives = match &args.directives {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };
    let uploads = read_uploads(&args.asset)?;

    let mut sources = Vec::new();
    if let Some(path) = &args.font {
        sources.push(FontSource::File(path));
    }
    if let Some(name) = &args.font_name {
        sources.push(FontSource::Named(name));
    }
    let face = resolve_font(&sources)?;

    if args.dump_layout {
        let (assets, _) = decode_assets(&uploads)?;
        let engine = RenderEngine::new()
            .with_text_measurer(Arc::new(FaceMeasurer::new(face)));
        let pages = engine.generate(&document, &directives, &assets)?;
        println!("{}", serde_json::to_string_pretty(&pages)?);
        return Ok(());
    }

    let canvases = render_document(&document, &directives, &uploads, face)?;
    std::fs::create_dir_all(&args.out)?;
    for (i, canvas) in canvases.iter().enumerate() {
        let bytes = encode_png(canvas)?;
        let path = args.out.join(format!("page-{:03}.png", i + 1));
        std::fs::write(&path, &bytes)?;
        if i == 0 {
            if let Some(preview) = &args.preview {
                std::fs::write(preview, &bytes)?;
            }
        }
    }
    log::info!("wrote {} page(s) to {}", canvases.len(), args.out.display());
    Ok(())
}

fn read_text(path: &Path) -> Result<String, Box<dyn Error>> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<(String, Vec<u8>)>, Box<dyn Error>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("asset path {} has no file name", path.display()))?;
        uploads.push((name, std::fs::read(path)?));
    }
    Ok(uploads)
}

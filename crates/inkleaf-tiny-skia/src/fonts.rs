use core::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inkleaf_render::{ResolvedTextStyle, TextMeasurer};
use ttf_parser::Face;

/// Font loading and resolution errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontError {
    /// Bytes are not a parseable TTF/OTF face.
    Parse,
    /// A font file could not be read.
    Io { path: String },
    /// A named family was not found in the system font directories.
    NotFound { name: String },
    /// Every supplied source and every fallback candidate failed.
    NoUsableFont,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "font bytes are not a parseable face"),
            Self::Io { path } => write!(f, "failed to read font file {path}"),
            Self::NotFound { name } => {
                write!(f, "font family {name:?} not found in system font directories")
            }
            Self::NoUsableFont => write!(f, "no usable font face in any source or fallback"),
        }
    }
}

impl std::error::Error for FontError {}

/// A validated TTF/OTF face, cheap to clone.
///
/// The bytes are parse-checked once at construction; methods re-parse on
/// demand (a zero-copy operation in `ttf-parser`).
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
}

impl FontFace {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        Face::parse(&data, 0).map_err(|_| FontError::Parse)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|_| FontError::Io {
            path: path.display().to_string(),
        })?;
        Self::from_bytes(data)
    }

    pub(crate) fn data_ref(&self) -> &[u8] {
        &self.data
    }

    fn face(&self) -> Option<Face<'_>> {
        // Validated in the constructor; a parse failure here would mean the
        // bytes changed under the Arc, which cannot happen.
        Face::parse(&self.data, 0).ok()
    }

    /// Ascent above the baseline at `size_px`.
    pub fn ascent_px(&self, size_px: f32) -> f32 {
        let Some(face) = self.face() else {
            return size_px * 0.8;
        };
        let units = f32::from(face.units_per_em().max(1));
        f32::from(face.ascender()) / units * size_px
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("byte_len", &self.data.len())
            .finish()
    }
}

/// One way of obtaining a font, tried in caller order.
#[derive(Clone, Copy)]
pub enum FontSource<'a> {
    /// Raw TTF/OTF bytes, e.g. an uploaded file.
    Bytes(&'a [u8]),
    /// A font file on disk.
    File(&'a Path),
    /// A family name looked up in the system font directories.
    Named(&'a str),
}

impl fmt::Debug for FontSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Face names tried when every user-supplied source fails.
const FALLBACK_FACES: &[&str] = &[
    "DejaVuSans",
    "LiberationSans-Regular",
    "FreeSans",
    "Arial",
    "Helvetica",
];

/// Resolve a usable face from `sources`, falling back to well-known system
/// faces. A failing source is logged and skipped rather than failing the
/// request; only "nothing anywhere parses" is an error.
pub fn resolve_font(sources: &[FontSource<'_>]) -> Result<FontFace, FontError> {
    for source in sources {
        let attempt = match source {
            FontSource::Bytes(bytes) => FontFace::from_bytes(bytes.to_vec()),
            FontSource::File(path) => FontFace::from_path(path),
            FontSource::Named(name) => named_source_face(name),
        };
        match attempt {
            Ok(face) => return Ok(face),
            Err(err) => log::warn!("font source {source:?} unusable: {err}"),
        }
    }
    for name in FALLBACK_FACES {
        if let Some(face) = load_named_face(name) {
            log::info!("falling back to system face {name}");
            return Ok(face);
        }
    }
    Err(FontError::NoUsableFont)
}

fn named_source_face(name: &str) -> Result<FontFace, FontError> {
    load_named_face(name).ok_or_else(|| FontError::NotFound {
        name: name.to_string(),
    })
}

fn load_named_face(name: &str) -> Option<FontFace> {
    for dir in system_font_dirs() {
        for file_name in candidate_file_names(name) {
            if let Some(face) = find_face_file(&dir, &file_name, 2) {
                return Some(face);
            }
        }
    }
    None
}

/// Likely file names for a requested family, most specific first.
fn candidate_file_names(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return out;
    }
    if trimmed.to_ascii_lowercase().ends_with(".ttf")
        || trimmed.to_ascii_lowercase().ends_with(".otf")
    {
        out.push(trimmed.to_string());
        return out;
    }
    let compact = trimmed.replace(' ', "");
    out.push(format!("{compact}.ttf"));
    out.push(format!("{compact}-Regular.ttf"));
    out.push(format!("{compact}.otf"));
    out
}

/// Search `dir` (and subdirectories up to `depth`) for a parseable face
/// whose file name matches case-insensitively.
fn find_face_file(dir: &Path, file_name: &str, depth: u8) -> Option<FontFace> {
    let entries = std::fs::read_dir(dir).ok()?;
    let wanted = file_name.to_ascii_lowercase();
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let matches = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase() == wanted)
            .unwrap_or(false);
        if matches {
            if let Ok(face) = FontFace::from_path(&path) {
                return Some(face);
            }
        }
    }
    if depth > 0 {
        for sub in subdirs {
            if let Some(face) = find_face_file(&sub, file_name, depth - 1) {
                return Some(face);
            }
        }
    }
    None
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }

    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(&home).join(".fonts"));
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }
    dirs
}

/// Glyph-accurate [`TextMeasurer`] over a parsed face.
///
/// Width is the horizontal advance sum; height is the tight vertical extent
/// of the string's glyph bounding boxes, matching the "tight pixel bounding
/// box" measurement contract. Pure: no state mutates between calls.
#[derive(Clone, Debug)]
pub struct FaceMeasurer {
    face: FontFace,
}

impl FaceMeasurer {
    pub fn new(face: FontFace) -> Self {
        Self { face }
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }
}

impl TextMeasurer for FaceMeasurer {
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> (f32, f32) {
        let Some(face) = self.face.face() else {
            return (0.0, 0.0);
        };
        let units = f32::from(face.units_per_em().max(1));
        let scale = style.size_px / units;

        let mut advance = 0.0f32;
        let mut y_min = i16::MAX;
        let mut y_max = i16::MIN;
        let mut saw_outline = false;
        for ch in text.chars() {
            let Some(gid) = face.glyph_index(ch) else {
                // Missing glyph renders as notdef-sized whitespace.
                advance += style.size_px * 0.5;
                continue;
            };
            let adv = face.glyph_hor_advance(gid).unwrap_or(0);
            advance += if adv > 0 {
                f32::from(adv) * scale
            } else {
                style.size_px * 0.5
            };
            if let Some(bbox) = face.glyph_bounding_box(gid) {
                y_min = y_min.min(bbox.y_min);
                y_max = y_max.max(bbox.y_max);
                saw_outline = true;
            }
        }

        let height = if saw_outline {
            (f32::from(y_max) - f32::from(y_min)).max(0.0) * scale
        } else if advance > 0.0 {
            style.size_px
        } else {
            0.0
        };
        (advance.max(0.0), height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert_eq!(
            FontFace::from_bytes(vec![0u8; 64]).err(),
            Some(FontError::Parse)
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FontFace::from_path(Path::new("/nonexistent/nope.ttf")).err();
        assert!(matches!(err, Some(FontError::Io { .. })));
    }

    #[test]
    fn missing_named_family_reports_which_name_failed() {
        let err = named_source_face("no-such-family-anywhere")
            .expect_err("family must not resolve");
        assert_eq!(
            err,
            FontError::NotFound {
                name: "no-such-family-anywhere".to_string()
            }
        );
        assert!(err.to_string().contains("no-such-family-anywhere"));
    }

    #[test]
    fn candidate_names_cover_common_layouts() {
        let names = candidate_file_names("DejaVu Sans");
        assert_eq!(
            names,
            vec![
                "DejaVuSans.ttf".to_string(),
                "DejaVuSans-Regular.ttf".to_string(),
                "DejaVuSans.otf".to_string(),
            ]
        );
        assert_eq!(
            candidate_file_names("custom.ttf"),
            vec!["custom.ttf".to_string()]
        );
        assert!(candidate_file_names("  ").is_empty());
    }
}

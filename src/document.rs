use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque RGB pen color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PenColor {
    /// Default pen.
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    /// Parse a `#rrggbb` or `#rgb` hex string (leading `#` optional).
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or_else(|| s.trim());
        // Byte slicing below; multibyte input can hit the right byte length
        // without being sliceable.
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self { r, g, b })
            }
            3 => {
                let nibble = |c: &str| u8::from_str_radix(c, 16).ok().map(|v| v * 0x11);
                Some(Self {
                    r: nibble(&hex[0..1])?,
                    g: nibble(&hex[1..2])?,
                    b: nibble(&hex[2..3])?,
                })
            }
            _ => None,
        }
    }

    /// Parse a hex string, falling back to black on malformed input.
    ///
    /// Matches the input surface's color-picker default rather than failing
    /// the request over a cosmetic setting.
    pub fn parse_lossy(s: &str) -> Self {
        match Self::parse(s) {
            Some(color) => color,
            None => {
                log::debug!("unparseable pen color {s:?}, using black");
                Self::BLACK
            }
        }
    }
}

impl Default for PenColor {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Fixed page geometry in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Full page width.
    pub page_width: i32,
    /// Full page height.
    pub page_height: i32,
    /// Uniform margin on all four edges.
    pub margin: i32,
    /// Vertical offset where content starts on a fresh page.
    pub start_offset: i32,
}

impl PageGeometry {
    /// Usable horizontal span: `page_width - 2 * margin`.
    pub fn content_width(&self) -> i32 {
        (self.page_width - 2 * self.margin).max(1)
    }

    /// Lowest y a placed element may extend to.
    pub fn content_bottom(&self) -> i32 {
        self.page_height - self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4-ish canvas at 150 dpi with the classic 100px inset.
        Self {
            page_width: 1240,
            page_height: 1754,
            margin: 100,
            start_offset: 100,
        }
    }
}

/// One generation request: the full input text plus pen and page settings.
///
/// Immutable once generation starts; every run derives its pages from a
/// fresh `Document` with no state carried across invocations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Raw input text, split into words on whitespace during wrapping.
    pub text: String,
    /// Pen size in pixels; the input surface offers 20-100.
    pub font_size: f32,
    /// Pen color.
    pub color: PenColor,
    /// Page geometry used for every emitted page.
    pub geometry: PageGeometry,
}

impl Document {
    /// Document with default pen and geometry.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 40.0,
            color: PenColor::BLACK,
            geometry: PageGeometry::default(),
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_color(mut self, color: PenColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Validate the request before any layout work.
    ///
    /// Blank input is a user-visible error, not a blank page.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.text.trim().is_empty() {
            return Err(DocumentError::EmptyInput);
        }
        Ok(())
    }
}

/// Input-validity errors surfaced before layout begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// Text is empty or whitespace-only.
    EmptyInput,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input text is empty"),
        }
    }
}

impl std::error::Error for DocumentError {}

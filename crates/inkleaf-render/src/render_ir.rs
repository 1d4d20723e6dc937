use inkleaf::{AssetId, PenColor};
use serde::{Deserialize, Serialize};

/// Text style resolved for layout and drawing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Pen color.
    pub color: PenColor,
}

impl ResolvedTextStyle {
    /// Extra vertical gap inserted after each placed element.
    pub fn line_gap_px(&self) -> f32 {
        0.2 * self.size_px
    }
}

/// Text draw command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextCommand {
    /// Left x.
    pub x: i32,
    /// Top y of the text box; backends derive the baseline from the face.
    pub y: i32,
    /// Content.
    pub text: String,
    /// Resolved style.
    pub style: ResolvedTextStyle,
}

/// Diagram draw command, already scaled to its placed size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCommand {
    /// Asset id into the generation's asset set.
    pub asset: AssetId,
    /// Filename key, kept for debug dumps and telemetry.
    pub name: String,
    /// Left x.
    pub x: i32,
    /// Top y.
    pub y: i32,
    /// Placed width.
    pub width: u32,
    /// Placed height.
    pub height: u32,
}

/// Layout output commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Draw a wrapped text line.
    Text(TextCommand),
    /// Paste a diagram.
    Image(ImageCommand),
}

/// Per-page counters for consumers and debug dumps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetrics {
    /// Text lines placed on this page.
    pub line_count: usize,
    /// Diagrams placed on this page.
    pub image_count: usize,
}

/// Page represented as backend-agnostic draw commands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Draw commands in placement order, top to bottom.
    pub commands: Vec<DrawCommand>,
    /// Page counters.
    pub metrics: PageMetrics,
}

impl RenderPage {
    /// Create an empty page.
    pub fn new(page_number: usize) -> Self {
        Self {
            page_number,
            commands: Vec::new(),
            metrics: PageMetrics::default(),
        }
    }

    /// Push a command, updating metrics.
    pub fn push_command(&mut self, cmd: DrawCommand) {
        match &cmd {
            DrawCommand::Text(_) => self.metrics.line_count += 1,
            DrawCommand::Image(_) => self.metrics.image_count += 1,
        }
        self.commands.push(cmd);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

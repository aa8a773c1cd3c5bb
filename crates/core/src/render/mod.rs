use glam::{DAffine2, DVec2};

use crate::{actor::Font, sprite::ImageInfo, Point, Rect};

/// Width of a glyph relative to the font size in [`DisplayList`] metrics.
const MONOSPACE_ADVANCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

/// Anything able to size text, typically the director's render context.
pub trait TextMeasure {
    fn measure_text(&self, text: &str, font: &Font) -> TextMetrics;
}

/// Canvas-like drawing surface. Coordinates are in the current transform,
/// which `transform` post-multiplies and `save`/`restore` bracket together
/// with the global alpha.
pub trait RenderContext: TextMeasure {
    fn clear(&mut self, width: f64, height: f64);
    fn save(&mut self);
    fn restore(&mut self);
    fn transform(&mut self, transform: DAffine2);
    fn set_global_alpha(&mut self, alpha: f64);
    fn global_alpha(&self) -> f64;
    fn fill_rect(&mut self, rect: Rect, style: &str);
    fn stroke_rect(&mut self, rect: Rect, color: &str);
    fn fill_circle(&mut self, center: Point, radius: f64, style: &str);
    fn stroke_circle(&mut self, center: Point, radius: f64, color: &str);
    fn fill_text(&mut self, text: &str, font: &Font, at: Point, style: &str);
    fn draw_image(&mut self, image: &ImageInfo, source: Rect, dest: Rect);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear { width: f64, height: f64 },
    FillRect { rect: Rect, style: String },
    StrokeRect { rect: Rect, color: String },
    FillCircle { center: Point, radius: f64, style: String },
    StrokeCircle { center: Point, radius: f64, color: String },
    FillText { text: String, font: String, at: Point, style: String },
    DrawImage { image: String, source: Rect, dest: Rect },
}

/// A drawing operation together with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub transform: DAffine2,
    pub alpha: f64,
    pub op: DrawOp,
}

impl DrawCommand {
    /// Maps a point from the command's local space to the surface.
    pub fn to_surface(&self, point: Point) -> Point {
        self.transform.transform_point2(DVec2::from(point)).into()
    }
}

/// Render context that records commands instead of rasterising them. Each
/// `clear` starts a new frame.
#[derive(Debug, Clone)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
    transform: DAffine2,
    alpha: f64,
    stack: Vec<(DAffine2, f64)>,
}

impl Default for DisplayList {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayList {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            transform: DAffine2::IDENTITY,
            alpha: 1.0,
            stack: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn current_transform(&self) -> DAffine2 {
        self.transform
    }

    fn record(&mut self, op: DrawOp) {
        self.commands.push(DrawCommand {
            transform: self.transform,
            alpha: self.alpha,
            op,
        });
    }
}

impl TextMeasure for DisplayList {
    fn measure_text(&self, text: &str, font: &Font) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * font.size() * MONOSPACE_ADVANCE,
            height: font.size(),
        }
    }
}

impl RenderContext for DisplayList {
    fn clear(&mut self, width: f64, height: f64) {
        self.commands.clear();
        self.stack.clear();
        self.transform = DAffine2::IDENTITY;
        self.alpha = 1.0;
        self.record(DrawOp::Clear { width, height });
    }

    fn save(&mut self) {
        self.stack.push((self.transform, self.alpha));
    }

    fn restore(&mut self) {
        if let Some((transform, alpha)) = self.stack.pop() {
            self.transform = transform;
            self.alpha = alpha;
        }
    }

    fn transform(&mut self, transform: DAffine2) {
        self.transform = self.transform * transform;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn global_alpha(&self) -> f64 {
        self.alpha
    }

    fn fill_rect(&mut self, rect: Rect, style: &str) {
        self.record(DrawOp::FillRect {
            rect,
            style: style.to_string(),
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: &str) {
        self.record(DrawOp::StrokeRect {
            rect,
            color: color.to_string(),
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, style: &str) {
        self.record(DrawOp::FillCircle {
            center,
            radius,
            style: style.to_string(),
        });
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, color: &str) {
        self.record(DrawOp::StrokeCircle {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn fill_text(&mut self, text: &str, font: &Font, at: Point, style: &str) {
        self.record(DrawOp::FillText {
            text: text.to_string(),
            font: font.to_string(),
            at,
            style: style.to_string(),
        });
    }

    fn draw_image(&mut self, image: &ImageInfo, source: Rect, dest: Rect) {
        self.record(DrawOp::DrawImage {
            image: image.id.clone(),
            source,
            dest,
        });
    }
}

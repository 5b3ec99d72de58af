use std::{cell::Cell, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

/// Pixel dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Surface dimensions shared between the resize handler and the renderer.
///
/// The size is replaced as one `Copy` value, so a reader always sees a
/// width and height that were written together.
#[derive(Debug, Clone, Default)]
pub struct SharedSurfaceSize {
    inner: Rc<Cell<SurfaceSize>>,
}

impl SharedSurfaceSize {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            inner: Rc::new(Cell::new(size)),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        tracing::debug!(width, height, "surface resized");
        self.inner.set(SurfaceSize { width, height });
    }

    pub fn get(&self) -> SurfaceSize {
        self.inner.get()
    }
}

/// Colors in the notations the background uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Packed `0xRRGGBB`.
    Hex(u32),
    Hsla {
        hue: f64,
        saturation: f64,
        lightness: f64,
        alpha: f64,
    },
    Rgba { r: u8, g: u8, b: u8, alpha: f64 },
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Hex(rgb) => write!(f, "#{:06x}", rgb & 0x00ff_ffff),
            Color::Hsla {
                hue,
                saturation,
                lightness,
                alpha,
            } => write!(f, "hsla({hue}, {saturation}%, {lightness}%, {alpha})"),
            Color::Rgba { r, g, b, alpha } => write!(f, "rgba({r},{g},{b},{alpha})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGradient {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paint {
    Solid(Color),
    Linear(LinearGradient),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Close,
}

/// Polyline path assembled with canvas-style commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            segments: Vec::with_capacity(capacity),
        }
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::LineTo { x, y });
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::Close);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Close))
    }
}

/// The 2D drawing primitives the background needs.
pub trait Surface {
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint);

    fn fill_path(&mut self, path: &Path, paint: &Paint);

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, paint: &Paint);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        paint: Paint,
    },
    FillPath {
        path: Path,
        paint: Paint,
    },
    FillCircle {
        cx: f64,
        cy: f64,
        radius: f64,
        paint: Paint,
    },
}

/// Surface that keeps every call as a [`DrawCommand`]. Two recordings of
/// the same frame compare equal exactly when they would rasterize equally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the recorded frame and leaves the recorder empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Surface for CommandRecorder {
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            paint: paint.clone(),
        });
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, paint: &Paint) {
        self.commands.push(DrawCommand::FillCircle {
            cx,
            cy,
            radius,
            paint: paint.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_then_read_returns_new_size() {
        let size = SharedSurfaceSize::new(SurfaceSize::new(800, 600));
        let reader = size.clone();
        size.resize(1920, 1080);
        assert_eq!(reader.get(), SurfaceSize::new(1920, 1080));
    }

    #[test]
    fn formats_css_colors() {
        assert_eq!(Color::Hex(0x0b1c3a).to_string(), "#0b1c3a");
        let hsla = Color::Hsla {
            hue: 210.0,
            saturation: 70.0,
            lightness: 66.0,
            alpha: 0.28,
        };
        assert_eq!(hsla.to_string(), "hsla(210, 70%, 66%, 0.28)");
        let rgba = Color::Rgba {
            r: 255,
            g: 255,
            b: 255,
            alpha: 0.04,
        };
        assert_eq!(rgba.to_string(), "rgba(255,255,255,0.04)");
    }

    #[test]
    fn recorder_take_empties_buffer() {
        let mut recorder = CommandRecorder::new();
        let paint = Paint::Solid(Color::Hex(0xffffff));
        recorder.fill_circle(1.0, 2.0, 3.0, &paint);
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn path_reports_closure() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(1.0, 1.0);
        assert!(!path.is_closed());
        path.close();
        assert!(path.is_closed());
        assert_eq!(path.segments().len(), 3);
    }
}

use std::fmt::Write;

use crate::render::{DrawCommand, LinearGradient, Paint, Path, PathSegment, Surface, SurfaceSize};

/// Surface that serializes drawing calls into a standalone SVG document.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    size: SurfaceSize,
    body: String,
    gradients: usize,
}

impl SvgSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            body: String::new(),
            gradients: 0,
        }
    }

    /// Renders a recorded frame.
    pub fn from_commands(size: SurfaceSize, commands: &[DrawCommand]) -> Self {
        let mut surface = Self::new(size);
        for command in commands {
            command.replay(&mut surface);
        }
        surface
    }

    pub fn finish(self) -> String {
        let SurfaceSize { width, height } = self.size;
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
             viewBox=\"0 0 {width} {height}\">\n{}</svg>\n",
            self.body
        )
    }

    /// Emits the paint definition if needed and returns the `fill` value.
    fn fill_attr(&mut self, paint: &Paint) -> String {
        match paint {
            Paint::Solid(color) => color.to_string(),
            Paint::Linear(gradient) => {
                let id = format!("g{}", self.gradients);
                self.gradients += 1;
                self.push_gradient(&id, gradient);
                format!("url(#{id})")
            }
        }
    }

    fn push_gradient(&mut self, id: &str, gradient: &LinearGradient) {
        let ((x1, y1), (x2, y2)) = (gradient.from, gradient.to);
        let _ = writeln!(
            self.body,
            "<defs><linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" \
             x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\">"
        );
        for stop in &gradient.stops {
            let _ = writeln!(
                self.body,
                "<stop offset=\"{}\" stop-color=\"{}\"/>",
                stop.offset, stop.color
            );
        }
        self.body.push_str("</linearGradient></defs>\n");
    }
}

impl Surface for SvgSurface {
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, paint: &Paint) {
        let fill = self.fill_attr(paint);
        let _ = writeln!(
            self.body,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" fill=\"{fill}\"/>"
        );
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let fill = self.fill_attr(paint);
        let _ = writeln!(self.body, "<path d=\"{}\" fill=\"{fill}\"/>", path_data(path));
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, paint: &Paint) {
        let fill = self.fill_attr(paint);
        let _ = writeln!(
            self.body,
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{radius}\" fill=\"{fill}\"/>"
        );
    }
}

fn path_data(path: &Path) -> String {
    let mut data = String::new();
    for segment in path.segments() {
        if !data.is_empty() {
            data.push(' ');
        }
        match segment {
            PathSegment::MoveTo { x, y } => {
                let _ = write!(data, "M{x:.2},{y:.2}");
            }
            PathSegment::LineTo { x, y } => {
                let _ = write!(data, "L{x:.2},{y:.2}");
            }
            PathSegment::Close => data.push('Z'),
        }
    }
    data
}

impl DrawCommand {
    /// Re-issues the recorded call against another surface.
    pub fn replay(&self, surface: &mut dyn Surface) {
        match self {
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                paint,
            } => surface.fill_rect(*x, *y, *width, *height, paint),
            DrawCommand::FillPath { path, paint } => surface.fill_path(path, paint),
            DrawCommand::FillCircle {
                cx,
                cy,
                radius,
                paint,
            } => surface.fill_circle(*cx, *cy, *radius, paint),
        }
    }
}

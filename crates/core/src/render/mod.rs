//! Drawing surface abstraction and the animated wave background.

mod surface;
mod svg;
mod waves;

pub use surface::{
    Color, CommandRecorder, DrawCommand, GradientStop, LinearGradient, Paint, Path, PathSegment,
    SharedSurfaceSize, Surface, SurfaceSize,
};
pub use svg::SvgSurface;
pub use waves::{WaveLayer, WaveLoop, WaveRenderer};

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{
    config::WaveConfig,
    render::{Color, GradientStop, LinearGradient, Paint, Path, SharedSurfaceSize, Surface},
    timeline::FrameTask,
    Result,
};

/// Saturation shared by every wave layer, in percent.
const LAYER_SATURATION: f64 = 70.0;

const BACKGROUND_STOPS: [(f64, u32); 3] = [(0.0, 0x0b1c3a), (0.55, 0x08305f), (1.0, 0x001024)];

/// Top of the sparkle band in pixels.
const SPARKLE_TOP: f64 = 60.0;
const SPARKLE_SPACING: f64 = 30.0;
/// Fraction of the surface height the sparkle band wraps within.
const SPARKLE_BAND: f64 = 0.6;

/// One translucent sine layer of the background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveLayer {
    /// Peak displacement in pixels before the slow swell is applied.
    pub amplitude: f64,
    /// Cycles across the full surface width.
    pub frequency: f64,
    /// Phase advance in radians per millisecond.
    pub speed: f64,
    pub hue: f64,
    /// HSL lightness in percent.
    pub lightness: f64,
    pub alpha: f64,
    /// Constant phase offset in radians.
    pub offset: f64,
}

impl WaveLayer {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                amplitude: 40.0,
                frequency: 0.0022,
                speed: 0.0009,
                hue: 210.0,
                lightness: 66.0,
                alpha: 0.28,
                offset: 0.0,
            },
            Self {
                amplitude: 26.0,
                frequency: 0.0035,
                speed: 0.0016,
                hue: 205.0,
                lightness: 56.0,
                alpha: 0.20,
                offset: 120.0,
            },
            Self {
                amplitude: 14.0,
                frequency: 0.0052,
                speed: 0.0026,
                hue: 200.0,
                lightness: 48.0,
                alpha: 0.14,
                offset: 250.0,
            },
        ]
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), &'static str> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.amplitude) || !positive(self.frequency) || !positive(self.speed) {
            return Err("amplitude, frequency and speed must be strictly positive");
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err("alpha must lie in [0, 1]");
        }
        Ok(())
    }

    /// Vertical displacement from the baseline at horizontal `progress`
    /// (0 at the left edge, 1 at the right) after `dt_ms` milliseconds.
    pub fn displacement(&self, layer_index: usize, progress: f64, dt_ms: f64, swell_rate: f64) -> f64 {
        let phase = dt_ms * self.speed + progress * TAU * self.frequency + self.offset;
        let swell = 1.0 + (dt_ms * swell_rate + layer_index as f64).sin();
        phase.sin() * self.amplitude * swell
    }

    pub fn fill(&self) -> Paint {
        Paint::Solid(Color::Hsla {
            hue: self.hue,
            saturation: LAYER_SATURATION,
            lightness: self.lightness,
            alpha: self.alpha,
        })
    }
}

/// Draws the gradient, wave layers and sparkles for a point in time.
///
/// Holds no per-frame state: the output depends only on `now_ms`, the start
/// time and the current surface size.
#[derive(Debug, Clone)]
pub struct WaveRenderer {
    config: WaveConfig,
    size: SharedSurfaceSize,
    start_ms: f64,
}

impl WaveRenderer {
    pub fn new(config: WaveConfig, size: SharedSurfaceSize, start_ms: f64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            size,
            start_ms,
        })
    }

    pub fn layers(&self) -> &[WaveLayer] {
        &self.config.layers
    }

    pub fn size(&self) -> &SharedSurfaceSize {
        &self.size
    }

    /// Height of sample `sample` of layer `layer_index`, in surface pixels.
    /// `None` when the layer does not exist.
    pub fn height_at(
        &self,
        layer_index: usize,
        sample: usize,
        dt_ms: f64,
        surface_height: f64,
    ) -> Option<f64> {
        let layer = self.config.layers.get(layer_index)?;
        let progress = sample as f64 / self.config.detail as f64;
        Some(
            surface_height * self.config.baseline
                + layer.displacement(layer_index, progress, dt_ms, self.config.swell_rate),
        )
    }

    /// Closed outline of one layer: down the left edge, along the wave, and
    /// back along the bottom edge.
    pub fn layer_path(&self, layer_index: usize, dt_ms: f64, width: f64, height: f64) -> Option<Path> {
        let detail = self.config.detail;
        let mut path = Path::with_capacity(detail + 4);
        path.move_to(0.0, height);
        for sample in 0..=detail {
            let x = sample as f64 / detail as f64 * width;
            path.line_to(x, self.height_at(layer_index, sample, dt_ms, height)?);
        }
        path.line_to(width, height);
        path.close();
        Some(path)
    }

    pub fn draw(&self, surface: &mut dyn Surface, now_ms: f64) {
        let size = self.size.get();
        if size.is_empty() {
            return;
        }
        let (width, height) = (f64::from(size.width), f64::from(size.height));
        let dt_ms = now_ms - self.start_ms;

        surface.fill_rect(0.0, 0.0, width, height, &background(height));

        for (index, layer) in self.config.layers.iter().enumerate() {
            if let Some(path) = self.layer_path(index, dt_ms, width, height) {
                surface.fill_path(&path, &layer.fill());
            }
        }

        let sparkles = self.config.sparkles;
        for i in 0..sparkles.count {
            let x = ((now_ms * sparkles.drift_rate + i as f64).sin() * 0.5 + 0.5) * width;
            let y = SPARKLE_TOP + (i as f64 * SPARKLE_SPACING) % (height * SPARKLE_BAND);
            let paint = Paint::Solid(Color::Rgba {
                r: 255,
                g: 255,
                b: 255,
                alpha: 0.02 + (i % 3) as f64 * 0.02,
            });
            surface.fill_circle(x, y, sparkles.radius, &paint);
        }
    }
}

fn background(height: f64) -> Paint {
    Paint::Linear(LinearGradient {
        from: (0.0, 0.0),
        to: (0.0, height),
        stops: BACKGROUND_STOPS
            .iter()
            .map(|&(offset, rgb)| GradientStop {
                offset,
                color: Color::Hex(rgb),
            })
            .collect(),
    })
}

/// Frame task pairing the renderer with the surface it paints. Without a
/// surface every frame is skipped.
#[derive(Debug)]
pub struct WaveLoop<S: Surface> {
    renderer: WaveRenderer,
    surface: Option<S>,
}

impl<S: Surface> WaveLoop<S> {
    pub fn new(renderer: WaveRenderer, surface: S) -> Self {
        Self {
            renderer,
            surface: Some(surface),
        }
    }

    pub fn detached(renderer: WaveRenderer) -> Self {
        tracing::warn!("no drawing surface available; wave background disabled");
        Self {
            renderer,
            surface: None,
        }
    }

    pub fn renderer(&self) -> &WaveRenderer {
        &self.renderer
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}

impl<S: Surface> FrameTask for WaveLoop<S> {
    fn name(&self) -> &'static str {
        "waves"
    }

    fn on_frame(&mut self, now_ms: f64) {
        if let Some(surface) = self.surface.as_mut() {
            self.renderer.draw(surface, now_ms);
        }
    }
}

use std::{fs, path::Path};

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{dispatch::Channel, render::WaveLayer, DeckError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub surface: SurfaceConfig,
    pub waves: WaveConfig,
    pub motion: MotionConfig,
    pub audio: AudioConfig,
    pub deck: DeckConfig,
    /// Seed for the per-tile motion parameters and click noise. `None` draws
    /// a fresh seed from the operating system.
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections fall back to their
    /// defaults; the result is validated before it is returned.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Random source for tile seeding and click noise, reproducible when a
    /// seed is configured.
    pub fn rng(&self) -> Pcg64Mcg {
        let seed = self.seed.unwrap_or_else(rand::random);
        tracing::debug!(seed, "seeding random source");
        Pcg64Mcg::seed_from_u64(seed)
    }

    pub fn validate(&self) -> Result<()> {
        self.surface.validate()?;
        self.waves.validate()?;
        self.motion.validate()?;
        self.audio.validate()?;
        self.deck.validate()
    }
}

/// Initial drawing surface dimensions in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    /// Display refresh rate used when pacing the frame loop.
    pub frame_rate: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate: 60.0,
        }
    }
}

impl SurfaceConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(DeckError::config("surface.frame_rate must be positive"));
        }
        Ok(())
    }
}

/// Parameters of the animated wave background.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Layers drawn back-to-front.
    pub layers: Vec<WaveLayer>,
    /// Number of horizontal segments per wave path.
    pub detail: usize,
    /// Wave baseline as a fraction of the surface height.
    pub baseline: f64,
    /// Rate (per millisecond) of the slow amplitude swell.
    pub swell_rate: f64,
    pub sparkles: SparkleConfig,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            layers: WaveLayer::defaults(),
            detail: 120,
            baseline: 0.45,
            swell_rate: 0.00015,
            sparkles: SparkleConfig::default(),
        }
    }
}

impl WaveConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.detail == 0 {
            return Err(DeckError::config("waves.detail must be at least 1"));
        }
        for (index, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|reason| DeckError::config(format!("waves.layers[{index}]: {reason}")))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkleConfig {
    pub count: usize,
    pub radius: f64,
    /// Horizontal drift rate per millisecond.
    pub drift_rate: f64,
}

impl Default for SparkleConfig {
    fn default() -> Self {
        Self {
            count: 8,
            radius: 1.8,
            drift_rate: 0.0003,
        }
    }
}

/// Ranges the per-tile idle motion parameters are drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Maximum absolute horizontal seed offset in pixels.
    pub offset_x: f64,
    /// Maximum absolute vertical seed offset in pixels.
    pub offset_y: f64,
    /// Maximum absolute seed rotation in degrees.
    pub rotation_deg: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            offset_x: 8.0,
            offset_y: 6.0,
            rotation_deg: 1.5,
            min_speed: 2.4,
            max_speed: 4.8,
        }
    }
}

impl MotionConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let ranges = [self.offset_x, self.offset_y, self.rotation_deg];
        if ranges.iter().any(|value| !(value.is_finite() && *value >= 0.0)) {
            return Err(DeckError::config(
                "motion offsets and rotation must be finite and non-negative",
            ));
        }
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed) {
            return Err(DeckError::config(
                "motion speed range must be positive with min_speed <= max_speed",
            ));
        }
        Ok(())
    }
}

/// Lowest accepted output rate. Keeps the hover tone's 2.4 kHz low-pass
/// cutoff below Nyquist.
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Configuration specific to the audio subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub block_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: 1024,
        }
    }
}

impl AudioConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.sample_rate < MIN_SAMPLE_RATE {
            return Err(DeckError::config(format!(
                "audio.sample_rate must be at least {MIN_SAMPLE_RATE} Hz"
            )));
        }
        if self.block_size == 0 {
            return Err(DeckError::config("audio.block_size must be non-zero"));
        }
        Ok(())
    }
}

/// Tile grid contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub channels: Vec<Channel>,
    /// Grid stride used by vertical arrow navigation.
    pub columns: usize,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            channels: Channel::defaults(),
            columns: 2,
        }
    }
}

impl DeckConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.columns == 0 {
            return Err(DeckError::config("deck.columns must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.waves.layers.len(), 3);
        assert_eq!(config.waves.detail, 120);
        assert_eq!(config.deck.columns, 2);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "seed": 7, "surface": { "width": 640 } }"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.surface.width, 640);
        assert_eq!(config.surface.height, 720);
        assert_eq!(config.audio.sample_rate, 48_000);
    }

    #[test]
    fn serialized_config_loads_back() {
        let mut config = AppConfig::default();
        config.seed = Some(42);
        config.deck.columns = 3;
        let raw = serde_json::to_string(&config).unwrap();

        let loaded = AppConfig::from_json(&raw).unwrap();
        assert_eq!(loaded.seed, Some(42));
        assert_eq!(loaded.deck.columns, 3);
        assert_eq!(loaded.waves.layers, config.waves.layers);
    }

    #[test]
    fn rejects_non_positive_layer_amplitude() {
        let raw = r#"{ "waves": { "layers": [
            { "amplitude": 0.0, "frequency": 0.1, "speed": 0.1,
              "hue": 200.0, "lightness": 50.0, "alpha": 0.5, "offset": 0.0 }
        ] } }"#;
        let err = AppConfig::from_json(raw).unwrap_err();
        assert!(format!("{err}").contains("waves.layers[0]"));
    }

    #[test]
    fn rejects_inverted_speed_range() {
        let mut config = AppConfig::default();
        config.motion.min_speed = 5.0;
        config.motion.max_speed = 1.0;
        assert!(matches!(config.validate(), Err(DeckError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_sample_rates_below_minimum() {
        let err = AppConfig::from_json(r#"{ "audio": { "sample_rate": 2 } }"#).unwrap_err();
        assert!(matches!(err, DeckError::InvalidConfig(_)));
        AppConfig::from_json(r#"{ "audio": { "sample_rate": 8000 } }"#).unwrap();
    }

    #[test]
    fn configured_seed_is_reproducible() {
        use rand::Rng;

        let config = AppConfig {
            seed: Some(99),
            ..AppConfig::default()
        };
        let first: u64 = config.rng().random();
        let second: u64 = config.rng().random();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = AppConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DeckError::Json(_)));
    }
}

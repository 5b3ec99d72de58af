use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{DeckError, Result};

/// Scheduled change of an audio parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Automation {
    SetValue { value: f64, time: f64 },
    LinearRamp { value: f64, time: f64 },
    ExponentialRamp { value: f64, time: f64 },
}

impl Automation {
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. }
            | Automation::LinearRamp { time, .. }
            | Automation::ExponentialRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

/// Automation curve of one parameter, in context seconds.
///
/// A ramp runs from the value and time of the event before it to its own
/// value and time. A ramp with no earlier event starts from the default
/// value at the anchor time, the moment the parameter was created. Outside
/// all events the nearest settled value holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTimeline {
    default: f64,
    #[serde(default)]
    anchor: f64,
    events: Vec<Automation>,
}

impl ParamTimeline {
    /// A parameter created at context time zero.
    pub fn new(default: f64) -> Self {
        Self::anchored(default, 0.0)
    }

    /// A parameter created at context time `anchor`.
    pub fn anchored(default: f64, anchor: f64) -> Self {
        Self {
            default,
            anchor,
            events: Vec::new(),
        }
    }

    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Automation::SetValue { value, time });
        self
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(Automation::LinearRamp { value, time });
        self
    }

    /// Fails for a zero or non-finite target, which has no exponential path.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) -> Result<&mut Self> {
        if value == 0.0 || !value.is_finite() {
            return Err(DeckError::InvalidParameter(
                "exponential ramp target must be finite and non-zero",
            ));
        }
        self.insert(Automation::ExponentialRamp { value, time });
        Ok(self)
    }

    fn insert(&mut self, event: Automation) {
        let index = self
            .events
            .partition_point(|existing| existing.time() <= event.time());
        self.events.insert(index, event);
    }

    pub fn value_at(&self, time: f64) -> f64 {
        let mut value = self.default;
        let mut since = self.anchor;

        for event in &self.events {
            let end = event.time();
            if time < end {
                let progress = if end > since {
                    ((time - since) / (end - since)).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                return match *event {
                    Automation::SetValue { .. } => value,
                    Automation::LinearRamp { value: target, .. } => {
                        value + (target - value) * progress
                    }
                    Automation::ExponentialRamp { value: target, .. } => {
                        if value == 0.0 || value.signum() != target.signum() {
                            value
                        } else {
                            value * (target / value).powf(progress)
                        }
                    }
                };
            }
            value = event.value();
            since = end;
        }

        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Naive (non band-limited) value at `phase` cycles, `phase` in `[0, 1)`.
    pub fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Oscillator {
        waveform: Waveform,
        frequency: ParamTimeline,
    },
    /// Mono samples at the context sample rate, played once.
    Buffer { samples: Vec<f32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Second-order low-pass. `q_db` is the resonance in decibels.
    Lowpass { frequency: f64, q_db: f64 },
}

/// Host default resonance of a biquad filter.
pub const DEFAULT_Q_DB: f64 = 1.0;

/// Source, optional filter and gain stage feeding the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub source: Source,
    pub filter: Option<Filter>,
    pub gain: ParamTimeline,
    pub start: f64,
    pub stop: f64,
}

impl Voice {
    pub fn new(source: Source, start: f64, stop: f64) -> Self {
        Self {
            source,
            filter: None,
            gain: ParamTimeline::new(1.0),
            start,
            stop,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_gain(mut self, gain: ParamTimeline) -> Self {
        self.gain = gain;
        self
    }
}

/// A complete short-lived tone, ready to hand to an audio host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneGraph {
    pub label: String,
    pub voices: Vec<Voice>,
}

impl ToneGraph {
    pub fn new(label: impl Into<String>, voices: Vec<Voice>) -> Self {
        Self {
            label: label.into(),
            voices,
        }
    }

    pub fn start(&self) -> f64 {
        self.voices
            .iter()
            .map(|voice| voice.start)
            .fold(f64::INFINITY, f64::min)
    }

    /// Latest stop time over all voices.
    pub fn end(&self) -> f64 {
        self.voices
            .iter()
            .map(|voice| voice.stop)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

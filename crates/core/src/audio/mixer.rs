use std::{f64::consts::TAU, fmt};

use crate::audio::{AudioHost, ContextState, Filter, Source, ToneGraph, Voice};

/// Software audio host that synthesizes scheduled tones into mono sample
/// blocks. The clock only moves while rendering in the running state.
pub struct OfflineMixer {
    sample_rate: u32,
    state: ContextState,
    frames_rendered: u64,
    voices: Vec<ActiveVoice>,
    scheduled: u64,
}

impl OfflineMixer {
    /// A running context.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            state: ContextState::Running,
            frames_rendered: 0,
            voices: Vec::new(),
            scheduled: 0,
        }
    }

    /// A context that waits for [`AudioHost::resume`] before producing sound.
    pub fn suspended(sample_rate: u32) -> Self {
        Self {
            state: ContextState::Suspended,
            ..Self::new(sample_rate)
        }
    }

    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            self.state = ContextState::Suspended;
        }
    }

    /// Stops the context for good and releases every voice.
    pub fn close(&mut self) {
        self.state = ContextState::Closed;
        self.voices.clear();
    }

    /// Voices scheduled and not yet past their stop time.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Total voices accepted since construction.
    pub fn scheduled_voices(&self) -> u64 {
        self.scheduled
    }

    /// Fills `out` with the next block of the mix.
    pub fn render(&mut self, out: &mut [f32]) {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return;
        }

        let rate = f64::from(self.sample_rate);
        for (offset, sample) in out.iter_mut().enumerate() {
            let time = (self.frames_rendered + offset as u64) as f64 / rate;
            let mixed: f64 = self
                .voices
                .iter_mut()
                .map(|voice| voice.next_sample(time, rate))
                .sum();
            *sample = mixed as f32;
        }

        self.frames_rendered += out.len() as u64;
        let now = self.current_time();
        let before = self.voices.len();
        self.voices.retain(|voice| voice.voice.stop > now);
        let finished = before - self.voices.len();
        if finished > 0 {
            tracing::trace!(finished, remaining = self.voices.len(), "voices released");
        }
    }

    /// Renders `seconds` of audio in one block.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let frames = (seconds.max(0.0) * f64::from(self.sample_rate)).ceil() as usize;
        let mut out = vec![0.0; frames];
        self.render(&mut out);
        out
    }
}

impl AudioHost for OfflineMixer {
    fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / f64::from(self.sample_rate)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) {
        if self.state == ContextState::Suspended {
            tracing::debug!("audio context resumed");
            self.state = ContextState::Running;
        }
    }

    fn schedule(&mut self, graph: ToneGraph) {
        if self.state == ContextState::Closed {
            tracing::debug!(tone = %graph.label, "context closed; tone dropped");
            return;
        }

        let rate = f64::from(self.sample_rate);
        for voice in graph.voices {
            if voice.stop <= voice.start {
                continue;
            }
            self.scheduled += 1;
            self.voices.push(ActiveVoice::new(voice, rate));
        }
    }
}

impl fmt::Debug for OfflineMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineMixer")
            .field("sample_rate", &self.sample_rate)
            .field("state", &self.state)
            .field("frames_rendered", &self.frames_rendered)
            .field("voices", &self.voices.len())
            .finish()
    }
}

struct ActiveVoice {
    voice: Voice,
    phase: f64,
    cursor: usize,
    filter: Option<Biquad>,
}

impl ActiveVoice {
    fn new(voice: Voice, sample_rate: f64) -> Self {
        let filter = voice.filter.map(|filter| Biquad::new(filter, sample_rate));
        Self {
            voice,
            phase: 0.0,
            cursor: 0,
            filter,
        }
    }

    fn next_sample(&mut self, time: f64, sample_rate: f64) -> f64 {
        if time < self.voice.start || time >= self.voice.stop {
            return 0.0;
        }

        let raw = match &self.voice.source {
            Source::Oscillator {
                waveform,
                frequency,
            } => {
                let value = waveform.sample(self.phase);
                self.phase = (self.phase + frequency.value_at(time) / sample_rate).rem_euclid(1.0);
                value
            }
            Source::Buffer { samples } => {
                let value = samples.get(self.cursor).copied().map_or(0.0, f64::from);
                self.cursor += 1;
                value
            }
        };

        let filtered = match self.filter.as_mut() {
            Some(filter) => filter.process(raw),
            None => raw,
        };
        filtered * self.voice.gain.value_at(time)
    }
}

/// Direct form I biquad with RBJ cookbook coefficients.
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn new(filter: Filter, sample_rate: f64) -> Self {
        let Filter::Lowpass { frequency, q_db } = filter;
        // Cutoff stays strictly below Nyquist, even for degenerate rates.
        let nyquist = sample_rate * 0.5;
        let cutoff = frequency.min(nyquist * 0.999).max(f64::MIN_POSITIVE);
        let w0 = TAU * cutoff / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let q = 10f64.powf(q_db / 20.0);
        let alpha = sin / (2.0 * q);

        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{ParamTimeline, Waveform, DEFAULT_Q_DB};

    fn sine(frequency: f64, start: f64, stop: f64) -> Voice {
        Voice::new(
            Source::Oscillator {
                waveform: Waveform::Sine,
                frequency: ParamTimeline::new(frequency),
            },
            start,
            stop,
        )
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn clock_advances_with_rendering() {
        let mut mixer = OfflineMixer::new(1_000);
        let mut block = [0.0_f32; 250];
        mixer.render(&mut block);
        assert_eq!(mixer.current_time(), 0.25);
    }

    #[test]
    fn voice_plays_between_start_and_stop() {
        let mut mixer = OfflineMixer::new(8_000);
        mixer.schedule(ToneGraph::new("sine", vec![sine(440.0, 0.1, 0.2)]));

        let out = mixer.render_seconds(0.3);
        assert_eq!(peak(&out[..800]), 0.0);
        assert!(peak(&out[800..1600]) > 0.9);
        assert_eq!(peak(&out[1600..]), 0.0);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn suspended_context_is_silent_and_frozen() {
        let mut mixer = OfflineMixer::suspended(8_000);
        mixer.schedule(ToneGraph::new("sine", vec![sine(440.0, 0.0, 1.0)]));

        let out = mixer.render_seconds(0.1);
        assert_eq!(peak(&out), 0.0);
        assert_eq!(mixer.current_time(), 0.0);
        assert_eq!(mixer.active_voices(), 1);

        mixer.resume();
        let out = mixer.render_seconds(0.1);
        assert!(peak(&out) > 0.9);
    }

    #[test]
    fn buffer_source_plays_samples_in_order() {
        let mut mixer = OfflineMixer::new(4);
        let voice = Voice::new(Source::Buffer { samples: vec![0.5, -0.25] }, 0.0, 1.0);
        mixer.schedule(ToneGraph::new("buffer", vec![voice]));

        let mut out = [1.0_f32; 4];
        mixer.render(&mut out);
        assert_eq!(out, [0.5, -0.25, 0.0, 0.0]);
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let filter = Filter::Lowpass {
            frequency: 500.0,
            q_db: DEFAULT_Q_DB,
        };
        let mut mixer = OfflineMixer::new(48_000);
        mixer.schedule(ToneGraph::new(
            "filtered",
            vec![sine(8_000.0, 0.0, 0.5).with_filter(filter)],
        ));
        let out = mixer.render_seconds(0.5);
        assert!(peak(&out[4_800..]) < 0.05);
    }

    #[test]
    fn lowpass_survives_tiny_sample_rates() {
        let filter = Filter::Lowpass {
            frequency: 2_400.0,
            q_db: DEFAULT_Q_DB,
        };
        for rate in [1, 2, 3] {
            let mut mixer = OfflineMixer::new(rate);
            mixer.schedule(ToneGraph::new(
                "filtered",
                vec![sine(440.0, 0.0, 2.0).with_filter(filter)],
            ));
            let out = mixer.render_seconds(2.0);
            assert!(out.iter().all(|sample| sample.is_finite()));
        }
    }

    #[test]
    fn closed_context_drops_new_tones() {
        let mut mixer = OfflineMixer::new(8_000);
        mixer.close();
        mixer.schedule(ToneGraph::new("sine", vec![sine(440.0, 0.0, 1.0)]));
        assert_eq!(mixer.active_voices(), 0);
        assert_eq!(mixer.scheduled_voices(), 0);
    }
}

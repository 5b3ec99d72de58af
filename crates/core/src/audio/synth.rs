use std::fmt;

use rand::Rng;

use crate::{
    audio::{AudioHost, Filter, ParamTimeline, Source, ToneGraph, Voice, Waveform, DEFAULT_Q_DB},
    Result,
};

const HOVER_START_HZ: f64 = 420.0;
const HOVER_END_HZ: f64 = 820.0;
const HOVER_SWEEP: f64 = 0.09;
/// Near-silent floor exponential gain ramps start from and return to.
const HOVER_FLOOR: f64 = 0.0001;
const HOVER_PEAK: f64 = 0.03;
const HOVER_ATTACK: f64 = 0.02;
const HOVER_RELEASE: f64 = 0.14;
const HOVER_CUTOFF_HZ: f64 = 2400.0;
pub const HOVER_DURATION: f64 = 0.18;

/// Click noise length in milliseconds.
const CLICK_NOISE_MS: usize = 30;
const CLICK_NOISE_GAIN: f64 = 0.12;
/// Decay constant of the noise envelope over the buffer length.
const CLICK_NOISE_DECAY: f64 = 3.0;
const CLICK_BODY_START_HZ: f64 = 160.0;
const CLICK_BODY_END_HZ: f64 = 60.0;
const CLICK_BODY_GAIN: f64 = 0.03;
const CLICK_BODY_SWEEP: f64 = 0.22;
pub const CLICK_DURATION: f64 = 0.26;

/// Soft rising tone played when a tile gains hover or focus.
pub fn hover_graph(now: f64) -> Result<ToneGraph> {
    let mut frequency = ParamTimeline::anchored(HOVER_START_HZ, now);
    frequency.set_value_at_time(HOVER_START_HZ, now);
    frequency.exponential_ramp_to_value_at_time(HOVER_END_HZ, now + HOVER_SWEEP)?;

    let mut gain = ParamTimeline::anchored(1.0, now);
    gain.set_value_at_time(HOVER_FLOOR, now);
    gain.exponential_ramp_to_value_at_time(HOVER_PEAK, now + HOVER_ATTACK)?
        .exponential_ramp_to_value_at_time(HOVER_FLOOR, now + HOVER_RELEASE)?;

    let voice = Voice::new(
        Source::Oscillator {
            waveform: Waveform::Sine,
            frequency,
        },
        now,
        now + HOVER_DURATION,
    )
    .with_filter(Filter::Lowpass {
        frequency: HOVER_CUTOFF_HZ,
        q_db: DEFAULT_Q_DB,
    })
    .with_gain(gain);

    Ok(ToneGraph::new("hover", vec![voice]))
}

/// Short noise tick over a falling triangle body, played on activation.
pub fn click_graph<R: Rng>(now: f64, sample_rate: u32, rng: &mut R) -> Result<ToneGraph> {
    let noise_len = click_noise_len(sample_rate);
    let mut noise_gain = ParamTimeline::anchored(1.0, now);
    noise_gain.set_value_at_time(CLICK_NOISE_GAIN, now);
    let noise = Voice::new(
        Source::Buffer {
            samples: click_noise(noise_len, rng),
        },
        now,
        now + CLICK_NOISE_MS as f64 / 1000.0,
    )
    .with_gain(noise_gain);

    let mut frequency = ParamTimeline::anchored(CLICK_BODY_START_HZ, now);
    frequency.set_value_at_time(CLICK_BODY_START_HZ, now);
    frequency.exponential_ramp_to_value_at_time(CLICK_BODY_END_HZ, now + CLICK_BODY_SWEEP)?;
    let mut body_gain = ParamTimeline::anchored(1.0, now);
    body_gain.set_value_at_time(CLICK_BODY_GAIN, now);
    let body = Voice::new(
        Source::Oscillator {
            waveform: Waveform::Triangle,
            frequency,
        },
        now,
        now + CLICK_DURATION,
    )
    .with_gain(body_gain);

    Ok(ToneGraph::new("click", vec![noise, body]))
}

/// Samples in the click noise buffer: 30 ms at `sample_rate`, rounded down.
pub fn click_noise_len(sample_rate: u32) -> usize {
    sample_rate as usize * CLICK_NOISE_MS / 1000
}

/// Envelope bound of sample `index` in a noise buffer of `len` samples.
pub fn click_noise_envelope(index: usize, len: usize) -> f64 {
    (-CLICK_NOISE_DECAY * index as f64 / len.max(1) as f64).exp()
}

/// Uniform noise in `[-1, 1)` shaped by [`click_noise_envelope`].
pub fn click_noise<R: Rng>(len: usize, rng: &mut R) -> Vec<f32> {
    (0..len)
        .map(|index| {
            let white = rng.random::<f64>() * 2.0 - 1.0;
            (white * click_noise_envelope(index, len)) as f32
        })
        .collect()
}

/// Builds and schedules the interface tones.
///
/// Without an audio host both tones are silent no-ops. The host's context
/// state is left alone: resuming a suspended context is the caller's job.
pub struct SignalGenerator<H, R> {
    host: Option<H>,
    rng: R,
}

impl<H: AudioHost, R: Rng> SignalGenerator<H, R> {
    pub fn new(host: H, rng: R) -> Self {
        Self {
            host: Some(host),
            rng,
        }
    }

    pub fn detached(rng: R) -> Self {
        tracing::warn!("no audio host available; interface tones disabled");
        Self { host: None, rng }
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    pub fn hover_tone(&mut self) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        match hover_graph(host.current_time()) {
            Ok(graph) => {
                tracing::trace!(at = graph.start(), "hover tone");
                host.schedule(graph);
            }
            Err(err) => tracing::warn!(%err, "hover tone skipped"),
        }
    }

    pub fn click_tone(&mut self) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        match click_graph(host.current_time(), host.sample_rate(), &mut self.rng) {
            Ok(graph) => {
                tracing::trace!(at = graph.start(), "click tone");
                host.schedule(graph);
            }
            Err(err) => tracing::warn!(%err, "click tone skipped"),
        }
    }
}

impl<H, R> fmt::Debug for SignalGenerator<H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGenerator")
            .field("attached", &self.host.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Automation, ContextState, OfflineMixer};
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn generator(mixer: OfflineMixer) -> SignalGenerator<OfflineMixer, Pcg64Mcg> {
        SignalGenerator::new(mixer, Pcg64Mcg::seed_from_u64(3))
    }

    #[test]
    fn hover_graph_sweeps_and_stops_on_time() {
        let now = 2.5;
        let graph = hover_graph(now).unwrap();
        assert_eq!(graph.voices.len(), 1);

        let voice = &graph.voices[0];
        assert_eq!(voice.start, now);
        assert!((voice.stop - (now + 0.18)).abs() < 1e-12);
        assert!(matches!(
            voice.filter,
            Some(Filter::Lowpass { frequency, .. }) if frequency == 2400.0
        ));

        let Source::Oscillator { waveform, frequency } = &voice.source else {
            panic!("hover tone must be an oscillator");
        };
        assert_eq!(*waveform, Waveform::Sine);
        assert_eq!(
            frequency.events(),
            &[
                Automation::SetValue { value: 420.0, time: now },
                Automation::ExponentialRamp {
                    value: 820.0,
                    time: now + 0.09
                },
            ]
        );
        assert!((frequency.value_at(now + 0.09) - 820.0).abs() < 1e-9);
    }

    #[test]
    fn hover_gain_peaks_then_fades() {
        let graph = hover_graph(0.0).unwrap();
        let gain = &graph.voices[0].gain;
        assert!((gain.value_at(0.0) - 0.0001).abs() < 1e-12);
        assert!((gain.value_at(0.02) - 0.03).abs() < 1e-12);
        assert!((gain.value_at(0.14) - 0.0001).abs() < 1e-12);
        assert!(gain.value_at(0.08) < 0.03);
    }

    #[test]
    fn click_noise_has_expected_length_and_decays() {
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let graph = click_graph(0.0, 48_000, &mut rng).unwrap();
        assert_eq!(graph.voices.len(), 2);

        let Source::Buffer { samples } = &graph.voices[0].source else {
            panic!("first click voice must be the noise buffer");
        };
        let len = samples.len();
        assert_eq!(len, 1_440);
        assert!(samples[0].abs() <= 1.0);
        for (index, sample) in samples.iter().enumerate() {
            assert!(f64::from(sample.abs()) <= click_noise_envelope(index, len) + 1e-6);
        }
        assert!(click_noise_envelope(len - 1, len) < click_noise_envelope(0, len));
        assert_eq!(graph.voices[0].stop, 0.03);
    }

    #[test]
    fn click_body_falls_to_sixty_hertz() {
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let graph = click_graph(1.0, 44_100, &mut rng).unwrap();
        let body = &graph.voices[1];
        let Source::Oscillator { waveform, frequency } = &body.source else {
            panic!("click body must be an oscillator");
        };
        assert_eq!(*waveform, Waveform::Triangle);
        assert_eq!(frequency.value_at(1.0), 160.0);
        assert!((frequency.value_at(1.22) - 60.0).abs() < 1e-9);
        assert_eq!(body.gain.value_at(1.1), 0.03);
        assert!((body.stop - 1.26).abs() < 1e-12);
        assert_eq!(click_noise_len(44_100), 1_323);
    }

    /// Host that keeps every scheduled graph for inspection.
    struct RecordingHost {
        now: f64,
        graphs: Vec<ToneGraph>,
    }

    impl AudioHost for RecordingHost {
        fn current_time(&self) -> f64 {
            self.now
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn state(&self) -> ContextState {
            ContextState::Running
        }

        fn resume(&mut self) {}

        fn schedule(&mut self, graph: ToneGraph) {
            self.graphs.push(graph);
        }
    }

    #[test]
    fn hover_tone_schedules_at_host_time() {
        let host = RecordingHost {
            now: 0.5,
            graphs: Vec::new(),
        };
        let mut tones = SignalGenerator::new(host, Pcg64Mcg::seed_from_u64(3));
        tones.hover_tone();
        tones.click_tone();

        let graphs = &tones.host().unwrap().graphs;
        assert_eq!(graphs.len(), 2);
        let hover = &graphs[0].voices[0];
        assert_eq!(hover.start, 0.5);
        assert!((hover.stop - 0.68).abs() < 1e-12);
        let Source::Oscillator { frequency, .. } = &hover.source else {
            panic!("hover tone must be an oscillator");
        };
        assert_eq!(frequency.value_at(0.5), 420.0);
        assert!((frequency.value_at(0.59) - 820.0).abs() < 1e-9);

        let click = &graphs[1];
        assert_eq!(click.start(), 0.5);
        assert!((click.end() - 0.76).abs() < 1e-12);
        let Source::Buffer { samples } = &click.voices[0].source else {
            panic!("first click voice must be the noise buffer");
        };
        assert_eq!(samples.len(), 1_440);
    }

    #[test]
    fn hover_tone_reaches_mixer() {
        let mut mixer = OfflineMixer::new(8_000);
        mixer.render_seconds(0.5);
        let mut tones = generator(mixer);

        tones.hover_tone();
        let host = tones.host().unwrap();
        assert_eq!(host.active_voices(), 1);
        assert_eq!(host.scheduled_voices(), 1);
    }

    #[test]
    fn detached_generator_is_silent() {
        let mut tones: SignalGenerator<OfflineMixer, _> =
            SignalGenerator::detached(Pcg64Mcg::seed_from_u64(1));
        tones.hover_tone();
        tones.click_tone();
        assert!(tones.host().is_none());
    }

    #[test]
    fn rapid_hovers_are_all_released() {
        let mut tones = generator(OfflineMixer::new(8_000));
        for _ in 0..500 {
            tones.hover_tone();
            tones.click_tone();
            tones.host_mut().unwrap().render_seconds(0.005);
        }
        let host = tones.host_mut().unwrap();
        assert!(host.active_voices() > 0);

        host.render_seconds(0.5);
        assert_eq!(host.active_voices(), 0);
        assert_eq!(host.scheduled_voices(), 1_500);
    }

    #[test]
    fn rendered_hover_tone_stays_quiet() {
        let mut tones = generator(OfflineMixer::new(48_000));
        tones.hover_tone();
        let out = tones.host_mut().unwrap().render_seconds(0.2);
        let peak = out.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.0);
        assert!(peak < 0.05);
    }
}

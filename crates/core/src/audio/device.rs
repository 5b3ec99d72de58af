use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::{
    audio::{AudioHost, ContextState, OfflineMixer, ToneGraph},
    DeckError, Result,
};

/// Hard limit applied to every output sample.
const OUTPUT_LIMIT: f32 = 0.5;

/// Audio host backed by the default output device.
///
/// Voices are mixed by an [`OfflineMixer`] shared with the device callback,
/// so the context clock advances with the samples the device consumes. The
/// context starts suspended until [`AudioHost::resume`] is called.
pub struct DeviceHost {
    mixer: Arc<Mutex<OfflineMixer>>,
    sample_rate: u32,
    channels: usize,
    _stream: cpal::Stream,
}

impl DeviceHost {
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| DeckError::msg("no audio output device found"))?;
        let supported = device
            .default_output_config()
            .map_err(|err| DeckError::msg(format!("failed to query output config: {err}")))?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(DeckError::msg(format!(
                "unsupported output sample format {:?}",
                supported.sample_format()
            )));
        }

        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0;
        let channels = usize::from(config.channels.max(1));
        let mixer = Arc::new(Mutex::new(OfflineMixer::suspended(sample_rate)));

        let shared = Arc::clone(&mixer);
        let mut mono = Vec::new();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mono.resize(data.len() / channels, 0.0);
                    match shared.lock() {
                        Ok(mut mixer) => mixer.render(&mut mono),
                        Err(_) => mono.fill(0.0),
                    }
                    interleave(&mono, data, channels);
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(|err| DeckError::msg(format!("failed to build audio stream: {err}")))?;
        stream
            .play()
            .map_err(|err| DeckError::msg(format!("failed to start audio stream: {err}")))?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels,
            "audio output opened"
        );
        Ok(Self {
            mixer,
            sample_rate,
            channels,
            _stream: stream,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Voices still playing on the device.
    pub fn active_voices(&self) -> usize {
        self.with_mixer(0, |mixer| mixer.active_voices())
    }

    pub fn scheduled_voices(&self) -> u64 {
        self.with_mixer(0, |mixer| mixer.scheduled_voices())
    }

    fn with_mixer<T>(&self, fallback: T, f: impl FnOnce(&mut OfflineMixer) -> T) -> T {
        match self.mixer.lock() {
            Ok(mut mixer) => f(&mut mixer),
            Err(_) => {
                tracing::warn!("audio mixer poisoned");
                fallback
            }
        }
    }
}

impl AudioHost for DeviceHost {
    fn current_time(&self) -> f64 {
        self.with_mixer(0.0, |mixer| mixer.current_time())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn state(&self) -> ContextState {
        self.with_mixer(ContextState::Closed, |mixer| mixer.state())
    }

    fn resume(&mut self) {
        self.with_mixer((), |mixer| mixer.resume());
    }

    fn schedule(&mut self, graph: ToneGraph) {
        self.with_mixer((), |mixer| mixer.schedule(graph));
    }
}

impl std::fmt::Debug for DeviceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHost")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Copies a mono block into every channel of an interleaved buffer.
fn interleave(mono: &[f32], data: &mut [f32], channels: usize) {
    for (frame, sample) in data.chunks_mut(channels).zip(mono) {
        frame.fill(sample.clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT));
    }
}

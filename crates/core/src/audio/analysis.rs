use std::f32::consts::PI;

use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

use crate::{DeckError, Result};

/// Level and brightness summary of a rendered tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    pub sample_rate: u32,
    pub duration_seconds: f32,
    pub rms: f32,
    pub peak: f32,
    /// Magnitude-weighted mean frequency of the Hann-windowed spectrum.
    pub spectral_centroid_hz: f32,
}

/// Analyses a mono block of samples in one FFT pass.
pub fn analyse(samples: &[f32], sample_rate: u32) -> Result<ToneAnalysis> {
    if samples.len() < 2 {
        return Err(DeckError::InvalidParameter(
            "analysis requires blocks with at least two samples",
        ));
    }
    if sample_rate == 0 {
        return Err(DeckError::InvalidParameter("sample rate must be non-zero"));
    }

    Ok(ToneAnalysis {
        sample_rate,
        duration_seconds: samples.len() as f32 / sample_rate as f32,
        rms: compute_rms(samples),
        peak: samples.iter().fold(0.0_f32, |peak, s| peak.max(s.abs())),
        spectral_centroid_hz: spectral_centroid(samples, sample_rate)?,
    })
}

fn spectral_centroid(samples: &[f32], sample_rate: u32) -> Result<f32> {
    let len = samples.len();
    let mut planner = RealFftPlanner::<f32>::new();
    let plan = planner.plan_fft_forward(len);
    let mut input = plan.make_input_vec();
    let mut spectrum = plan.make_output_vec();
    let mut scratch = plan.make_scratch_vec();

    for (index, value) in samples.iter().enumerate() {
        input[index] = *value * hann_value(index, len);
    }
    plan.process_with_scratch(&mut input, &mut spectrum, &mut scratch)?;

    let bin_hz = sample_rate as f32 / len as f32;
    let mut magnitude_sum = 0.0;
    let mut weighted_sum = 0.0;
    for (i, bin) in spectrum.iter().enumerate() {
        let magnitude = bin.norm();
        magnitude_sum += magnitude;
        weighted_sum += magnitude * (i as f32 * bin_hz);
    }

    if magnitude_sum <= f32::EPSILON {
        Ok(0.0)
    } else {
        Ok(weighted_sum / magnitude_sum)
    }
}

fn compute_rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as f32).sqrt()
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_no_energy() {
        let report = analyse(&[0.0; 1024], 48_000).unwrap();
        assert_eq!(report.rms, 0.0);
        assert_eq!(report.peak, 0.0);
        assert_eq!(report.spectral_centroid_hz, 0.0);
    }

    #[test]
    fn pure_tone_centroid_matches_frequency() {
        // 1 kHz at 48 kHz repeats every 48 samples.
        let samples: Vec<f32> = (0..48_000)
            .map(|n| (2.0 * PI * (n % 48) as f32 / 48.0).sin())
            .collect();
        let report = analyse(&samples, 48_000).unwrap();

        assert!((report.spectral_centroid_hz - 1_000.0).abs() < 50.0);
        assert!((report.rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
        assert!((report.duration_seconds - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_tiny_blocks() {
        assert!(matches!(
            analyse(&[0.5], 48_000),
            Err(DeckError::InvalidParameter(_))
        ));
    }
}

//! FFT analyzer producing byte frequency data from time-domain samples.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};

/// Analyzer settings, mirrored in the `analyzer` section of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Transform window in samples. Must be a power of two.
    pub fft_size: usize,
    /// Weight of the previous frame when smoothing magnitudes (0.0 = none).
    pub smoothing: f32,
    /// Magnitude mapped to byte 0.
    pub min_decibels: f32,
    /// Magnitude mapped to byte 255.
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 256, // 128 bins
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    /// Number of frequency bins produced per snapshot.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Check the settings before a graph is built from them.
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(format!(
                "fft_size must be a power of two between 32 and 32768, got {}",
                self.fft_size
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(format!(
                "smoothing must be within [0, 1], got {}",
                self.smoothing
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ));
        }
        Ok(())
    }
}

/// Windowed FFT with temporal smoothing and decibel-to-byte mapping.
pub struct Analyzer {
    config: AnalyzerConfig,
    fft: Arc<dyn Fft<f32>>,
    /// Hann window coefficients, one per input sample
    window: Vec<f32>,
    /// Smoothed linear magnitudes carried between frames
    smoothed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl Analyzer {
    /// Build an analyzer. Callers are expected to have validated `config`.
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_size = config.fft_size.next_power_of_two().clamp(32, 32768);
        let config = AnalyzerConfig { fft_size, ..config };

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Self {
            config,
            fft,
            window,
            smoothed: vec![0.0; fft_size / 2],
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Forget smoothing history, e.g. after the source changed.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|m| *m = 0.0);
    }

    /// Analyze the most recent `fft_size` samples and write byte magnitudes into `out`.
    ///
    /// Fewer samples than the window are zero-padded at the front. Bins past
    /// `out.len()` are dropped and missing bins are left untouched.
    pub fn process(&mut self, samples: &[f32], out: &mut [u8]) {
        let fft_size = self.config.fft_size;
        let recent = &samples[samples.len().saturating_sub(fft_size)..];
        let pad = fft_size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let scale = 1.0 / fft_size as f32;
        let tau = self.config.smoothing;
        let db_range = self.config.max_decibels - self.config.min_decibels;

        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let c = self.buffer[k];
            let magnitude = (c.re * c.re + c.im * c.im).sqrt() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            if let Some(byte) = out.get_mut(k) {
                let db = 20.0 * smoothed.max(1e-10).log10();
                let normalized = (db - self.config.min_decibels) / db_range;
                *byte = (normalized * 255.0).clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(bin: usize, fft_size: usize, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * bin as f32 * n as f32 / fft_size as f32).sin())
            .collect()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 128);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let odd = AnalyzerConfig {
            fft_size: 300,
            ..Default::default()
        };
        assert!(odd.validate().is_err());

        let inverted = AnalyzerConfig {
            min_decibels: -10.0,
            max_decibels: -20.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_silence_maps_to_zero() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        let mut out = vec![7u8; analyzer.frequency_bin_count()];
        analyzer.process(&vec![0.0; 1024], &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        let samples = tone(10, 256, 0.01, 256);
        let mut out = vec![0u8; analyzer.frequency_bin_count()];

        for _ in 0..20 {
            analyzer.process(&samples, &mut out);
        }

        let peak = out
            .iter()
            .enumerate()
            .max_by_key(|&(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 10);
        assert!(out[10] > 0);
        assert_eq!(out[40], 0);
    }

    #[test]
    fn test_short_input_is_padded() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        let mut out = vec![0u8; 128];
        // Must not panic with fewer samples than the window
        analyzer.process(&[0.5, -0.5, 0.25], &mut out);
        analyzer.process(&[], &mut out);
    }

    #[test]
    fn test_smoothing_decays_after_signal_stops() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default());
        let loud = tone(10, 256, 0.01, 256);
        let mut out = vec![0u8; 128];
        for _ in 0..20 {
            analyzer.process(&loud, &mut out);
        }
        let before = out[10];

        analyzer.process(&vec![0.0; 256], &mut out);
        assert!(out[10] < before);

        analyzer.reset();
        analyzer.process(&vec![0.0; 256], &mut out);
        assert_eq!(out[10], 0);
    }
}

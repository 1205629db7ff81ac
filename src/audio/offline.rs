//! Headless backend: decodes a whole file up front and steps through it one
//! frame at a time, without touching an output device.

use std::fs::File;
use std::io::BufReader;

use log::info;
use rodio::{Decoder, Source};

use super::analyzer::{Analyzer, AnalyzerConfig};
use super::detection::probe_audio;
use super::provider::{AnalysisGraph, AudioBackend, AudioSource, SpectrumInput};
use crate::error::GraphError;

/// Backend used for frame export; each snapshot advances `1 / fps` seconds.
#[derive(Debug, Clone, Copy)]
pub struct OfflineBackend {
    fps: u32,
}

impl OfflineBackend {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }
}

impl AudioBackend for OfflineBackend {
    fn open_graph(
        &mut self,
        source: &AudioSource,
        config: &AnalyzerConfig,
    ) -> Result<Box<dyn AnalysisGraph>, GraphError> {
        config.validate().map_err(GraphError::Construction)?;
        probe_audio(source.path())?;

        let file = File::open(source.path())
            .map_err(|e| GraphError::Construction(format!("{}: {}", source.display_name(), e)))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| GraphError::Construction(format!("{}: {}", source.display_name(), e)))?;

        let channels = decoder.channels().max(1) as usize;
        let sample_rate = decoder.sample_rate();
        let interleaved: Vec<f32> = decoder.convert_samples::<f32>().collect();
        let mono: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        info!(
            "offline: decoded {} ({} samples @ {} Hz)",
            source.display_name(),
            mono.len(),
            sample_rate
        );
        Ok(Box::new(OfflineGraph::from_samples(
            mono,
            sample_rate,
            self.fps,
            *config,
        )))
    }
}

/// Pre-decoded mono signal with a cursor that moves one frame per snapshot.
pub struct OfflineGraph {
    samples: Vec<f32>,
    hop: usize,
    cursor: usize,
    analyzer: Analyzer,
    connected: bool,
}

impl OfflineGraph {
    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        fps: u32,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            samples,
            hop: (sample_rate / fps.max(1)).max(1) as usize,
            cursor: 0,
            analyzer: Analyzer::new(config),
            connected: true,
        }
    }

    /// Number of snapshots until the signal is exhausted.
    pub fn frames_remaining(&self) -> usize {
        self.samples.len().saturating_sub(self.cursor).div_ceil(self.hop)
    }
}

impl SpectrumInput for OfflineGraph {
    fn frequency_bin_count(&self) -> usize {
        self.analyzer.frequency_bin_count()
    }

    fn get_byte_frequency_data(&mut self, buffer: &mut [u8]) {
        self.cursor = (self.cursor + self.hop).min(self.samples.len());
        let window = if self.cursor >= self.samples.len() {
            &[][..]
        } else {
            &self.samples[..self.cursor]
        };
        self.analyzer.process(window, buffer);
    }
}

impl AnalysisGraph for OfflineGraph {
    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> Result<(), GraphError> {
        self.connected = false;
        self.samples = Vec::new();
        Ok(())
    }
}

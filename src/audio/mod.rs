//! Audio module - analysis graphs, backends and spectrum snapshots.

pub mod analyzer;
pub mod detection;
pub mod metadata;
pub mod offline;
pub mod playback;
pub mod provider;
pub mod sample_capture;
pub mod spectrum;

// Re-export commonly used types
pub use analyzer::{Analyzer, AnalyzerConfig};
pub use metadata::{TrackInfo, load_track_info};
pub use offline::OfflineBackend;
pub use playback::RodioBackend;
pub use provider::{
    AnalysisGraph, AnalyzerHandle, AudioBackend, AudioSource, BindTicket, SpectrumInput,
    SpectrumProvider,
};
pub use spectrum::Spectrum;

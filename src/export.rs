//! Headless frame export: drives the engine with a stepped clock and writes
//! every frame to a numbered PNG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::audio::{AnalyzerConfig, AudioSource, OfflineBackend};
use crate::engine::Engine;
use crate::render::scheduler::{FrameClock, FrameOutcome};
use crate::render::{PixelCanvas, StyleKind};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub source: PathBuf,
    pub out_dir: PathBuf,
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub style: StyleKind,
    pub seed: u64,
    pub analyzer: AnalyzerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: u32,
    pub skipped: u32,
}

pub fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{:05}.png", index))
}

/// Render `options.frames` frames of `options.source` into `options.out_dir`.
pub fn export_frames(options: &ExportOptions) -> Result<ExportSummary> {
    if options.width == 0 || options.height == 0 {
        bail!("frame size must be non-zero, got {}x{}", options.width, options.height);
    }
    std::fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("failed to create {}", options.out_dir.display()))?;

    let fps = options.fps.max(1);
    let mut engine: Engine<OfflineBackend, PixelCanvas> =
        Engine::new(OfflineBackend::new(fps), options.analyzer, options.seed);
    engine.set_style(options.style);
    engine.on_mount(
        options.width,
        options.height,
        AudioSource::from_path(&options.source),
    );
    if let Some(err) = engine.status().error {
        engine.on_unmount();
        bail!("cannot analyze {}: {}", options.source.display(), err);
    }

    info!(
        "export: {} frames of {} at {}x{} ({} fps) into {}",
        options.frames,
        options.style,
        options.width,
        options.height,
        fps,
        options.out_dir.display()
    );

    let mut clock = FrameClock::manual();
    let step_ms = 1000.0 / fps as f64;
    let mut summary = ExportSummary {
        written: 0,
        skipped: 0,
    };

    for index in 0..options.frames {
        match engine.pump(clock.now_ms()) {
            Some(FrameOutcome::Drawn) => {
                let canvas = engine.surface().context("surface vanished during export")?;
                let path = frame_path(&options.out_dir, index);
                canvas
                    .save_png(&path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                debug!("export: wrote {}", path.display());
                summary.written += 1;
            }
            outcome => {
                debug!("export: frame {} not drawn ({:?})", index, outcome);
                summary.skipped += 1;
            }
        }
        clock.advance(step_ms);
    }

    engine.on_unmount();
    info!("export: {} written, {} skipped", summary.written, summary.skipped);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_names_are_zero_padded() {
        let path = frame_path(Path::new("out"), 42);
        assert_eq!(path, Path::new("out").join("frame_00042.png"));
    }

    #[test]
    fn test_missing_source_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            source: PathBuf::from("/no/such/track.wav"),
            out_dir: dir.path().join("frames"),
            frames: 3,
            width: 32,
            height: 18,
            fps: 30,
            style: StyleKind::Wave,
            seed: 0,
            analyzer: AnalyzerConfig::default(),
        };
        let err = export_frames(&options).unwrap_err();
        assert!(err.to_string().contains("cannot analyze"));
        assert!(!frame_path(&options.out_dir, 0).exists());
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            source: PathBuf::from("a.wav"),
            out_dir: dir.path().to_path_buf(),
            frames: 1,
            width: 0,
            height: 10,
            fps: 30,
            style: StyleKind::Wave,
            seed: 0,
            analyzer: AnalyzerConfig::default(),
        };
        assert!(export_frames(&options).is_err());
    }
}

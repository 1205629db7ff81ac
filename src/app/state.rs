// src/app/state.rs
//! Application state for the terminal player.

use std::{
    path::PathBuf,
    sync::mpsc::{Receiver, Sender},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use crossterm::event::KeyEvent;
use log::{info, warn};
use ratatui::Frame;

use crate::{
    audio::{AudioBackend, AudioSource, TrackInfo, load_track_info},
    config::AppConfig,
    engine::Engine,
    render::{FrameClock, PixelCanvas, StyleKind},
    ui::{
        keybindings::{PlayerAction, key_to_action},
        layout::compute_layout,
        widgets::{Raster, StatusView, render_status_bar},
    },
};

/// Main application state.
pub struct App<B: AudioBackend> {
    pub engine: Engine<B, PixelCanvas>,
    source: AudioSource,
    clock: FrameClock,
    target_fps: u32,

    /// Tags loaded in the background
    track: Option<TrackInfo>,
    meta_tx: Sender<TrackInfo>,
    meta_rx: Receiver<TrackInfo>,

    /// Playback position, advanced by the frame clock while audio runs
    elapsed_ms: f64,
    last_tick_ms: Option<f64>,

    snapshot_dir: PathBuf,
    snapshots: u32,
    notice: Option<String>,
}

impl<B: AudioBackend> App<B> {
    pub fn new(backend: B, config: &AppConfig, source: AudioSource, style: StyleKind, seed: u64) -> Self {
        let mut engine = Engine::new(backend, config.analyzer, seed);
        engine.set_style(style);
        let (meta_tx, meta_rx) = std::sync::mpsc::channel::<TrackInfo>();

        Self {
            engine,
            source,
            clock: FrameClock::monotonic(),
            target_fps: config.display.target_fps.max(1),
            track: None,
            meta_tx,
            meta_rx,
            elapsed_ms: 0.0,
            last_tick_ms: None,
            snapshot_dir: PathBuf::from("."),
            snapshots: 0,
            notice: None,
        }
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps as f64)
    }

    /// Mount the engine on a raster of `width`x`height` pixels and start
    /// loading the track tags.
    pub fn mount(&mut self, width: u32, height: u32) {
        self.engine.on_mount(width, height, self.source.clone());
        self.load_metadata();
    }

    /// Keep the surface matched to the raster area.
    pub fn sync_size(&mut self, width: u32, height: u32) {
        self.engine.on_resize(width, height);
    }

    /// Advance the clock and deliver due frames.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        if let Some(last) = self.last_tick_ms {
            if self.engine.is_ready() && !self.engine.provider().is_paused() {
                self.elapsed_ms += (now - last).max(0.0);
            }
        }
        self.last_tick_ms = Some(now);
        self.engine.pump(now);
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    /// Handle a key event and return true if the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        match key_to_action(&key) {
            PlayerAction::NextStyle => {
                let kind = self.engine.next_style();
                self.notice = Some(format!("style: {}", kind));
            }
            PlayerAction::PreviousStyle => {
                let kind = self.engine.previous_style();
                self.notice = Some(format!("style: {}", kind));
            }
            PlayerAction::TogglePause => {
                let paused = self.engine.toggle_pause();
                self.notice = Some(if paused { "paused" } else { "playing" }.to_string());
            }
            PlayerAction::Snapshot => {
                self.notice = Some(match self.snapshot() {
                    Ok(path) => format!("saved {}", path.display()),
                    Err(err) => {
                        warn!("snapshot: {:#}", err);
                        format!("snapshot failed: {}", err)
                    }
                });
            }
            PlayerAction::RetryBind => {
                if self.engine.retry_bind().is_ok() {
                    self.elapsed_ms = 0.0;
                    self.notice = Some("audio ready".to_string());
                }
            }
            PlayerAction::Quit => {
                self.engine.on_unmount();
                return true;
            }
            PlayerAction::None => {}
        }
        false
    }

    /// Write the current raster to a PNG in the snapshot directory.
    pub fn snapshot(&mut self) -> Result<PathBuf> {
        let canvas = self.engine.surface().context("no surface mounted")?;
        let style = self.engine.style_kind().map_or("none", |k| k.key());
        self.snapshots += 1;
        let path = self
            .snapshot_dir
            .join(format!("auralux-{}-{:03}.png", style, self.snapshots));
        canvas
            .save_png(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("snapshot: {}", path.display());
        Ok(path)
    }

    /// Draw the application UI.
    pub fn draw(&mut self, f: &mut Frame<'_>) {
        let layout = compute_layout(f.area());
        if let Some(canvas) = self.engine.surface() {
            f.render_widget(Raster::new(canvas), layout.raster);
        }

        if let Some(area) = layout.status {
            let status = self.engine.status();
            let track = self.track_label();
            let view = StatusView {
                track: &track,
                elapsed: (self.elapsed_ms / 1000.0) as u64,
                duration: self.track.as_ref().map_or(0, |t| t.duration_secs),
                notice: self.notice.as_deref(),
            };
            render_status_bar(f, area, &status, &view);
        }
    }

    pub fn track_label(&self) -> String {
        let fallback = self.source.display_name();
        self.track
            .as_ref()
            .map_or_else(|| fallback.clone(), |t| t.label(&fallback))
    }

    /// Process any pending metadata from background loader.
    pub fn process_metadata(&mut self) {
        if let Ok(info) = self.meta_rx.try_recv() {
            self.track = Some(info);
        }
    }

    fn load_metadata(&self) {
        let tx = self.meta_tx.clone();
        let path = self.source.path().to_path_buf();
        thread::spawn(move || match load_track_info(&path) {
            Ok(info) => {
                let _ = tx.send(info);
            }
            Err(err) => warn!("metadata: {}: {}", path.display(), err),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AnalysisGraph, AnalyzerConfig, SpectrumInput};
    use crate::error::GraphError;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::path::Path;

    struct LoudGraph;

    impl SpectrumInput for LoudGraph {
        fn frequency_bin_count(&self) -> usize {
            128
        }

        fn get_byte_frequency_data(&mut self, buffer: &mut [u8]) {
            buffer.fill(200);
        }
    }

    impl AnalysisGraph for LoudGraph {
        fn disconnect(&mut self) -> Result<(), GraphError> {
            Ok(())
        }
    }

    struct LoudBackend;

    impl AudioBackend for LoudBackend {
        fn open_graph(
            &mut self,
            _source: &AudioSource,
            _config: &AnalyzerConfig,
        ) -> Result<Box<dyn AnalysisGraph>, GraphError> {
            Ok(Box::new(LoudGraph))
        }
    }

    fn app(dir: &Path) -> App<LoudBackend> {
        let mut app = App::new(
            LoudBackend,
            &AppConfig::default(),
            AudioSource::from_path("/music/track.flac"),
            StyleKind::Retro,
            1,
        )
        .with_snapshot_dir(dir)
        .with_clock(FrameClock::manual());
        app.mount(64, 32);
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_style_keys_cycle_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert!(!app.on_key(key(KeyCode::Right)));
        assert_eq!(app.engine.style_kind(), Some(StyleKind::Minimal));
        app.on_key(key(KeyCode::Left));
        app.on_key(key(KeyCode::Left));
        assert_eq!(app.engine.style_kind(), Some(StyleKind::Nature));
    }

    #[test]
    fn test_snapshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.tick();
        app.clock_mut().advance(33.0);
        app.tick();

        app.on_key(key(KeyCode::Char('x')));
        let path = dir.path().join("auralux-retro-001.png");
        assert!(path.exists());
        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (64, 32));
    }

    #[test]
    fn test_elapsed_follows_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        app.tick();
        app.clock_mut().advance(2500.0);
        app.tick();
        assert!((app.elapsed_ms - 2500.0).abs() < 1e-9);
        assert_eq!(app.engine.stats().drawn, 2);
    }

    #[test]
    fn test_quit_unmounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        assert!(app.on_key(key(KeyCode::Char('q'))));
        assert!(!app.engine.is_running());
        assert!(app.engine.surface().is_none());
    }

    #[test]
    fn test_track_label_falls_back_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        assert_eq!(app.track_label(), "track.flac");
    }
}

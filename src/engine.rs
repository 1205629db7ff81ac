//! The visualizer engine: one spectrum provider, one frame loop, one surface
//! and the active style, driven through the host lifecycle hooks.

use log::{debug, info, warn};

use crate::audio::{AnalyzerConfig, AnalyzerHandle, AudioBackend, AudioSource, SpectrumProvider};
use crate::error::GraphError;
use crate::render::host::SurfaceHost;
use crate::render::scheduler::{FrameContext, FrameOutcome, FrameQueue, FrameScheduler, FrameToken};
use crate::render::styles::{Style, StyleKind};
use crate::render::surface::Surface;

/// Frame counters since mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: u64,
    pub skipped: u64,
}

/// Snapshot of engine state for a status line.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    pub style: Option<StyleKind>,
    pub source: Option<String>,
    pub ready: bool,
    pub running: bool,
    pub paused: bool,
    pub intensity: f32,
    /// Why the last bind failed, if the provider is not ready.
    pub error: Option<String>,
    pub stats: FrameStats,
}

pub struct Engine<B: AudioBackend, S: Surface + Default> {
    provider: SpectrumProvider<B>,
    scheduler: FrameScheduler,
    frames: FrameQueue,
    host: SurfaceHost<S>,
    style_kind: Option<StyleKind>,
    style: Option<Box<dyn Style>>,
    source: Option<AudioSource>,
    seed: u64,
    /// Generators built so far; mixed into each new generator's seed.
    created: u64,
    last_error: Option<GraphError>,
    intensity: f32,
    stats: FrameStats,
}

impl<B: AudioBackend, S: Surface + Default> Engine<B, S> {
    pub fn new(backend: B, config: AnalyzerConfig, seed: u64) -> Self {
        Self {
            provider: SpectrumProvider::new(backend, config),
            scheduler: FrameScheduler::new(),
            frames: FrameQueue::new(),
            host: SurfaceHost::new(),
            style_kind: None,
            style: None,
            source: None,
            seed,
            created: 0,
            last_error: None,
            intensity: 0.0,
            stats: FrameStats::default(),
        }
    }

    /// Mount a fresh surface, bind `source` and start the frame loop.
    ///
    /// A failed bind is recorded and logged; the loop still runs but every
    /// frame is skipped until [`Engine::retry_bind`] succeeds.
    pub fn on_mount(&mut self, width: u32, height: u32, source: AudioSource) {
        info!(
            "engine: mount {}x{} with {}",
            width,
            height,
            source.display_name()
        );
        self.host.mount(S::default(), width, height);
        self.stats = FrameStats::default();
        self.source = Some(source);
        if let Some(kind) = self.style_kind {
            self.set_style(kind);
        }
        if let Err(err) = self.bind_current() {
            warn!("engine: audio unavailable: {}", err);
        }
        self.scheduler.start(&mut self.frames);
    }

    /// Select a style by key. Unknown keys leave no active style, so frames
    /// are skipped until a valid key arrives. Re-selecting the active style
    /// keeps its state.
    pub fn on_style_change(&mut self, key: &str) -> Option<StyleKind> {
        let kind = StyleKind::from_key(key);
        match kind {
            Some(kind) => self.set_style(kind),
            None => {
                warn!("engine: unknown style '{}'", key);
                self.style_kind = None;
                self.style = None;
            }
        }
        kind
    }

    pub fn set_style(&mut self, kind: StyleKind) {
        if self.style_kind == Some(kind) && self.style.is_some() {
            return;
        }
        let seed = self.seed.wrapping_add(self.created);
        self.created += 1;
        debug!("engine: style {} (seed {})", kind, seed);
        self.style_kind = Some(kind);
        self.style = Some(kind.create(seed));
    }

    pub fn next_style(&mut self) -> StyleKind {
        let kind = self.style_kind.map_or(StyleKind::ALL[0], StyleKind::next);
        self.set_style(kind);
        kind
    }

    pub fn previous_style(&mut self) -> StyleKind {
        let kind = self
            .style_kind
            .map_or(StyleKind::ALL[StyleKind::ALL.len() - 1], StyleKind::previous);
        self.set_style(kind);
        kind
    }

    /// The next frame reads the new size; the loop is not interrupted.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.host.resize(width, height);
    }

    /// Stop the loop, release the analysis graph and hand back the surface.
    pub fn on_unmount(&mut self) -> Option<S> {
        info!("engine: unmount");
        self.scheduler.stop(&mut self.frames);
        self.provider.release();
        self.style = None;
        self.intensity = 0.0;
        self.host.unmount()
    }

    /// Deliver every frame callback due at `now_ms`. Callbacks requested
    /// while delivering wait for the next pump.
    pub fn pump(&mut self, now_ms: f64) -> Option<FrameOutcome> {
        let due = self.frames.len();
        let mut last = None;
        for _ in 0..due {
            let Some(token) = self.frames.pop() else {
                break;
            };
            last = Some(self.deliver_frame(token, now_ms));
        }
        last
    }

    /// Run one frame callback.
    pub fn deliver_frame(&mut self, token: FrameToken, now_ms: f64) -> FrameOutcome {
        let provider = &mut self.provider;
        let host = &mut self.host;
        let style = &mut self.style;
        let intensity = &mut self.intensity;

        let outcome = self.scheduler.on_frame(token, now_ms, &mut self.frames, |timing| {
            let Some(spectrum) = provider.current_spectrum() else {
                *intensity = 0.0;
                return FrameOutcome::Skipped;
            };
            *intensity = spectrum.intensity();
            if !host.is_mounted() {
                return FrameOutcome::Skipped;
            }
            let Some(style) = style.as_mut() else {
                return FrameOutcome::Skipped;
            };
            let Ok(surface) = host.begin_frame() else {
                return FrameOutcome::Skipped;
            };
            let frame = FrameContext::new(surface.width(), surface.height(), spectrum, timing);
            style.render(surface, &frame);
            FrameOutcome::Drawn
        });

        match outcome {
            FrameOutcome::Drawn => self.stats.drawn += 1,
            FrameOutcome::Skipped => self.stats.skipped += 1,
            FrameOutcome::Stale => {}
        }
        outcome
    }

    /// Try binding the mounted source again, typically after a device error.
    pub fn retry_bind(&mut self) -> Result<AnalyzerHandle, GraphError> {
        let result = self.bind_current();
        match &result {
            Ok(handle) => info!("engine: retry bound {} bins", handle.bin_count),
            Err(err) => warn!("engine: retry failed: {}", err),
        }
        result
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.provider.set_paused(paused);
    }

    pub fn toggle_pause(&mut self) -> bool {
        let paused = !self.provider.is_paused();
        self.set_paused(paused);
        paused
    }

    pub fn is_ready(&self) -> bool {
        self.provider.is_ready()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn style_kind(&self) -> Option<StyleKind> {
        self.style_kind
    }

    pub fn style(&self) -> Option<&dyn Style> {
        self.style.as_deref()
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    pub fn surface(&self) -> Option<&S> {
        self.host.surface().ok()
    }

    pub fn provider(&self) -> &SpectrumProvider<B> {
        &self.provider
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn status(&self) -> EngineStatus {
        let ready = self.provider.is_ready();
        EngineStatus {
            style: self.style_kind,
            source: self.source.as_ref().map(AudioSource::display_name),
            ready,
            running: self.scheduler.is_running(),
            paused: self.provider.is_paused(),
            intensity: self.intensity,
            error: if ready {
                None
            } else {
                self.last_error.as_ref().map(ToString::to_string)
            },
            stats: self.stats,
        }
    }

    fn bind_current(&mut self) -> Result<AnalyzerHandle, GraphError> {
        let Some(source) = self.source.clone() else {
            let err = GraphError::Construction("no audio source mounted".into());
            self.last_error = Some(err.clone());
            return Err(err);
        };
        match self.provider.bind(&source) {
            Ok(handle) => {
                self.last_error = None;
                Ok(handle)
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

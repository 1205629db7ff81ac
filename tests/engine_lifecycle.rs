//! Graph ownership and frame-loop cancellation through the public engine API.

use std::cell::Cell;
use std::rc::Rc;

use auralux::audio::{
    AnalysisGraph, AnalyzerConfig, AudioBackend, AudioSource, SpectrumInput, SpectrumProvider,
};
use auralux::engine::Engine;
use auralux::error::GraphError;
use auralux::render::styles::mandelbrot_escape;
use auralux::render::{
    FrameHost, FrameOutcome, FrameQueue, FrameScheduler, FrameToken, RecordingSurface, Surface,
};

/// Counts graphs that were opened and not yet disconnected.
#[derive(Clone, Default)]
struct CountingBackend {
    live: Rc<Cell<usize>>,
    level: u8,
}

struct CountingGraph {
    live: Rc<Cell<usize>>,
    connected: bool,
    level: u8,
}

impl SpectrumInput for CountingGraph {
    fn frequency_bin_count(&self) -> usize {
        128
    }

    fn get_byte_frequency_data(&mut self, buffer: &mut [u8]) {
        buffer.fill(self.level);
    }
}

impl AnalysisGraph for CountingGraph {
    fn disconnect(&mut self) -> Result<(), GraphError> {
        if self.connected {
            self.connected = false;
            self.live.set(self.live.get() - 1);
        }
        Ok(())
    }
}

impl AudioBackend for CountingBackend {
    fn open_graph(
        &mut self,
        _source: &AudioSource,
        _config: &AnalyzerConfig,
    ) -> Result<Box<dyn AnalysisGraph>, GraphError> {
        self.live.set(self.live.get() + 1);
        Ok(Box::new(CountingGraph {
            live: self.live.clone(),
            connected: true,
            level: self.level,
        }))
    }
}

fn backend(level: u8) -> (CountingBackend, Rc<Cell<usize>>) {
    let backend = CountingBackend {
        live: Rc::new(Cell::new(0)),
        level,
    };
    let live = backend.live.clone();
    (backend, live)
}

#[test]
fn test_rebinding_keeps_exactly_one_graph() {
    let (backend, live) = backend(10);
    let mut provider = SpectrumProvider::new(backend, AnalyzerConfig::default());
    for name in ["a.mp3", "b.mp3", "c.mp3", "a.mp3"] {
        provider.bind(&AudioSource::from_path(name)).unwrap();
        assert_eq!(live.get(), 1);
    }
    provider.release();
    provider.release();
    assert_eq!(live.get(), 0);
}

#[test]
fn test_late_bind_after_release_leaves_nothing_live() {
    let (backend, live) = backend(10);
    let mut provider = SpectrumProvider::new(backend, AnalyzerConfig::default());
    let source = AudioSource::from_path("slow.flac");

    let ticket = provider.begin_bind(&source);
    let graph = provider
        .backend_mut()
        .open_graph(&source, &AnalyzerConfig::default());
    provider.release();

    assert_eq!(
        provider.complete_bind(ticket, graph),
        Err(GraphError::Superseded)
    );
    assert_eq!(live.get(), 0);
    assert!(provider.current_spectrum().is_none());
}

#[test]
fn test_queued_callback_after_stop_draws_nothing() {
    let mut queue = FrameQueue::new();
    let mut scheduler = FrameScheduler::new();
    scheduler.start(&mut queue);
    let queued = queue.pop().unwrap();
    scheduler.stop(&mut queue);

    let mut draws = 0;
    let outcome = scheduler.on_frame(queued, 16.0, &mut queue, |_| {
        draws += 1;
        FrameOutcome::Drawn
    });
    assert_eq!(outcome, FrameOutcome::Stale);
    assert_eq!(draws, 0);
    assert!(queue.is_empty());
}

#[test]
fn test_cancelled_token_is_removed_from_host() {
    let mut queue = FrameQueue::new();
    let token = FrameToken { generation: 3 };
    queue.request_frame(token);
    queue.cancel_frame(token);
    assert!(queue.is_empty());
}

#[test]
fn test_engine_unmount_releases_graph() {
    let (backend, live) = backend(255);
    let mut engine: Engine<CountingBackend, RecordingSurface> =
        Engine::new(backend, AnalyzerConfig::default(), 0);
    engine.on_style_change("wave");
    engine.on_mount(320, 180, AudioSource::from_path("a.mp3"));
    assert_eq!(live.get(), 1);

    for n in 0..5 {
        assert_eq!(engine.pump(n as f64 * 16.0), Some(FrameOutcome::Drawn));
    }
    engine.on_unmount();
    assert_eq!(live.get(), 0);
    assert_eq!(engine.pump(100.0), None);
}

#[test]
fn test_resize_mid_run_keeps_drawing() {
    let (backend, _) = backend(200);
    let mut engine: Engine<CountingBackend, RecordingSurface> =
        Engine::new(backend, AnalyzerConfig::default(), 0);
    engine.on_style_change("fractal");
    engine.on_mount(320, 180, AudioSource::from_path("a.mp3"));
    engine.pump(0.0);

    let generation = engine.scheduler().generation();
    engine.on_resize(640, 360);
    assert_eq!(engine.pump(16.0), Some(FrameOutcome::Drawn));

    let surface = engine.surface().unwrap();
    assert_eq!((surface.width(), surface.height()), (640, 360));
    assert_eq!(engine.scheduler().generation(), generation);
}

#[test]
fn test_mandelbrot_origin_never_escapes() {
    assert_eq!(mandelbrot_escape(0.0, 0.0), 100);
}

//! Spectrum provider owning the single live analysis graph.
//!
//! The provider binds one audio source at a time. Rebinding tears the previous
//! graph down before the next one is built, and every bind or release bumps an
//! epoch so that a bind which completes late (after a newer release or bind)
//! is rejected instead of resurrecting a stale graph.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::analyzer::AnalyzerConfig;
use super::spectrum::Spectrum;
use crate::error::GraphError;

/// Identity of a bindable audio source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioSource {
    path: PathBuf,
}

impl AudioSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short display name (file name without directories).
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Anything that can be sampled periodically for byte frequency data.
pub trait SpectrumInput {
    fn frequency_bin_count(&self) -> usize;
    fn get_byte_frequency_data(&mut self, buffer: &mut [u8]);
}

/// A constructed source → analyzer → destination chain.
pub trait AnalysisGraph: SpectrumInput {
    /// False once the underlying stream died (e.g. the device vanished).
    fn is_healthy(&self) -> bool {
        true
    }

    /// Pause or resume the source feeding the graph. Graphs without a
    /// playback side ignore this.
    fn set_paused(&mut self, _paused: bool) {}

    fn is_paused(&self) -> bool {
        false
    }

    /// Disconnect every node and release the underlying audio context.
    fn disconnect(&mut self) -> Result<(), GraphError>;
}

/// Environment audio subsystem able to build analysis graphs.
pub trait AudioBackend {
    fn open_graph(
        &mut self,
        source: &AudioSource,
        config: &AnalyzerConfig,
    ) -> Result<Box<dyn AnalysisGraph>, GraphError>;
}

/// Handle describing the currently bound graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerHandle {
    pub source: AudioSource,
    pub bin_count: usize,
    pub epoch: u64,
}

/// Proof that a bind was started; redeemed by [`SpectrumProvider::complete_bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindTicket {
    source: AudioSource,
    epoch: u64,
}

impl BindTicket {
    pub fn source(&self) -> &AudioSource {
        &self.source
    }
}

struct LiveGraph {
    handle: AnalyzerHandle,
    graph: Box<dyn AnalysisGraph>,
}

/// Owns at most one live analysis graph and exposes the current spectrum.
pub struct SpectrumProvider<B: AudioBackend> {
    backend: B,
    config: AnalyzerConfig,
    live: Option<LiveGraph>,
    spectrum: Spectrum,
    epoch: u64,
}

impl<B: AudioBackend> SpectrumProvider<B> {
    pub fn new(backend: B, config: AnalyzerConfig) -> Self {
        Self {
            backend,
            config,
            live: None,
            spectrum: Spectrum::new(config.bin_count()),
            epoch: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Bind `source`, reusing the live graph when it already serves that source.
    pub fn bind(&mut self, source: &AudioSource) -> Result<AnalyzerHandle, GraphError> {
        if let Some(handle) = self.healthy_handle_for(source) {
            debug!("bind: {} already bound, reusing graph", source.display_name());
            return Ok(handle);
        }

        let ticket = self.begin_bind(source);
        let result = self.backend.open_graph(source, &self.config);
        self.complete_bind(ticket, result)
    }

    /// First half of a two-phase bind: tear down whatever is live and reserve
    /// a new epoch for `source`.
    pub fn begin_bind(&mut self, source: &AudioSource) -> BindTicket {
        self.teardown();
        self.epoch += 1;
        BindTicket {
            source: source.clone(),
            epoch: self.epoch,
        }
    }

    /// Second half of a two-phase bind. The graph is committed only if no
    /// bind or release happened since `ticket` was issued.
    pub fn complete_bind(
        &mut self,
        ticket: BindTicket,
        result: Result<Box<dyn AnalysisGraph>, GraphError>,
    ) -> Result<AnalyzerHandle, GraphError> {
        if ticket.epoch != self.epoch || self.live.is_some() {
            warn!(
                "bind: discarding stale bind for {} (epoch {} != {})",
                ticket.source.display_name(),
                ticket.epoch,
                self.epoch
            );
            if let Ok(mut graph) = result {
                if let Err(err) = graph.disconnect() {
                    warn!("bind: stale graph disconnect failed: {}", err);
                }
            }
            return Err(GraphError::Superseded);
        }

        // Current ticket: begin_bind already tore down the previous graph
        let mut graph = match result {
            Ok(graph) => graph,
            Err(err) => {
                warn!(
                    "bind: could not build graph for {}: {}",
                    ticket.source.display_name(),
                    err
                );
                return Err(err);
            }
        };

        let bin_count = graph.frequency_bin_count();
        if bin_count == 0 {
            if let Err(err) = graph.disconnect() {
                warn!("bind: empty graph disconnect failed: {}", err);
            }
            return Err(GraphError::Construction(
                "analyzer reported zero frequency bins".into(),
            ));
        }

        let handle = AnalyzerHandle {
            source: ticket.source,
            bin_count,
            epoch: ticket.epoch,
        };
        info!(
            "bind: {} bound with {} bins",
            handle.source.display_name(),
            bin_count
        );

        self.spectrum = Spectrum::new(bin_count);
        self.live = Some(LiveGraph {
            handle: handle.clone(),
            graph,
        });
        Ok(handle)
    }

    /// Sample the live graph. `None` before a successful bind or once the
    /// graph stopped being healthy.
    pub fn current_spectrum(&mut self) -> Option<&Spectrum> {
        let live = self.live.as_mut()?;
        if !live.graph.is_healthy() {
            return None;
        }
        live.graph
            .get_byte_frequency_data(self.spectrum.bins_mut());
        Some(&self.spectrum)
    }

    /// Drop the live graph. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.teardown();
        self.epoch += 1;
    }

    pub fn is_ready(&self) -> bool {
        self.live
            .as_ref()
            .map(|live| live.graph.is_healthy())
            .unwrap_or(false)
    }

    pub fn handle(&self) -> Option<&AnalyzerHandle> {
        self.live.as_ref().map(|live| &live.handle)
    }

    pub fn bound_source(&self) -> Option<&AudioSource> {
        self.handle().map(|h| &h.source)
    }

    pub fn set_paused(&mut self, paused: bool) {
        if let Some(live) = self.live.as_mut() {
            live.graph.set_paused(paused);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.live
            .as_ref()
            .map(|live| live.graph.is_paused())
            .unwrap_or(false)
    }

    fn healthy_handle_for(&self, source: &AudioSource) -> Option<AnalyzerHandle> {
        self.live
            .as_ref()
            .filter(|live| live.handle.source == *source && live.graph.is_healthy())
            .map(|live| live.handle.clone())
    }

    fn teardown(&mut self) {
        if let Some(mut live) = self.live.take() {
            debug!("release: disconnecting {}", live.handle.source.display_name());
            if let Err(err) = live.graph.disconnect() {
                warn!("release: {}", err);
            }
        }
    }
}

impl<B: AudioBackend> Drop for SpectrumProvider<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Backend that counts live graphs and can be told to fail.
    #[derive(Default)]
    struct CountingBackend {
        live: Rc<Cell<usize>>,
        opened: usize,
        fail_next: bool,
        empty_next: bool,
    }

    struct CountingGraph {
        live: Rc<Cell<usize>>,
        connected: bool,
        level: u8,
        bins: usize,
    }

    impl SpectrumInput for CountingGraph {
        fn frequency_bin_count(&self) -> usize {
            self.bins
        }

        fn get_byte_frequency_data(&mut self, buffer: &mut [u8]) {
            buffer.iter_mut().for_each(|b| *b = self.level);
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
            if self.fail_next {
                self.fail_next = false;
                return Err(GraphError::Construction("no audio device".into()));
            }
            self.opened += 1;
            self.live.set(self.live.get() + 1);
            let bins = if std::mem::take(&mut self.empty_next) { 0 } else { 128 };
            Ok(Box::new(CountingGraph {
                live: self.live.clone(),
                connected: true,
                level: 64,
                bins,
            }))
        }
    }

    fn provider() -> (SpectrumProvider<CountingBackend>, Rc<Cell<usize>>) {
        let backend = CountingBackend::default();
        let live = backend.live.clone();
        (
            SpectrumProvider::new(backend, AnalyzerConfig::default()),
            live,
        )
    }

    #[test]
    fn test_no_spectrum_before_bind() {
        let (mut provider, _) = provider();
        assert!(provider.current_spectrum().is_none());
        assert!(!provider.is_ready());
    }

    #[test]
    fn test_bind_same_source_reuses_graph() {
        let (mut provider, live) = provider();
        let source = AudioSource::from_path("a.mp3");

        let first = provider.bind(&source).unwrap();
        let second = provider.bind(&source).unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.backend().opened, 1);
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_rebind_keeps_one_live_graph() {
        let (mut provider, live) = provider();
        provider.bind(&AudioSource::from_path("a.mp3")).unwrap();
        provider.bind(&AudioSource::from_path("b.mp3")).unwrap();

        assert_eq!(live.get(), 1);
        assert_eq!(
            provider.bound_source(),
            Some(&AudioSource::from_path("b.mp3"))
        );
    }

    #[test]
    fn test_failed_bind_leaves_provider_torn_down() {
        let (mut provider, live) = provider();
        provider.bind(&AudioSource::from_path("a.mp3")).unwrap();

        provider.backend_mut().fail_next = true;
        let err = provider.bind(&AudioSource::from_path("b.mp3")).unwrap_err();

        assert!(matches!(err, GraphError::Construction(_)));
        assert_eq!(live.get(), 0);
        assert!(provider.current_spectrum().is_none());
    }

    #[test]
    fn test_release_twice_is_noop() {
        let (mut provider, live) = provider();
        provider.bind(&AudioSource::from_path("a.mp3")).unwrap();
        provider.release();
        provider.release();
        assert_eq!(live.get(), 0);
        assert!(provider.handle().is_none());
    }

    #[test]
    fn test_stale_bind_is_rejected_after_release() {
        let (mut provider, live) = provider();
        let source = AudioSource::from_path("a.mp3");

        let ticket = provider.begin_bind(&source);
        let graph = provider.backend_mut().open_graph(&source, &AnalyzerConfig::default());
        provider.release();

        let err = provider.complete_bind(ticket, graph).unwrap_err();
        assert_eq!(err, GraphError::Superseded);
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_stale_failure_keeps_newer_graph() {
        let (mut provider, live) = provider();
        let stale = provider.begin_bind(&AudioSource::from_path("a.mp3"));
        provider.bind(&AudioSource::from_path("b.mp3")).unwrap();

        let err = provider
            .complete_bind(stale, Err(GraphError::Construction("timed out".into())))
            .unwrap_err();
        assert_eq!(err, GraphError::Superseded);
        assert!(provider.is_ready());
        assert_eq!(live.get(), 1);
        assert_eq!(
            provider.bound_source(),
            Some(&AudioSource::from_path("b.mp3"))
        );
    }

    #[test]
    fn test_graph_without_bins_is_disconnected() {
        let (mut provider, live) = provider();
        provider.backend_mut().empty_next = true;

        let err = provider.bind(&AudioSource::from_path("a.mp3")).unwrap_err();
        assert!(matches!(err, GraphError::Construction(_)));
        assert_eq!(live.get(), 0);
        assert!(!provider.is_ready());
    }

    #[test]
    fn test_spectrum_has_fixed_size() {
        let (mut provider, _) = provider();
        provider.bind(&AudioSource::from_path("a.mp3")).unwrap();
        let spectrum = provider.current_spectrum().unwrap();
        assert_eq!(spectrum.len(), 128);
        assert!(spectrum.bins().iter().all(|&b| b == 64));
    }

    #[test]
    fn test_drop_releases_graph() {
        let (mut provider, live) = provider();
        provider.bind(&AudioSource::from_path("a.mp3")).unwrap();
        drop(provider);
        assert_eq!(live.get(), 0);
    }
}

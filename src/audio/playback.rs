//! Live playback backend: rodio output with a captured analysis tap.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};
use ringbuf::traits::*;
use rodio::{Decoder, OutputStream, Sink, Source};

use super::analyzer::{Analyzer, AnalyzerConfig};
use super::detection::probe_audio;
use super::provider::{AnalysisGraph, AudioBackend, AudioSource, SpectrumInput};
use super::sample_capture::{SampleBuffer, SampleCapture, recent_samples, sample_buffer};
use crate::error::GraphError;

/// Capture capacity, ~370 ms of mono audio at 44.1 kHz.
const CAPTURE_CAPACITY: usize = 16384;

/// How often the audio thread checks whether the track has ended.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Commands sent to the audio thread.
enum PlaybackCommand {
    Pause,
    Resume,
    Stop,
}

/// Backend playing files through the default output device.
#[derive(Debug, Default)]
pub struct RodioBackend;

impl RodioBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for RodioBackend {
    fn open_graph(
        &mut self,
        source: &AudioSource,
        config: &AnalyzerConfig,
    ) -> Result<Box<dyn AnalysisGraph>, GraphError> {
        config.validate().map_err(GraphError::Construction)?;
        let mime = probe_audio(source.path())?;
        debug!("playback: opening {} ({})", source.display_name(), mime);

        let graph = PlaybackGraph::spawn(source.path().to_path_buf(), *config)?;
        Ok(Box::new(graph))
    }
}

/// Audio thread owning the output stream and sink, plus the analyzer fed by it.
pub struct PlaybackGraph {
    cmd_tx: Sender<PlaybackCommand>,
    thread: Option<JoinHandle<()>>,
    /// Cleared by the audio thread if the stream dies
    alive: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    samples: SampleBuffer,
    analyzer: Analyzer,
    scratch: Vec<f32>,
}

impl PlaybackGraph {
    fn spawn(path: PathBuf, config: AnalyzerConfig) -> Result<Self, GraphError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlaybackCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let alive = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(false));
        let samples = sample_buffer(CAPTURE_CAPACITY);

        let thread_alive = alive.clone();
        let thread_samples = samples.clone();

        let thread = thread::Builder::new()
            .name("auralux-playback".into())
            .spawn(move || {
                // The output stream is not Send, so it lives and dies on this thread
                let (stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("no audio output: {}", e)));
                        return;
                    }
                };

                let sink = match open_sink(&path, &handle, thread_samples.clone()) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                loop {
                    match cmd_rx.recv_timeout(POLL_INTERVAL) {
                        Ok(PlaybackCommand::Pause) => sink.pause(),
                        Ok(PlaybackCommand::Resume) => sink.play(),
                        Ok(PlaybackCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            if sink.empty() {
                                // Track finished: let the analyzer fall silent
                                if let Ok(mut buf) = thread_samples.lock() {
                                    buf.clear();
                                }
                            }
                        }
                    }
                }

                sink.stop();
                thread_alive.store(false, Ordering::SeqCst);
                drop(stream);
            })
            .map_err(|e| GraphError::Construction(format!("cannot spawn audio thread: {}", e)))?;

        let ready = ready_rx
            .recv()
            .map_err(|_| "audio thread exited during setup".to_string())
            .and_then(|r| r);

        if let Err(reason) = ready {
            error!("playback: {}", reason);
            let _ = thread.join();
            return Err(GraphError::Construction(reason));
        }
        info!("playback: output stream open");

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
            alive,
            paused,
            samples,
            analyzer: Analyzer::new(config),
            scratch: Vec::with_capacity(config.fft_size),
        })
    }

    fn shutdown(&mut self) -> Result<(), GraphError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.cmd_tx.send(PlaybackCommand::Stop);
        thread
            .join()
            .map_err(|_| GraphError::Disconnect("audio thread panicked".into()))
    }
}

fn open_sink(
    path: &Path,
    handle: &rodio::OutputStreamHandle,
    samples: SampleBuffer,
) -> Result<Sink, String> {
    let sink = Sink::try_new(handle).map_err(|e| format!("cannot create sink: {}", e))?;
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))?;

    let capturing = SampleCapture::new(decoder.convert_samples::<f32>(), samples);
    sink.append(capturing);
    sink.play();
    Ok(sink)
}

impl SpectrumInput for PlaybackGraph {
    fn frequency_bin_count(&self) -> usize {
        self.analyzer.frequency_bin_count()
    }

    fn get_byte_frequency_data(&mut self, buffer: &mut [u8]) {
        if self.paused.load(Ordering::SeqCst) {
            // Paused sources feed silence so the spectrum decays
            self.scratch.clear();
        } else {
            recent_samples(&self.samples, self.analyzer.fft_size(), &mut self.scratch);
        }
        self.analyzer.process(&self.scratch, buffer);
    }
}

impl AnalysisGraph for PlaybackGraph {
    fn is_healthy(&self) -> bool {
        self.thread.is_some() && self.alive.load(Ordering::SeqCst)
    }

    fn set_paused(&mut self, paused: bool) {
        let cmd = if paused {
            PlaybackCommand::Pause
        } else {
            PlaybackCommand::Resume
        };
        if self.cmd_tx.send(cmd).is_ok() {
            self.paused.store(paused, Ordering::SeqCst);
        }
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn disconnect(&mut self) -> Result<(), GraphError> {
        self.shutdown()
    }
}

impl Drop for PlaybackGraph {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

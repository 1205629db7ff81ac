//! A pass-through source that taps decoded audio into a ring buffer for analysis.

use std::sync::{Arc, Mutex};

use ringbuf::{HeapRb, traits::*};
use rodio::Source;

/// Shared buffer of recent mono samples fed by [`SampleCapture`].
pub type SampleBuffer = Arc<Mutex<HeapRb<f32>>>;

/// Create an empty capture buffer holding up to `capacity` samples.
pub fn sample_buffer(capacity: usize) -> SampleBuffer {
    Arc::new(Mutex::new(HeapRb::<f32>::new(capacity.max(1))))
}

/// Wraps a source, forwarding every sample to playback while pushing a
/// mono mixdown of each interleaved frame into a ring buffer.
pub struct SampleCapture<S> {
    source: S,
    buffer: SampleBuffer,
    frame_sum: f32,
    frame_pos: u16,
}

impl<S> SampleCapture<S> {
    pub fn new(source: S, buffer: SampleBuffer) -> Self {
        Self {
            source,
            buffer,
            frame_sum: 0.0,
            frame_pos: 0,
        }
    }
}

impl<S> SampleCapture<S>
where
    S: Source<Item = f32>,
{
    fn capture(&mut self, sample: f32) {
        let channels = self.source.channels().max(1);
        self.frame_sum += sample;
        self.frame_pos += 1;
        if self.frame_pos < channels {
            return;
        }

        let mono = self.frame_sum / channels as f32;
        self.frame_sum = 0.0;
        self.frame_pos = 0;

        if let Ok(mut buf) = self.buffer.lock() {
            // Oldest sample makes room when full
            if buf.is_full() {
                let _ = buf.try_pop();
            }
            let _ = buf.try_push(mono);
        }
    }
}

impl<S> Iterator for SampleCapture<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.source.next()?;
        self.capture(sample);
        Some(sample)
    }
}

impl<S> Source for SampleCapture<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.source.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.source.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        self.source.total_duration()
    }
}

/// Copy the newest `count` samples out of `buffer` without consuming them.
pub fn recent_samples(buffer: &SampleBuffer, count: usize, out: &mut Vec<f32>) {
    out.clear();
    if let Ok(buf) = buffer.lock() {
        let available = buf.occupied_len();
        let start = available.saturating_sub(count);
        out.extend(buf.iter().skip(start).copied());
    }
}

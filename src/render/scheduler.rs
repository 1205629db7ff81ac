//! Redraw loop: frame tokens, the host callback facility and frame timing.

use std::collections::VecDeque;
use std::time::Instant;

use log::{debug, trace};

use crate::audio::Spectrum;

/// Height the style sizes are tuned for.
pub const REFERENCE_HEIGHT: f32 = 450.0;

/// Identifies one requested frame callback. Only tokens carrying the
/// scheduler's current generation are honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken {
    pub generation: u64,
}

/// Facility that calls back once per display refresh.
pub trait FrameHost {
    fn request_frame(&mut self, token: FrameToken);
    fn cancel_frame(&mut self, token: FrameToken);
}

/// In-process frame host: requested tokens wait here until the owner pumps
/// them back into the scheduler.
#[derive(Debug, Default)]
pub struct FrameQueue {
    pending: VecDeque<FrameToken>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next callback due, oldest first.
    pub fn pop(&mut self) -> Option<FrameToken> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl FrameHost for FrameQueue {
    fn request_frame(&mut self, token: FrameToken) {
        self.pending.push_back(token);
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending.retain(|t| *t != token);
    }
}

/// Monotonic time source in milliseconds. The manual variant is stepped by
/// hand for headless export and tests.
#[derive(Debug, Clone)]
pub enum FrameClock {
    Monotonic(Instant),
    Manual(f64),
}

impl FrameClock {
    pub fn monotonic() -> Self {
        FrameClock::Monotonic(Instant::now())
    }

    pub fn manual() -> Self {
        FrameClock::Manual(0.0)
    }

    pub fn now_ms(&self) -> f64 {
        match self {
            FrameClock::Monotonic(origin) => origin.elapsed().as_secs_f64() * 1000.0,
            FrameClock::Manual(now) => *now,
        }
    }

    /// Step a manual clock; no effect on a monotonic one.
    pub fn advance(&mut self, ms: f64) {
        if let FrameClock::Manual(now) = self {
            *now += ms.max(0.0);
        }
    }
}

/// Timing handed to the frame body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Milliseconds since the previous frame of this run (0 on the first).
    pub delta_ms: f32,
    /// Clock time in seconds.
    pub time_s: f32,
}

/// Everything a style sees for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub width: u32,
    pub height: u32,
    pub spectrum: &'a Spectrum,
    pub delta_ms: f32,
    pub time_s: f32,
}

impl<'a> FrameContext<'a> {
    pub fn new(width: u32, height: u32, spectrum: &'a Spectrum, timing: FrameTiming) -> Self {
        Self {
            width,
            height,
            spectrum,
            delta_ms: timing.delta_ms,
            time_s: timing.time_s,
        }
    }

    pub fn w(&self) -> f32 {
        self.width as f32
    }

    pub fn h(&self) -> f32 {
        self.height as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size multiplier relative to the reference height.
    pub fn scale(&self) -> f32 {
        self.w().min(self.h()) / REFERENCE_HEIGHT
    }

    pub fn intensity(&self) -> f32 {
        self.spectrum.intensity()
    }

    pub fn amplitude_at(&self, index: usize, count: usize) -> f32 {
        self.spectrum.amplitude_at(index, count)
    }
}

/// Result of delivering one frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// Nothing to draw this time (no spectrum, surface or style); the loop
    /// keeps running.
    Skipped,
    /// Token from a cancelled run; ignored without rescheduling.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    generation: u64,
    last_frame_ms: Option<f64>,
    pending: Option<FrameToken>,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            generation: 0,
            last_frame_ms: None,
            pending: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn start(&mut self, host: &mut dyn FrameHost) {
        if self.is_running() {
            return;
        }
        self.generation += 1;
        self.state = SchedulerState::Running;
        self.last_frame_ms = None;
        debug!("scheduler: start (generation {})", self.generation);
        self.request(host);
    }

    /// Stop the loop; callbacks already in flight become stale.
    pub fn stop(&mut self, host: &mut dyn FrameHost) {
        if let Some(token) = self.pending.take() {
            host.cancel_frame(token);
        }
        if self.is_running() {
            debug!("scheduler: stop (generation {})", self.generation);
        }
        self.generation += 1;
        self.state = SchedulerState::Idle;
    }

    /// Deliver a callback. `body` runs only for a current token and returns
    /// whether it drew; the next frame is requested afterwards.
    pub fn on_frame<F>(
        &mut self,
        token: FrameToken,
        now_ms: f64,
        host: &mut dyn FrameHost,
        body: F,
    ) -> FrameOutcome
    where
        F: FnOnce(FrameTiming) -> FrameOutcome,
    {
        if !self.is_running() || token.generation != self.generation {
            trace!("scheduler: stale token {:?}", token);
            return FrameOutcome::Stale;
        }
        if self.pending == Some(token) {
            self.pending = None;
        }

        let delta = self.last_frame_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_frame_ms = Some(now_ms);

        let outcome = body(FrameTiming {
            delta_ms: delta as f32,
            time_s: (now_ms / 1000.0) as f32,
        });

        self.request(host);
        outcome
    }

    fn request(&mut self, host: &mut dyn FrameHost) {
        let token = FrameToken {
            generation: self.generation,
        };
        self.pending = Some(token);
        host.request_frame(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn(_: FrameTiming) -> FrameOutcome {
        FrameOutcome::Drawn
    }

    #[test]
    fn test_start_requests_one_frame() {
        let mut queue = FrameQueue::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut queue);
        scheduler.start(&mut queue);
        assert_eq!(queue.len(), 1);
        assert!(scheduler.is_running());
    }

    #[test]
    fn test_frame_reschedules_and_measures_delta() {
        let mut queue = FrameQueue::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut queue);

        let token = queue.pop().unwrap();
        let mut seen = Vec::new();
        scheduler.on_frame(token, 1000.0, &mut queue, |t| {
            seen.push(t);
            FrameOutcome::Drawn
        });
        let token = queue.pop().unwrap();
        scheduler.on_frame(token, 1016.0, &mut queue, |t| {
            seen.push(t);
            FrameOutcome::Drawn
        });

        assert_eq!(seen[0].delta_ms, 0.0);
        assert_eq!(seen[1].delta_ms, 16.0);
        assert!((seen[1].time_s - 1.016).abs() < 1e-6);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_stop_cancels_pending() {
        let mut queue = FrameQueue::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut queue);
        scheduler.stop(&mut queue);
        assert!(queue.is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_in_flight_callback_after_stop_never_draws() {
        let mut queue = FrameQueue::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut queue);

        // Already dequeued by the host when stop arrives
        let in_flight = queue.pop().unwrap();
        scheduler.stop(&mut queue);

        let mut calls = 0;
        let outcome = scheduler.on_frame(in_flight, 16.0, &mut queue, |_| {
            calls += 1;
            FrameOutcome::Drawn
        });
        assert_eq!(outcome, FrameOutcome::Stale);
        assert_eq!(calls, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_restart_rejects_previous_generation() {
        let mut queue = FrameQueue::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut queue);
        let old = queue.pop().unwrap();
        scheduler.stop(&mut queue);
        scheduler.start(&mut queue);

        assert_eq!(
            scheduler.on_frame(old, 0.0, &mut queue, drawn),
            FrameOutcome::Stale
        );
        let fresh = queue.pop().unwrap();
        assert_eq!(
            scheduler.on_frame(fresh, 0.0, &mut queue, drawn),
            FrameOutcome::Drawn
        );
    }

    #[test]
    fn test_skipped_frame_still_reschedules() {
        let mut queue = FrameQueue::new();
        let mut scheduler = FrameScheduler::new();
        scheduler.start(&mut queue);
        let token = queue.pop().unwrap();
        let outcome = scheduler.on_frame(token, 0.0, &mut queue, |_| FrameOutcome::Skipped);
        assert_eq!(outcome, FrameOutcome::Skipped);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_manual_clock_advances() {
        let mut clock = FrameClock::manual();
        clock.advance(16.5);
        clock.advance(-3.0);
        assert_eq!(clock.now_ms(), 16.5);
    }

    #[test]
    fn test_scale_uses_shorter_side() {
        let spectrum = Spectrum::new(128);
        let timing = FrameTiming {
            delta_ms: 16.0,
            time_s: 0.0,
        };
        let ctx = FrameContext::new(1600, 900, &spectrum, timing);
        assert!((ctx.scale() - 2.0).abs() < 1e-6);
    }
}

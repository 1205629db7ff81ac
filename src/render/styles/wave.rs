//! Spring-mass water surface driven by the spectrum.

use std::f32::consts::PI;

use super::{Style, StyleKind, fade};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::{CompositeMode, Surface};

const RESOLUTION: usize = 100;
const SPRING: f32 = 0.03;
const DAMPING: f32 = 0.98;
const SPREAD: f32 = 0.2;
const MAX_STEP_MS: f32 = 100.0;
const LAYERS: usize = 3;
const CAUSTICS: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
struct WavePoint {
    /// Offset from the centre line.
    y: f32,
    velocity: f32,
}

pub struct WaveStyle {
    points: Vec<WavePoint>,
    scratch: Vec<f32>,
}

impl Default for WaveStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveStyle {
    pub fn new() -> Self {
        Self {
            points: vec![WavePoint::default(); RESOLUTION + 1],
            scratch: vec![0.0; RESOLUTION + 1],
        }
    }

    /// Euclidean norm of the offsets from rest.
    pub fn displacement(&self) -> f32 {
        self.points.iter().map(|p| p.y * p.y).sum::<f32>().sqrt()
    }

    /// Push one point off its rest position.
    pub fn perturb(&mut self, index: usize, offset: f32) {
        if let Some(p) = self.points.get_mut(index) {
            p.y += offset;
        }
    }

    /// Advance the simulation one frame with per-point forcing.
    fn simulate(&mut self, delta_ms: f32, forcing: impl Fn(usize) -> f32) {
        let step = delta_ms.clamp(0.0, MAX_STEP_MS) * 0.016;

        for (i, p) in self.points.iter_mut().enumerate() {
            p.velocity += (-SPRING * p.y + forcing(i)) * step;
        }

        // Neighbour coupling from the pre-move positions, equal and opposite
        self.scratch.iter_mut().for_each(|s| *s = 0.0);
        for i in 1..self.points.len() {
            let pull = (self.points[i - 1].y - self.points[i].y) * SPREAD;
            self.scratch[i] += pull;
            self.scratch[i - 1] -= pull;
        }

        for (p, pull) in self.points.iter_mut().zip(&self.scratch) {
            p.velocity = (p.velocity + pull) * DAMPING;
            p.y += p.velocity;
        }
    }

    fn layer_path(&self, frame: &FrameContext, offset: f32) -> Path {
        let center = frame.h() / 2.0;
        let dx = frame.w() / RESOLUTION as f32;
        let mut path = Path::new();

        for (i, p) in self.points.iter().enumerate() {
            let (x, y) = (dx * i as f32, center + p.y);
            if i == 0 {
                path.move_to(x, y + offset);
                continue;
            }
            let (px, py) = (dx * (i - 1) as f32, center + self.points[i - 1].y);
            path.quad_to(px, py + offset, (x + px) / 2.0, (y + py + offset * 2.0) / 2.0);
        }
        path
    }
}

impl Style for WaveStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Wave
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        if frame.is_empty() {
            return;
        }
        let intensity = frame.intensity();
        let s = frame.scale();
        let t = frame.time_s;

        self.simulate(frame.delta_ms, |i| {
            let amplitude = frame.amplitude_at(i, RESOLUTION) * 100.0 * s;
            (i as f32 * 0.2 + t).sin() * amplitude * intensity
        });

        fade(surface, frame, 0.1);

        for layer in 0..LAYERS {
            let hue = t * 30.0 + layer as f32 * 120.0;
            let offset = (layer as f32 * PI / 3.0).sin() * 20.0 * intensity * s;
            let path = self.layer_path(frame, offset);
            let width = (3 - layer) as f32 * s;

            if intensity > 0.0 {
                let glow = Color::hsla(hue, 0.8, 0.5, 0.15 * intensity);
                surface.stroke_path(&path, &Paint::Solid(glow), width + 10.0 * intensity * s);
            }
            let color = Color::hsla(hue, 0.8, 0.5, 0.5 - layer as f32 * 0.1);
            surface.stroke_path(&path, &Paint::Solid(color), width);
        }

        if intensity > 0.0 {
            let center = frame.h() / 2.0;
            surface.set_composite(CompositeMode::Screen);
            for _ in 0..CAUSTICS {
                let caustic = Gradient::linear(0.0, center - 100.0 * s, 0.0, center + 100.0 * s)
                    .with_stop(0.0, Color::hsla(200.0, 0.8, 0.5, 0.05 * intensity))
                    .with_stop(0.5, Color::hsla(180.0, 0.8, 0.5, 0.02 * intensity))
                    .with_stop(1.0, Color::TRANSPARENT);
                surface.fill_rect(0.0, 0.0, frame.w(), frame.h(), &Paint::Gradient(caustic));
            }
            surface.set_composite(CompositeMode::SourceOver);
        }
    }

    fn live_entities(&self) -> usize {
        self.points.len()
    }
}

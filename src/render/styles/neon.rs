//! Layered glowing curves built from three summed waves, plus sparks.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Style, StyleKind, dot_radius, fade};
use crate::render::color::Color;
use crate::render::paint::Paint;
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::Surface;

const LAYERS: usize = 5;
const POINTS: usize = 20;
const MAX_SPARKS: f32 = 30.0;

/// (blur radius, opacity) per glow pass, outermost first.
const GLOW_PASSES: [(f32, f32); 4] = [(20.0, 0.3), (15.0, 0.5), (10.0, 0.7), (5.0, 0.9)];

pub struct NeonStyle {
    rng: StdRng,
    points: Vec<(f32, f32)>,
    sparks: usize,
}

impl NeonStyle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            points: Vec::with_capacity(POINTS),
            sparks: 0,
        }
    }

    fn layer_points(&mut self, frame: &FrameContext, layer: usize) {
        let offset = layer as f32 / LAYERS as f32 * TAU;
        let t = frame.time_s * (1.0 + layer as f32 * 0.2) + offset;
        let base = frame.h() / 2.0;
        let s = frame.scale();

        self.points.clear();
        for j in 0..POINTS {
            let jf = j as f32;
            let amplitude = frame.amplitude_at(j, POINTS);
            let wave = (t + jf * 0.2).sin() * 100.0
                + (t * 0.5 + jf * 0.3).cos() * 50.0
                + (t * 1.5 + jf * 0.1).sin() * 25.0;
            self.points
                .push((frame.w() / POINTS as f32 * jf, base + wave * amplitude * s));
        }
    }

    /// Smooth curve through the midpoints of the current points.
    fn curve(&self) -> Path {
        let mut path = Path::new();
        let pts = &self.points;
        path.move_to(pts[0].0, pts[0].1);
        for i in 1..pts.len() - 2 {
            let (xc, yc) = ((pts[i].0 + pts[i + 1].0) / 2.0, (pts[i].1 + pts[i + 1].1) / 2.0);
            path.quad_to(pts[i].0, pts[i].1, xc, yc);
        }
        path
    }
}

impl Style for NeonStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Neon
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        self.sparks = 0;
        if frame.is_empty() {
            return;
        }
        let intensity = frame.intensity();
        let s = frame.scale();
        let t = frame.time_s;

        fade(surface, frame, 0.1);

        for layer in 0..LAYERS {
            self.layer_points(frame, layer);
            let path = self.curve();
            let hue = t * 30.0 + layer as f32 * 360.0 / LAYERS as f32;
            let width = (2.0 + layer as f32 * 2.0) * intensity * s;
            if width <= 0.0 {
                continue;
            }
            for (blur, alpha) in GLOW_PASSES {
                let color = Color::hsla(hue, 1.0, 0.6, alpha);
                let spread = blur * intensity * s * 0.5;
                surface.stroke_path(&path, &Paint::Solid(color), width + spread);
            }
        }

        self.sparks = (MAX_SPARKS * intensity).floor() as usize;
        for i in 0..self.sparks {
            let x = self.rng.random::<f32>() * frame.w();
            let y = self.rng.random::<f32>() * frame.h();
            let r = dot_radius((1.0 + self.rng.random::<f32>() * 2.0 * intensity) * s);
            let alpha = self.rng.random::<f32>() * 0.5;
            let mut dot = Path::new();
            dot.circle(x, y, r);
            let color = Color::hsla(t * 100.0 + i as f32 * 20.0, 1.0, 0.7, alpha);
            surface.fill_path(&dot, &Paint::Solid(color));
        }
    }

    fn spawned_last_frame(&self) -> usize {
        self.sparks
    }
}

//! Three thin phase-shifted lines with dotted trails on the loud bins.

use std::f32::consts::TAU;

use super::{Style, StyleKind, dot_radius};
use crate::render::color::Color;
use crate::render::paint::Paint;
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::Surface;

const LINES: usize = 3;
const POINTS: usize = 100;
const DOT_THRESHOLD: f32 = 0.7;
const TRAIL: usize = 5;

#[derive(Default)]
pub struct MinimalStyle {
    dots: usize,
}

impl MinimalStyle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Style for MinimalStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Minimal
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        self.dots = 0;
        if frame.is_empty() {
            return;
        }
        let center = frame.h() / 2.0;
        let s = frame.scale();
        let t = frame.time_s;

        for line in 0..LINES {
            let phase = line as f32 / LINES as f32 * TAU;
            let mut path = Path::new();
            for i in 0..POINTS {
                let x = frame.w() / POINTS as f32 * i as f32;
                let amplitude = frame.amplitude_at(i, POINTS);
                let y = center + (i as f32 * 0.1 + t + phase).sin() * amplitude * 100.0 * s;
                path.line_to(x, y);
            }
            let color = Color::white(0.8 - line as f32 * 0.2);
            surface.stroke_path(&path, &Paint::Solid(color), 2.0 * s);
        }

        let bins = frame.spectrum.len();
        for i in 0..bins {
            let amplitude = frame.spectrum.amplitude(i);
            if amplitude <= DOT_THRESHOLD {
                continue;
            }
            self.dots += 1;
            let x = frame.w() / bins as f32 * i as f32;
            let y = center + (i as f32 * 0.1 + t).sin() * amplitude * 100.0 * s;

            for k in 0..TRAIL {
                let alpha = (1.0 - k as f32 / TRAIL as f32) * 0.8;
                let mut dot = Path::new();
                dot.circle(x - k as f32 * 2.0 * s, y, dot_radius((2.0 - k as f32 * 0.3) * s));
                surface.fill_path(&dot, &Paint::Solid(Color::white(alpha)));
            }
        }
    }

    fn spawned_last_frame(&self) -> usize {
        self.dots
    }
}

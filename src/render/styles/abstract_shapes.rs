//! Shapes bursting out of the centre, linked when they pass close by.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Style, StyleKind, fade};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::{CompositeMode, Surface};

const MAX_SPAWN: f32 = 8.0;
const POOL_CAP: usize = 120;
const LINK_DISTANCE: f32 = 200.0;
const LINKS_PER_SHAPE: usize = 2;
const BURST_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Circle,
    Square,
    Triangle,
}

#[derive(Debug, Clone)]
struct Element {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    rotation: f32,
    life: f32,
    color: Color,
    shape: Shape,
}

pub struct AbstractStyle {
    rng: StdRng,
    elements: Vec<Element>,
    spawned: usize,
}

impl AbstractStyle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            elements: Vec::with_capacity(POOL_CAP),
            spawned: 0,
        }
    }

    fn spawn(&mut self, frame: &FrameContext, intensity: f32) {
        let count = (intensity * MAX_SPAWN).floor() as usize;
        let s = frame.scale();
        for _ in 0..count {
            let angle = self.rng.random::<f32>() * TAU;
            let speed = 2.0 + self.rng.random::<f32>() * 4.0 * intensity;
            let shape = match self.rng.random_range(0..3) {
                0 => Shape::Circle,
                1 => Shape::Square,
                _ => Shape::Triangle,
            };
            let hue = frame.time_s * 50.0 + self.rng.random::<f32>() * 60.0;
            self.elements.push(Element {
                x: frame.w() / 2.0,
                y: frame.h() / 2.0,
                vx: angle.cos() * speed * s,
                vy: angle.sin() * speed * s,
                size: (40.0 + self.rng.random::<f32>() * 80.0) * s,
                rotation: angle,
                life: 1.0,
                color: Color::hsl(hue, 1.0, 0.5),
                shape,
            });
        }
        self.spawned = count;

        if self.elements.len() > POOL_CAP {
            let excess = self.elements.len() - POOL_CAP;
            self.elements.drain(..excess);
        }
    }

    fn advance(&mut self, frame: &FrameContext, intensity: f32) {
        let step = frame.delta_ms * 0.016;
        let (w, h) = (frame.w(), frame.h());
        for e in &mut self.elements {
            e.x += e.vx * step;
            e.y += e.vy * step;
            e.rotation += 0.02 * intensity;
            e.life -= 0.01 * step;
        }
        self.elements.retain(|e| {
            e.life > 0.0
                && e.x > -e.size
                && e.y > -e.size
                && e.x < w + e.size
                && e.y < h + e.size
        });
    }

    fn draw_element(surface: &mut dyn Surface, e: &Element, time: f32) {
        let half = e.size / 2.0;
        let fill = Paint::Solid(e.color.with_alpha(e.life * 0.8));

        surface.save();
        surface.translate(e.x, e.y);
        surface.rotate(e.rotation);

        match e.shape {
            Shape::Circle => {
                let mut path = Path::new();
                path.circle(0.0, 0.0, half);
                surface.fill_path(&path, &fill);
            }
            Shape::Square => surface.fill_rect(-half, -half, e.size, e.size, &fill),
            Shape::Triangle => {
                let mut path = Path::new();
                path.polygon(&[(-half, half), (half, half), (0.0, -half)]);
                surface.fill_path(&path, &fill);
            }
        }

        let glow = Gradient::radial(0.0, 0.0, 0.0, half)
            .with_stop(0.0, Color::hsla(time * 100.0, 1.0, 0.5, 0.5 * e.life))
            .with_stop(1.0, Color::TRANSPARENT);
        let mut disc = Path::new();
        disc.circle(0.0, 0.0, half);
        surface.set_composite(CompositeMode::Screen);
        surface.fill_path(&disc, &Paint::Gradient(glow));

        surface.restore();
    }

    fn draw_links(&self, surface: &mut dyn Surface, frame: &FrameContext, intensity: f32) {
        let reach = LINK_DISTANCE * frame.scale();
        let width = 2.0 * intensity * frame.scale();
        if width <= 0.0 {
            return;
        }
        surface.set_composite(CompositeMode::Screen);
        for (i, a) in self.elements.iter().enumerate() {
            let near = self.elements[i + 1..]
                .iter()
                .filter(|b| (b.x - a.x).hypot(b.y - a.y) < reach)
                .take(LINKS_PER_SHAPE);
            for b in near {
                let gradient = Gradient::linear(a.x, a.y, b.x, b.y)
                    .with_stop(0.0, a.color.with_alpha(0.2))
                    .with_stop(1.0, b.color.with_alpha(0.2));
                let mut path = Path::new();
                path.move_to(a.x, a.y).line_to(b.x, b.y);
                surface.stroke_path(&path, &Paint::Gradient(gradient), width);
            }
        }
        surface.set_composite(CompositeMode::SourceOver);
    }
}

impl Style for AbstractStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Abstract
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        self.spawned = 0;
        if frame.is_empty() {
            return;
        }
        let intensity = frame.intensity();

        self.spawn(frame, intensity);
        fade(surface, frame, 0.1);
        self.advance(frame, intensity);

        for e in &self.elements {
            Self::draw_element(surface, e, frame.time_s);
        }
        self.draw_links(surface, frame, intensity);

        if intensity > BURST_THRESHOLD {
            let (cx, cy) = (frame.w() / 2.0, frame.h() / 2.0);
            let burst = Gradient::radial(cx, cy, 0.0, 200.0 * intensity * frame.scale())
                .with_stop(0.0, Color::hsla(frame.time_s * 100.0, 1.0, 0.5, 0.3 * intensity))
                .with_stop(1.0, Color::TRANSPARENT);
            surface.fill_rect(0.0, 0.0, frame.w(), frame.h(), &Paint::Gradient(burst));
        }
    }

    fn spawned_last_frame(&self) -> usize {
        self.spawned
    }

    fn live_entities(&self) -> usize {
        self.elements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Spectrum;
    use crate::render::scheduler::FrameTiming;
    use crate::render::surface::RecordingSurface;

    fn run(style: &mut AbstractStyle, spectrum: &Spectrum, frames: usize) -> RecordingSurface {
        let mut surface = RecordingSurface::new(900, 450);
        for n in 0..frames {
            let ctx = FrameContext::new(
                900,
                450,
                spectrum,
                FrameTiming {
                    delta_ms: 16.0,
                    time_s: n as f32 * 0.016,
                },
            );
            style.render(&mut surface, &ctx);
        }
        surface
    }

    #[test]
    fn test_silence_spawns_nothing() {
        let mut style = AbstractStyle::new(1);
        let surface = run(&mut style, &Spectrum::new(128), 5);
        assert_eq!(style.spawned_last_frame(), 0);
        assert_eq!(style.live_entities(), 0);
        // Only the fades
        assert_eq!(surface.draw_count(), 5);
    }

    #[test]
    fn test_full_spectrum_spawns_max() {
        let mut style = AbstractStyle::new(1);
        run(&mut style, &Spectrum::filled(128, 255), 1);
        assert_eq!(style.spawned_last_frame(), 8);
        assert_eq!(style.live_entities(), 8);
    }

    #[test]
    fn test_pool_is_capped() {
        let mut style = AbstractStyle::new(3);
        run(&mut style, &Spectrum::filled(128, 255), 40);
        assert!(style.live_entities() <= POOL_CAP);
        assert_eq!(style.spawned_last_frame(), 8);
    }

    #[test]
    fn test_shapes_fade_out_after_silence() {
        let mut style = AbstractStyle::new(5);
        run(&mut style, &Spectrum::filled(128, 200), 3);
        assert!(style.live_entities() > 0);
        // Lifetime is 1 / (0.01 * 0.256) frames at 16 ms
        run(&mut style, &Spectrum::new(128), 400);
        assert_eq!(style.live_entities(), 0);
    }
}

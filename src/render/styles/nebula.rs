//! Drifting star field over a slowly cycling nebula.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Style, StyleKind, dot_radius, fade};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::{CompositeMode, Surface};

const STAR_COUNT: usize = 100;
const CLOUDS: usize = 5;
const GLOW_LAYERS: usize = 3;

#[derive(Debug, Clone)]
struct Star {
    x: f32,
    y: f32,
    size: f32,
    speed: f32,
    angle: f32,
    pulse: f32,
}

pub struct NebulaStyle {
    rng: StdRng,
    stars: Vec<Star>,
    /// Surface size the field was seeded for.
    seeded_for: (u32, u32),
    spawned: usize,
}

impl NebulaStyle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            stars: Vec::new(),
            seeded_for: (0, 0),
            spawned: 0,
        }
    }

    fn seed_field(&mut self, frame: &FrameContext) {
        let rng = &mut self.rng;
        self.stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.random::<f32>() * frame.w(),
                y: rng.random::<f32>() * frame.h(),
                size: 1.0 + rng.random::<f32>() * 3.0,
                speed: 0.5 + rng.random::<f32>() * 2.0,
                angle: rng.random::<f32>() * TAU,
                pulse: rng.random::<f32>() * TAU,
            })
            .collect();
        self.seeded_for = (frame.width, frame.height);
        self.spawned = STAR_COUNT;
    }
}

impl Style for NebulaStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Nebula
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        self.spawned = 0;
        if frame.is_empty() {
            return;
        }
        if self.stars.is_empty() || self.seeded_for != (frame.width, frame.height) {
            self.seed_field(frame);
        }
        let (w, h) = (frame.w(), frame.h());
        let intensity = frame.intensity();
        let s = frame.scale();
        let t = frame.time_s;

        fade(surface, frame, 0.1);

        let backdrop = Gradient::radial(w / 2.0, h / 2.0, 0.0, w.max(h) / 2.0)
            .with_stop(0.0, Color::hsla(t * 20.0, 0.7, 0.2, 0.2))
            .with_stop(0.5, Color::hsla(t * 20.0 + 30.0, 0.6, 0.3, 0.1))
            .with_stop(1.0, Color::TRANSPARENT);
        surface.fill_rect(0.0, 0.0, w, h, &Paint::Gradient(backdrop));

        for star in &mut self.stars {
            let drift = star.speed * intensity * 0.5 * s;
            star.x += star.angle.cos() * drift;
            star.y += star.angle.sin() * drift;
            star.pulse += 0.05;
            if star.x < 0.0 {
                star.x = w;
            } else if star.x > w {
                star.x = 0.0;
            }
            if star.y < 0.0 {
                star.y = h;
            } else if star.y > h {
                star.y = 0.0;
            }

            let hue = t * 20.0 + star.angle.to_degrees();
            let color = Color::hsl(hue, 1.0, 0.7 + star.pulse.sin() * 0.2);
            let radius = star.size * (1.0 + star.pulse.sin() * 0.3) * s;

            for layer in (0..GLOW_LAYERS).rev() {
                let mut halo = Path::new();
                halo.circle(star.x, star.y, radius * (2.0 + layer as f32));
                surface.fill_path(&halo, &Paint::Solid(color.with_alpha(0.06)));
            }
            let mut core = Path::new();
            core.circle(star.x, star.y, dot_radius(radius));
            surface.fill_path(&core, &Paint::Solid(color));
        }

        if intensity > 0.0 {
            surface.set_composite(CompositeMode::Screen);
            for i in 0..CLOUDS {
                let x = w * i as f32 / CLOUDS as f32;
                let y = h / 2.0 + (t + i as f32).sin() * 50.0 * s;
                let cloud = Gradient::radial(x, y, 0.0, 200.0 * s)
                    .with_stop(0.0, Color::hsla(t * 30.0 + i as f32 * 60.0, 0.7, 0.5, 0.1 * intensity))
                    .with_stop(1.0, Color::TRANSPARENT);
                surface.fill_rect(0.0, 0.0, w, h, &Paint::Gradient(cloud));
            }
            surface.set_composite(CompositeMode::SourceOver);
        }
    }

    fn spawned_last_frame(&self) -> usize {
        self.spawned
    }

    fn live_entities(&self) -> usize {
        self.stars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Spectrum;
    use crate::render::scheduler::FrameTiming;
    use crate::render::surface::RecordingSurface;

    fn frame(spectrum: &Spectrum, width: u32, height: u32) -> FrameContext<'_> {
        FrameContext::new(width, height, spectrum, FrameTiming { delta_ms: 16.0, time_s: 0.5 })
    }

    #[test]
    fn test_field_is_created_once() {
        let loud = Spectrum::filled(128, 255);
        let mut style = NebulaStyle::new(3);
        let mut surface = RecordingSurface::new(800, 450);

        style.render(&mut surface, &frame(&loud, 800, 450));
        assert_eq!(style.spawned_last_frame(), STAR_COUNT);
        style.render(&mut surface, &frame(&loud, 800, 450));
        assert_eq!(style.spawned_last_frame(), 0);
        assert_eq!(style.live_entities(), STAR_COUNT);
    }

    #[test]
    fn test_resize_reseeds_inside_new_bounds() {
        let loud = Spectrum::filled(128, 255);
        let mut style = NebulaStyle::new(3);
        let mut surface = RecordingSurface::new(800, 450);
        style.render(&mut surface, &frame(&loud, 800, 450));

        surface.resize(100, 60);
        style.render(&mut surface, &frame(&loud, 100, 60));
        assert_eq!(style.spawned_last_frame(), STAR_COUNT);
        assert!(style.stars.iter().all(|s| s.x <= 100.0 && s.y <= 60.0));
    }

    #[test]
    fn test_stars_hold_still_in_silence() {
        let silent = Spectrum::new(128);
        let mut style = NebulaStyle::new(8);
        let mut surface = RecordingSurface::new(320, 180);
        style.render(&mut surface, &frame(&silent, 320, 180));
        let before: Vec<(f32, f32)> = style.stars.iter().map(|s| (s.x, s.y)).collect();
        style.render(&mut surface, &frame(&silent, 320, 180));
        let after: Vec<(f32, f32)> = style.stars.iter().map(|s| (s.x, s.y)).collect();
        assert_eq!(before, after);
    }
}

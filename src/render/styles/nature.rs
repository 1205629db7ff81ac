//! Trees, flowers and butterflies that morph into one another under a
//! shifting sky.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Style, StyleKind, dot_radius, energy_gate};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::Surface;

const SLOTS: usize = 15;
const SPAWN_THRESHOLD: f32 = 0.6;
const POOL_CAP: usize = 60;
const MAX_SPARKLES: f32 = 30.0;
const BRANCH_LEVELS: u32 = 3;
const TRUNK_HEIGHT: f32 = 60.0;
const MORPH_RATE: f32 = 0.02;
const LIFE_DRAIN: f32 = 0.004;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Tree,
    Flower,
    Butterfly,
}

impl Kind {
    fn random(rng: &mut StdRng) -> Kind {
        match rng.random_range(0..3) {
            0 => Kind::Tree,
            1 => Kind::Flower,
            _ => Kind::Butterfly,
        }
    }
}

#[derive(Debug, Clone)]
struct Element {
    kind: Kind,
    target: Kind,
    morph: f32,
    x: f32,
    y: f32,
    scale: f32,
    tilt: f32,
    hue: f32,
    phase: f32,
    life: f32,
}

pub struct NatureStyle {
    rng: StdRng,
    elements: Vec<Element>,
    spawned: usize,
}

impl NatureStyle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            elements: Vec::with_capacity(POOL_CAP),
            spawned: 0,
        }
    }

    fn spawn(&mut self, frame: &FrameContext) {
        let mut spawned = 0;
        for slot in 0..SLOTS {
            if !energy_gate(&mut self.rng, frame.amplitude_at(slot, SLOTS), SPAWN_THRESHOLD) {
                continue;
            }
            let kind = Kind::random(&mut self.rng);
            let target = Kind::random(&mut self.rng);
            let rng = &mut self.rng;
            self.elements.push(Element {
                kind,
                target,
                morph: 0.0,
                x: rng.random::<f32>() * frame.w(),
                y: frame.h() - rng.random::<f32>() * frame.h() * 0.3,
                scale: 0.6 + rng.random::<f32>() * 0.6,
                tilt: (rng.random::<f32>() - 0.5) * 0.6,
                hue: rng.random::<f32>() * 360.0,
                phase: rng.random::<f32>() * TAU,
                life: 1.0,
            });
            spawned += 1;
        }
        self.spawned = spawned;

        if self.elements.len() > POOL_CAP {
            let excess = self.elements.len() - POOL_CAP;
            self.elements.drain(..excess);
        }
    }

    fn advance(&mut self, frame: &FrameContext) {
        let step = frame.delta_ms * 0.016;
        for e in &mut self.elements {
            e.morph += MORPH_RATE;
            if e.morph >= 1.0 {
                e.kind = e.target;
                e.target = Kind::random(&mut self.rng);
                e.morph = 0.0;
            }
            e.life -= LIFE_DRAIN * step;
        }
        self.elements.retain(|e| e.life > 0.0);
    }
}

fn sky(surface: &mut dyn Surface, frame: &FrameContext, intensity: f32) {
    let t = frame.time_s;
    let gradient = Gradient::linear(0.0, 0.0, 0.0, frame.h())
        .with_stop(0.0, Color::hsl(t * 10.0, 0.7, 0.2 + intensity * 0.3))
        .with_stop(1.0, Color::hsl(t * 10.0 + 60.0, 0.6, 0.4 + intensity * 0.3));
    surface.fill_rect(0.0, 0.0, frame.w(), frame.h(), &Paint::Gradient(gradient));
}

fn line(surface: &mut dyn Surface, from: (f32, f32), to: (f32, f32), color: Color, width: f32) {
    let mut path = Path::new();
    path.move_to(from.0, from.1).line_to(to.0, to.1);
    surface.stroke_path(&path, &Paint::Solid(color), width);
}

fn ellipse(surface: &mut dyn Surface, cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32, color: Color) {
    let mut path = Path::new();
    path.ellipse(cx, cy, rx, ry, rotation, 0.0, TAU);
    path.close();
    surface.fill_path(&path, &Paint::Solid(color));
}

fn branch(surface: &mut dyn Surface, from: (f32, f32), length: f32, angle: f32, level: u32, bark: Color) {
    if level >= BRANCH_LEVELS {
        return;
    }
    let to = (from.0 + angle.cos() * length, from.1 + angle.sin() * length);
    let fade = 1.0 - level as f32 / (BRANCH_LEVELS + 1) as f32;
    line(surface, from, to, bark.with_alpha(bark.a * fade), 4.0 - level as f32);
    branch(surface, to, length * 0.7, angle - 0.5, level + 1, bark);
    branch(surface, to, length * 0.7, angle + 0.5, level + 1, bark);
}

fn tree(surface: &mut dyn Surface, intensity: f32, alpha: f32) {
    let bark = Color::hsla(30.0, 0.5, 0.2 + intensity * 0.3, alpha);
    let top = (0.0, -TRUNK_HEIGHT);
    line(surface, (0.0, 0.0), top, bark, 4.0);
    branch(surface, top, TRUNK_HEIGHT * 0.7, -FRAC_PI_2 - 0.3, 0, bark);
    branch(surface, top, TRUNK_HEIGHT * 0.7, -FRAC_PI_2 + 0.3, 0, bark);
}

fn flower(surface: &mut dyn Surface, intensity: f32, time: f32, hue: f32, alpha: f32) {
    let stem = Color::hsla(120.0, 0.5, 0.3 + intensity * 0.2, alpha);
    line(surface, (0.0, 0.0), (0.0, -40.0), stem, 2.0);

    surface.save();
    surface.translate(0.0, -40.0);
    for i in 0..6 {
        let angle = i as f32 / 6.0 * TAU + time;
        let petal = 30.0 * (1.0 + (time * 2.0 + i as f32).sin() * 0.2);
        ellipse(
            surface,
            angle.cos() * 15.0,
            angle.sin() * 15.0,
            petal,
            petal / 2.0,
            angle,
            Color::hsla(hue, 0.7, 0.5, alpha),
        );
    }
    let mut center = Path::new();
    center.circle(0.0, 0.0, 10.0);
    let heart = Color::hsla(60.0, 0.8, 0.7 + intensity * 0.3, alpha);
    surface.fill_path(&center, &Paint::Solid(heart));
    surface.restore();
}

fn butterfly(surface: &mut dyn Surface, intensity: f32, time: f32, hue: f32, alpha: f32) {
    let flap = (time * 5.0).sin() * 0.5;
    let wing = Color::hsla(hue, 0.7, 0.5, alpha);

    for (side, tilt) in [(-1.0f32, FRAC_PI_4), (1.0, -FRAC_PI_4)] {
        surface.save();
        surface.rotate(-side * flap);
        ellipse(surface, side * 15.0, 0.0, 30.0, 18.0, tilt, wing);
        surface.restore();
    }
    let body = Color::hsla(0.0, 0.0, 0.2 + intensity * 0.3, alpha);
    ellipse(surface, 0.0, 0.0, 3.0, 15.0, 0.0, body);
}

fn draw_kind(surface: &mut dyn Surface, kind: Kind, e: &Element, intensity: f32, time: f32, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let local = time + e.phase;
    match kind {
        Kind::Tree => tree(surface, intensity, alpha),
        Kind::Flower => flower(surface, intensity, local, e.hue, alpha),
        Kind::Butterfly => butterfly(surface, intensity, local, e.hue, alpha),
    }
}

impl Style for NatureStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Nature
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        self.spawned = 0;
        if frame.is_empty() {
            return;
        }
        let intensity = frame.intensity();
        let t = frame.time_s;
        let s = frame.scale();

        self.spawn(frame);
        sky(surface, frame, intensity);
        self.advance(frame);

        for e in &self.elements {
            surface.save();
            surface.translate(e.x, e.y);
            surface.rotate(e.tilt + (t + e.phase).sin() * 0.05 * intensity);
            surface.scale(e.scale * s, e.scale * s);

            let opacity = e.life.min(1.0);
            if e.kind == e.target {
                draw_kind(surface, e.kind, e, intensity, t, opacity);
            } else {
                draw_kind(surface, e.kind, e, intensity, t, opacity * (1.0 - e.morph));
                draw_kind(surface, e.target, e, intensity, t, opacity * e.morph);
            }
            surface.restore();
        }

        let sparkles = (MAX_SPARKLES * intensity).floor() as usize;
        for i in 0..sparkles {
            let x = self.rng.random::<f32>() * frame.w();
            let y = self.rng.random::<f32>() * frame.h();
            let r = dot_radius((1.0 + self.rng.random::<f32>() * 2.0) * s);
            let alpha = self.rng.random::<f32>() * 0.4;
            let mut dot = Path::new();
            dot.circle(x, y, r);
            let color = Color::hsla(t * 50.0 + i as f32 * 20.0, 1.0, 0.7, alpha);
            surface.fill_path(&dot, &Paint::Solid(color));
        }
    }

    fn spawned_last_frame(&self) -> usize {
        self.spawned
    }

    fn live_entities(&self) -> usize {
        self.elements.len()
    }
}

//! Rising smoke puffs carried by a coarse diffusing fluid field, under slow
//! light rays.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Style, StyleKind, energy_gate, fade};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::{CompositeMode, Surface};

const BASE_SLOTS: f32 = 15.0;
const EXTRA_SLOTS: f32 = 25.0;
const SPAWN_THRESHOLD: f32 = 0.2;
const POOL_CAP: usize = 160;
const RAYS: usize = 12;
const OUTLINE_POINTS: usize = 12;
/// Growth per frame, compounding up to `MAX_GROWTH` times the spawn size.
const GROWTH: f32 = 1.01;
const MAX_GROWTH: f32 = 2.5;

/// Cells per side of the fluid field, which spans the whole surface.
const GRID: usize = 32;
/// Share of each neighbour difference exchanged per 16 ms step. Stable while
/// below 0.25.
const DIFFUSION: f32 = 0.1;
const DENSITY_DECAY: f32 = 0.985;
const VELOCITY_DAMPING: f32 = 0.9;
/// Upward pull per unit of density, in reference pixels per frame.
const BUOYANCY: f32 = 0.05;
const MAX_FLOW: f32 = 6.0;
const VELOCITY_COUPLING: f32 = 0.5;
const HAZE_FLOOR: f32 = 0.02;

/// Symmetric neighbour exchange: every adjacent pair trades `rate` times
/// their difference, measured before any cell moves. Mass is conserved.
fn diffuse(field: &mut [f32], flux: &mut [f32], rate: f32) {
    flux.fill(0.0);
    for y in 0..GRID {
        for x in 0..GRID {
            let i = y * GRID + x;
            if x + 1 < GRID {
                let pull = (field[i + 1] - field[i]) * rate;
                flux[i] += pull;
                flux[i + 1] -= pull;
            }
            if y + 1 < GRID {
                let j = i + GRID;
                let pull = (field[j] - field[i]) * rate;
                flux[i] += pull;
                flux[j] -= pull;
            }
        }
    }
    for (value, delta) in field.iter_mut().zip(flux.iter()) {
        *value += delta;
    }
}

/// Density and velocity over the unit square, `GRID` cells per side.
#[derive(Debug, Clone)]
struct FluidGrid {
    density: Vec<f32>,
    vx: Vec<f32>,
    vy: Vec<f32>,
    flux: Vec<f32>,
}

impl FluidGrid {
    fn new() -> Self {
        let cells = GRID * GRID;
        Self {
            density: vec![0.0; cells],
            vx: vec![0.0; cells],
            vy: vec![0.0; cells],
            flux: vec![0.0; cells],
        }
    }

    /// Cell under normalized coordinates, `None` outside the unit square.
    fn cell(u: f32, v: f32) -> Option<usize> {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let x = ((u * GRID as f32) as usize).min(GRID - 1);
        let y = ((v * GRID as f32) as usize).min(GRID - 1);
        Some(y * GRID + x)
    }

    fn add_density(&mut self, u: f32, v: f32, amount: f32) {
        if let Some(i) = Self::cell(u, v) {
            self.density[i] += amount;
        }
    }

    fn add_velocity(&mut self, u: f32, v: f32, dx: f32, dy: f32) {
        if let Some(i) = Self::cell(u, v) {
            self.vx[i] += dx;
            self.vy[i] += dy;
        }
    }

    fn velocity_at(&self, u: f32, v: f32) -> (f32, f32) {
        Self::cell(u, v).map_or((0.0, 0.0), |i| (self.vx[i], self.vy[i]))
    }

    #[cfg(test)]
    fn total_density(&self) -> f32 {
        self.density.iter().sum()
    }

    fn step(&mut self, delta_ms: f32) {
        let rate = DIFFUSION * (delta_ms / 16.0).clamp(0.0, 1.0);
        diffuse(&mut self.vx, &mut self.flux, rate);
        diffuse(&mut self.vy, &mut self.flux, rate);
        diffuse(&mut self.density, &mut self.flux, rate);

        for i in 0..self.density.len() {
            self.vy[i] -= BUOYANCY * self.density[i];
            self.vx[i] = (self.vx[i] * VELOCITY_DAMPING).clamp(-MAX_FLOW, MAX_FLOW);
            self.vy[i] = (self.vy[i] * VELOCITY_DAMPING).clamp(-MAX_FLOW, MAX_FLOW);
            self.density[i] *= DENSITY_DECAY;
        }
    }
}

#[derive(Debug, Clone)]
struct Puff {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    max_size: f32,
    life: f32,
    hue: f32,
    opacity: f32,
    turbulence: f32,
    rotation: f32,
}

pub struct SmokeStyle {
    rng: StdRng,
    puffs: Vec<Puff>,
    fluid: FluidGrid,
    spawned: usize,
}

impl SmokeStyle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            puffs: Vec::with_capacity(POOL_CAP),
            fluid: FluidGrid::new(),
            spawned: 0,
        }
    }

    fn spawn(&mut self, frame: &FrameContext, intensity: f32) {
        let slots = (BASE_SLOTS + intensity * EXTRA_SLOTS).floor() as usize;
        let s = frame.scale();
        let mut spawned = 0;

        for slot in 0..slots {
            let amplitude = frame.amplitude_at(slot, slots);
            if !energy_gate(&mut self.rng, amplitude, SPAWN_THRESHOLD) {
                continue;
            }
            let rng = &mut self.rng;
            let size = (50.0 + rng.random::<f32>() * 100.0) * s;
            let (u, v) = (rng.random::<f32>(), rng.random::<f32>());
            let drift = (rng.random::<f32>() - 0.5) * 2.0 * amplitude;
            let rise = -1.0 - rng.random::<f32>() * 2.0 - intensity * 2.0;

            // The puff's energy stirs the field where it appears
            self.fluid.add_density(u, v, amplitude);
            self.fluid
                .add_velocity(u, v, drift * VELOCITY_COUPLING, rise * VELOCITY_COUPLING);

            self.puffs.push(Puff {
                x: u * frame.w(),
                y: v * frame.h(),
                vx: drift * s,
                vy: rise * s,
                size,
                max_size: size * MAX_GROWTH,
                life: 1.0,
                hue: frame.time_s * 20.0 + rng.random::<f32>() * 60.0,
                opacity: 0.2 + rng.random::<f32>() * 0.3,
                turbulence: rng.random::<f32>() * TAU,
                rotation: rng.random::<f32>() * TAU,
            });
            spawned += 1;
        }
        self.spawned = spawned;

        if self.puffs.len() > POOL_CAP {
            let excess = self.puffs.len() - POOL_CAP;
            self.puffs.drain(..excess);
        }
    }

    fn advance(&mut self, frame: &FrameContext, intensity: f32) {
        let s = frame.scale();
        self.fluid.step(frame.delta_ms);

        let (w, h) = (frame.w(), frame.h());
        for p in &mut self.puffs {
            let (flow_x, flow_y) = self.fluid.velocity_at(p.x / w, p.y / h);
            p.turbulence += 0.02;
            p.rotation += 0.005 * intensity;
            p.x += p.vx + (flow_x + p.turbulence.sin() * 2.0 * intensity) * s;
            p.y += p.vy + (flow_y + p.turbulence.cos() * 2.0 * intensity) * s;
            p.life -= 0.002 * frame.delta_ms * 0.1;
            p.size = (p.size * GROWTH).min(p.max_size);
        }
        // Puffs that rose fully past the top are gone for good
        self.puffs.retain(|p| p.life > 0.0 && p.y + p.size > 0.0);
    }

    /// Tint every cell dense enough to show, under the puffs.
    fn draw_haze(&self, surface: &mut dyn Surface, frame: &FrameContext) {
        let (cw, ch) = (frame.w() / GRID as f32, frame.h() / GRID as f32);
        for (i, &d) in self.fluid.density.iter().enumerate() {
            if d < HAZE_FLOOR {
                continue;
            }
            let (x, y) = ((i % GRID) as f32 * cw, (i / GRID) as f32 * ch);
            let color = Color::hsla(frame.time_s * 30.0 + d * 360.0, 0.6, 0.5, (d * 0.1).min(0.15));
            surface.fill_rect(x, y, cw, ch, &Paint::Solid(color));
        }
    }

    fn draw_puff(surface: &mut dyn Surface, p: &Puff, intensity: f32, s: f32) {
        let alpha = p.opacity * p.life;
        let tint = |a: f32| Color::hsla(p.hue, 0.7, 0.5, a);
        let gradient = Gradient::radial(0.0, 0.0, 0.0, p.size)
            .with_stop(0.0, tint(alpha * 1.5))
            .with_stop(0.4, tint(alpha * 0.8))
            .with_stop(0.7, tint(alpha * 0.4))
            .with_stop(1.0, Color::TRANSPARENT);

        // Wobbly outline: radius distorted by a three-lobe ripple
        let mut outline = Path::new();
        for i in 0..OUTLINE_POINTS {
            let angle = i as f32 / OUTLINE_POINTS as f32 * TAU;
            let distortion = (angle * 3.0 + p.turbulence).sin() * 15.0 * intensity * s;
            let r = p.size + distortion;
            let (x, y) = (angle.cos() * r, angle.sin() * r);
            if i == 0 {
                outline.move_to(x, y);
            } else {
                outline.quad_to(x * 0.9, y * 0.9, x, y);
            }
        }
        outline.close();

        surface.save();
        surface.translate(p.x, p.y);
        surface.rotate(p.rotation);
        surface.fill_path(&outline, &Paint::Gradient(gradient));
        surface.restore();
    }
}

impl Style for SmokeStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Smoke
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        self.spawned = 0;
        if frame.is_empty() {
            return;
        }
        let intensity = frame.intensity();
        let s = frame.scale();
        let t = frame.time_s;

        self.spawn(frame, intensity);
        fade(surface, frame, 0.05);
        self.advance(frame, intensity);
        self.draw_haze(surface, frame);

        // Small puffs first so the large ones layer over them
        let mut order: Vec<&Puff> = self.puffs.iter().collect();
        order.sort_by(|a, b| a.size.total_cmp(&b.size));
        for p in order {
            Self::draw_puff(surface, p, intensity, s);
        }

        if intensity > 0.0 {
            let (cx, cy) = (frame.w() / 2.0, frame.h() / 2.0);
            surface.set_composite(CompositeMode::Screen);
            for i in 0..RAYS {
                let angle = i as f32 / RAYS as f32 * TAU + t * 0.1;
                let ray = Gradient::linear(
                    cx,
                    cy,
                    cx + angle.cos() * frame.w(),
                    cy + angle.sin() * frame.h(),
                )
                .with_stop(0.0, Color::hsla(t * 30.0 + i as f32 * 45.0, 0.7, 0.5, 0.02 * intensity))
                .with_stop(1.0, Color::TRANSPARENT);
                surface.fill_rect(0.0, 0.0, frame.w(), frame.h(), &Paint::Gradient(ray));
            }
            surface.set_composite(CompositeMode::SourceOver);
        }
    }

    fn spawned_last_frame(&self) -> usize {
        self.spawned
    }

    fn live_entities(&self) -> usize {
        self.puffs.len()
    }
}

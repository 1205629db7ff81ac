//! Sierpinski triangle flanked by rotating Mandelbrot and Julia tiles.

use std::f32::consts::PI;

use super::{Style, StyleKind, fade};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::{CompositeMode, PixelBlock, Surface};

/// Iteration cap for both escape-time sets.
pub const MAX_ITERATIONS: u32 = 100;
const SIERPINSKI_DEPTH: u32 = 6;
const TILE_FRACTION: f32 = 0.3;

/// Iterations of `z = z^2 + c` from `z = 0` before `|z|^2 > 4`, capped at
/// [`MAX_ITERATIONS`].
pub fn mandelbrot_escape(cx: f32, cy: f32) -> u32 {
    julia_escape(0.0, 0.0, cx, cy)
}

/// Iterations of `z = z^2 + c` from `z` before `|z|^2 > 4`, capped at
/// [`MAX_ITERATIONS`].
pub fn julia_escape(mut zx: f32, mut zy: f32, cx: f32, cy: f32) -> u32 {
    let mut iteration = 0;
    while zx * zx + zy * zy <= 4.0 && iteration < MAX_ITERATIONS {
        let next = zx * zx - zy * zy + cx;
        zy = 2.0 * zx * zy + cy;
        zx = next;
        iteration += 1;
    }
    iteration
}

fn escape_color(hue: f32, iteration: u32) -> Color {
    let lightness = if iteration < MAX_ITERATIONS { 0.5 } else { 0.0 };
    Color::hsl(hue + iteration as f32 * 3.0, 0.8, lightness)
}

#[derive(Debug, Clone, Copy)]
enum EscapeSet {
    Mandelbrot,
    Julia { cx: f32, cy: f32 },
}

pub struct FractalStyle {
    mandelbrot: PixelBlock,
    julia: PixelBlock,
}

impl Default for FractalStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl FractalStyle {
    pub fn new() -> Self {
        Self {
            mandelbrot: PixelBlock::new(0, 0),
            julia: PixelBlock::new(0, 0),
        }
    }
}

/// Fill `tile` with the set, the plane rotated by `rotation` around the
/// tile centre and spanning four units across.
fn paint_tile(tile: &mut PixelBlock, set: EscapeSet, rotation: f32, hue: f32) {
    let size = tile.width();
    let half = size as f32 / 2.0;
    let units = size as f32 / 4.0;
    let (sin, cos) = (-rotation).sin_cos();

    for py in 0..size {
        for px in 0..size {
            let (lx, ly) = (px as f32 - half, py as f32 - half);
            let x = (lx * cos - ly * sin) / units;
            let y = (lx * sin + ly * cos) / units;
            let iteration = match set {
                EscapeSet::Mandelbrot => mandelbrot_escape(x, y),
                EscapeSet::Julia { cx, cy } => julia_escape(x, y, cx, cy),
            };
            tile.set(px, py, escape_color(hue, iteration));
        }
    }
}

fn sierpinski(surface: &mut dyn Surface, x: f32, y: f32, size: f32, depth: u32, time: f32) {
    if depth >= SIERPINSKI_DEPTH {
        return;
    }
    let height = size * (PI / 3.0).sin();
    let corners = [
        (x, y - height / 2.0),
        (x - size / 2.0, y + height / 2.0),
        (x + size / 2.0, y + height / 2.0),
    ];

    let mut path = Path::new();
    path.polygon(&corners);
    let alpha = 0.5 * (1.0 - depth as f32 / SIERPINSKI_DEPTH as f32);
    let color = Color::hsla(time * 50.0 + depth as f32 * 30.0, 0.7, 0.5, alpha);
    surface.fill_path(&path, &Paint::Solid(color));

    for i in 0..corners.len() {
        let (ax, ay) = corners[i];
        let (bx, by) = corners[(i + 1) % corners.len()];
        sierpinski(surface, (ax + bx) / 2.0, (ay + by) / 2.0, size / 2.0, depth + 1, time);
    }
}

impl Style for FractalStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Fractal
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        if frame.is_empty() {
            return;
        }
        let (w, h) = (frame.w(), frame.h());
        let t = frame.time_s;
        let intensity = frame.intensity();
        let tile = (w.min(h) * TILE_FRACTION) as u32;

        fade(surface, frame, 0.1);
        sierpinski(surface, w * 0.5, h * 0.5, w.min(h) * TILE_FRACTION, 0, t);

        if self.mandelbrot.width() != tile {
            self.mandelbrot = PixelBlock::new(tile, tile);
            self.julia = PixelBlock::new(tile, tile);
        }
        let julia_c = EscapeSet::Julia {
            cx: (t * 0.5).cos() * 0.7,
            cy: (t * 0.3).sin() * 0.7,
        };
        paint_tile(&mut self.mandelbrot, EscapeSet::Mandelbrot, t * 0.1, t * 50.0);
        paint_tile(&mut self.julia, julia_c, -t * 0.1, t * 30.0);

        let offset = (tile / 2) as i32;
        let cy = (h * 0.5) as i32;
        surface.put_pixels((w * 0.25) as i32 - offset, cy - offset, &self.mandelbrot);
        surface.put_pixels((w * 0.75) as i32 - offset, cy - offset, &self.julia);

        if intensity > 0.0 {
            let anchors = [(w * 0.25, h * 0.5), (w * 0.5, h * 0.5), (w * 0.75, h * 0.5)];
            surface.set_composite(CompositeMode::Screen);
            for (i, &(x0, y0)) in anchors.iter().enumerate() {
                let (x1, y1) = anchors[(i + 1) % anchors.len()];
                let gradient = Gradient::linear(x0, y0, x1, y1)
                    .with_stop(0.0, Color::hsla(t * 50.0 + i as f32 * 120.0, 1.0, 0.5, 0.2 * intensity))
                    .with_stop(1.0, Color::TRANSPARENT);
                let mut path = Path::new();
                path.move_to(x0, y0).line_to(x1, y1);
                surface.stroke_path(&path, &Paint::Gradient(gradient), 5.0 * intensity * frame.scale());
            }
            surface.set_composite(CompositeMode::SourceOver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Spectrum;
    use crate::render::canvas::PixelCanvas;
    use crate::render::scheduler::FrameTiming;
    use crate::render::surface::{DrawCall, RecordingSurface};

    #[test]
    fn test_origin_never_escapes() {
        assert_eq!(mandelbrot_escape(0.0, 0.0), MAX_ITERATIONS);
        assert_eq!(mandelbrot_escape(-1.0, 0.0), MAX_ITERATIONS);
    }

    #[test]
    fn test_far_point_escapes_immediately() {
        assert_eq!(mandelbrot_escape(3.0, 0.0), 1);
        assert_eq!(julia_escape(3.0, 3.0, 0.0, 0.0), 0);
    }

    #[test]
    fn test_julia_with_zero_c_is_unit_disc() {
        assert_eq!(julia_escape(0.5, 0.0, 0.0, 0.0), MAX_ITERATIONS);
        assert!(julia_escape(1.1, 0.0, 0.0, 0.0) < MAX_ITERATIONS);
    }

    #[test]
    fn test_tiles_are_placed_on_thirds() {
        let spectrum = Spectrum::filled(128, 128);
        let mut style = FractalStyle::new();
        let mut surface = RecordingSurface::new(1000, 500);
        let ctx = FrameContext::new(1000, 500, &spectrum, FrameTiming { delta_ms: 16.0, time_s: 2.0 });
        style.render(&mut surface, &ctx);

        let blocks: Vec<_> = surface
            .calls()
            .iter()
            .filter_map(|c| match c {
                DrawCall::PutPixels { x, y, width, .. } => Some((*x, *y, *width)),
                _ => None,
            })
            .collect();
        assert_eq!(blocks, vec![(250 - 75, 175, 150), (750 - 75, 175, 150)]);

        let triangles = surface
            .calls()
            .iter()
            .filter(|c| matches!(c, DrawCall::FillPath))
            .count();
        // 1 + 3 + 9 + 27 + 81 + 243
        assert_eq!(triangles, 364);
    }

    #[test]
    fn test_mandelbrot_interior_is_black() {
        let spectrum = Spectrum::new(128);
        let mut style = FractalStyle::new();
        let mut canvas = PixelCanvas::new(600, 300);
        let ctx = FrameContext::new(600, 300, &spectrum, FrameTiming { delta_ms: 16.0, time_s: 0.0 });
        style.render(&mut canvas, &ctx);
        // Tile centre maps to c = 0
        assert_eq!(canvas.rgb_at(150, 150), Some([0, 0, 0]));
        // Tile corner is far outside the set
        assert_ne!(canvas.rgb_at(150 - 44, 150 - 44), Some([0, 0, 0]));
    }
}

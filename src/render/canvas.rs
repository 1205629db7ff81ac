//! Software rasterizer implementing [`Surface`] over an `image` buffer.
//!
//! Pixels are stored premultiplied in `f32`. Coverage is sampled once per
//! pixel centre with the non-zero winding rule, so edges are aliased; that is
//! plenty for half-block terminal output and PNG export.

use std::f32::consts::TAU;
use std::path::Path as FsPath;

use image::{ImageBuffer, ImageResult, Rgba, RgbaImage};

use super::color::Color;
use super::paint::Paint;
use super::path::{Path, Polyline, Transform};
use super::surface::{CompositeMode, PixelBlock, Surface};

type PremulBuffer = ImageBuffer<Rgba<f32>, Vec<f32>>;

/// Segments used for round stroke joins.
const JOIN_SEGMENTS: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
struct DrawState {
    transform: Transform,
    composite: CompositeMode,
}

pub struct PixelCanvas {
    buffer: PremulBuffer,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Default for PixelCanvas {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer: ImageBuffer::new(width, height),
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    /// Flatten onto opaque black, the backdrop the visuals are designed for.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.buffer.width(), self.buffer.height(), |x, y| {
            Rgba(self.rgb_at(x, y).map_or([0, 0, 0, 255], |[r, g, b]| [r, g, b, 255]))
        })
    }

    /// Displayed color of one pixel over black.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.buffer.width() || y >= self.buffer.height() {
            return None;
        }
        // Premultiplied over black is just the color channels
        let p = self.buffer.get_pixel(x, y).0;
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Some([q(p[0]), q(p[1]), q(p[2])])
    }

    pub fn save_png(&self, path: &FsPath) -> ImageResult<()> {
        self.to_rgba_image().save(path)
    }

    fn fill_polygons(&mut self, polygons: &[Vec<(f32, f32)>], paint: &Paint) {
        let (width, height) = self.buffer.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let edges = collect_edges(polygons);
        if edges.is_empty() {
            return;
        }

        let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
        for e in &edges {
            min_y = min_y.min(e.y0);
            max_y = max_y.max(e.y1);
        }
        let row_start = (min_y - 0.5).ceil().max(0.0) as u32;
        let row_end = ((max_y - 0.5).ceil().max(0.0) as u32).min(height);

        let shader = Shader::new(paint, &self.state.transform);
        let Some(shader) = shader else {
            return;
        };
        let mode = self.state.composite;
        let mut crossings: Vec<(f32, i32)> = Vec::new();

        for py in row_start..row_end {
            let yc = py as f32 + 0.5;
            crossings.clear();
            for e in &edges {
                if e.y0 <= yc && yc < e.y1 {
                    crossings.push((e.x_at(yc), e.dir));
                }
            }
            if crossings.len() < 2 {
                continue;
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let start = (pair[0].0 - 0.5).ceil().max(0.0) as u32;
                let end = ((pair[1].0 - 0.5).ceil().max(0.0) as u32).min(width);
                for px in start..end {
                    let src = shader.color_at(px as f32 + 0.5, yc);
                    if src.a <= 0.0 {
                        continue;
                    }
                    let dst = self.buffer.get_pixel_mut(px, py);
                    blend(&mut dst.0, src.premultiplied(), mode);
                }
            }
        }
    }
}

impl Surface for PixelCanvas {
    fn width(&self) -> u32 {
        self.buffer.width()
    }

    fn height(&self) -> u32 {
        self.buffer.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.buffer = ImageBuffer::new(width, height);
        self.state = DrawState::default();
        self.stack.clear();
    }

    fn clear(&mut self, color: Color) {
        let p = color.premultiplied();
        for pixel in self.buffer.pixels_mut() {
            pixel.0 = p;
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.translated(x, y);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform.rotated(radians);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.scaled(sx, sy);
    }

    fn reset_transform(&mut self) {
        self.state.transform = Transform::IDENTITY;
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.state.composite = mode;
    }

    fn composite(&self) -> CompositeMode {
        self.state.composite
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        let t = self.state.transform;
        let corners = vec![
            t.apply(x, y),
            t.apply(x + w, y),
            t.apply(x + w, y + h),
            t.apply(x, y + h),
        ];
        self.fill_polygons(&[corners], paint);
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let polygons: Vec<Vec<(f32, f32)>> = path
            .flatten(&self.state.transform)
            .into_iter()
            .map(|p| p.points)
            .collect();
        self.fill_polygons(&polygons, paint);
    }

    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32) {
        if width.is_nan() || width <= 0.0 {
            return;
        }
        // Anything thinner than a pixel would miss every sample point
        let half = (width * self.state.transform.mean_scale() / 2.0).max(0.5);
        let polygons = stroke_outline(&path.flatten(&self.state.transform), half);
        self.fill_polygons(&polygons, paint);
    }

    fn put_pixels(&mut self, x: i32, y: i32, block: &PixelBlock) {
        let (width, height) = self.buffer.dimensions();
        for by in 0..block.height() {
            let dy = y + by as i32;
            if dy < 0 || dy >= height as i32 {
                continue;
            }
            for bx in 0..block.width() {
                let dx = x + bx as i32;
                if dx < 0 || dx >= width as i32 {
                    continue;
                }
                if let Some(color) = block.get(bx, by) {
                    self.buffer.get_pixel_mut(dx as u32, dy as u32).0 = color.premultiplied();
                }
            }
        }
    }

    fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.buffer.width() && y < self.buffer.height() {
            Some(Color::from_premultiplied(self.buffer.get_pixel(x, y).0))
        } else {
            None
        }
    }
}

/// Paint resolved against the transform in effect when drawing.
enum Shader<'a> {
    Solid(Color),
    Gradient {
        gradient: &'a super::paint::Gradient,
        to_user: Transform,
    },
}

impl<'a> Shader<'a> {
    fn new(paint: &'a Paint, transform: &Transform) -> Option<Self> {
        match paint {
            Paint::Solid(color) => Some(Shader::Solid(*color)),
            Paint::Gradient(gradient) => transform.invert().map(|to_user| Shader::Gradient {
                gradient,
                to_user,
            }),
        }
    }

    fn color_at(&self, x: f32, y: f32) -> Color {
        match self {
            Shader::Solid(color) => *color,
            Shader::Gradient { gradient, to_user } => {
                let (ux, uy) = to_user.apply(x, y);
                gradient.color_at(ux, uy)
            }
        }
    }
}

fn blend(dst: &mut [f32; 4], src: [f32; 4], mode: CompositeMode) {
    match mode {
        CompositeMode::SourceOver => {
            let inv = 1.0 - src[3];
            for i in 0..4 {
                dst[i] = src[i] + dst[i] * inv;
            }
        }
        CompositeMode::Screen => {
            for i in 0..4 {
                dst[i] = src[i] + dst[i] - src[i] * dst[i];
            }
        }
    }
}

/// Non-horizontal edge with `y0 < y1`; `dir` keeps the original direction.
struct Edge {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    dir: i32,
}

impl Edge {
    fn x_at(&self, y: f32) -> f32 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

fn collect_edges(polygons: &[Vec<(f32, f32)>]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for poly in polygons {
        if poly.len() < 3 || poly.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            continue;
        }
        for (i, &(ax, ay)) in poly.iter().enumerate() {
            let (bx, by) = poly[(i + 1) % poly.len()];
            if ay == by {
                continue;
            }
            edges.push(if ay < by {
                Edge {
                    x0: ax,
                    y0: ay,
                    x1: bx,
                    y1: by,
                    dir: 1,
                }
            } else {
                Edge {
                    x0: bx,
                    y0: by,
                    x1: ax,
                    y1: ay,
                    dir: -1,
                }
            });
        }
    }
    edges
}

fn signed_area(poly: &[(f32, f32)]) -> f32 {
    let mut area = 0.0;
    for (i, &(ax, ay)) in poly.iter().enumerate() {
        let (bx, by) = poly[(i + 1) % poly.len()];
        area += ax * by - bx * ay;
    }
    area / 2.0
}

fn push_oriented(out: &mut Vec<Vec<(f32, f32)>>, mut poly: Vec<(f32, f32)>) {
    if signed_area(&poly) < 0.0 {
        poly.reverse();
    }
    out.push(poly);
}

/// Stroke outline as same-orientation quads per segment plus round joins, so
/// the non-zero rule paints their union exactly once.
fn stroke_outline(polylines: &[Polyline], half: f32) -> Vec<Vec<(f32, f32)>> {
    let mut out = Vec::new();
    for line in polylines {
        let pts = &line.points;
        let segment_count = if line.closed { pts.len() } else { pts.len() - 1 };

        for i in 0..segment_count {
            let (x0, y0) = pts[i];
            let (x1, y1) = pts[(i + 1) % pts.len()];
            let (dx, dy) = (x1 - x0, y1 - y0);
            let len = dx.hypot(dy);
            if len <= 1e-6 {
                continue;
            }
            let (nx, ny) = (-dy / len * half, dx / len * half);
            push_oriented(
                &mut out,
                vec![
                    (x0 + nx, y0 + ny),
                    (x1 + nx, y1 + ny),
                    (x1 - nx, y1 - ny),
                    (x0 - nx, y0 - ny),
                ],
            );
        }

        if half >= 1.0 {
            let joins: Box<dyn Iterator<Item = &(f32, f32)>> = if line.closed {
                Box::new(pts.iter())
            } else {
                Box::new(pts.iter().skip(1).take(pts.len().saturating_sub(2)))
            };
            for &(cx, cy) in joins {
                let disc = (0..JOIN_SEGMENTS)
                    .map(|k| {
                        let a = TAU * k as f32 / JOIN_SEGMENTS as f32;
                        (cx + half * a.cos(), cy + half * a.sin())
                    })
                    .collect();
                push_oriented(&mut out, disc);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::paint::Gradient;

    fn red() -> Paint {
        Paint::Solid(Color::rgba(1.0, 0.0, 0.0, 1.0))
    }

    #[test]
    fn test_fill_rect_covers_exact_pixels() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.clear(Color::BLACK);
        canvas.fill_rect(2.0, 3.0, 4.0, 2.0, &red());
        assert_eq!(canvas.rgb_at(2, 3), Some([255, 0, 0]));
        assert_eq!(canvas.rgb_at(5, 4), Some([255, 0, 0]));
        assert_eq!(canvas.rgb_at(6, 4), Some([0, 0, 0]));
        assert_eq!(canvas.rgb_at(2, 5), Some([0, 0, 0]));
    }

    #[test]
    fn test_negative_height_rect_fills() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.fill_rect(0.0, 10.0, 2.0, -4.0, &red());
        assert_eq!(canvas.rgb_at(0, 9), Some([255, 0, 0]));
        assert_eq!(canvas.rgb_at(0, 5), Some([0, 0, 0]));
    }

    #[test]
    fn test_translucent_fade_accumulates() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.clear(Color::WHITE);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, &Paint::Solid(Color::black(0.2)));
        let [r, _, _] = canvas.rgb_at(1, 1).unwrap();
        assert_eq!(r, 204);
    }

    #[test]
    fn test_screen_mode_lightens() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.clear(Color::rgba(0.5, 0.5, 0.5, 1.0));
        canvas.set_composite(CompositeMode::Screen);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, &Paint::Solid(Color::rgba(0.5, 0.0, 0.0, 1.0)));
        let p = canvas.pixel(0, 0).unwrap();
        assert!((p.r - 0.75).abs() < 1e-4);
        assert!((p.g - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_transform_applies_to_paths() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.translate(10.0, 10.0);
        let mut path = Path::new();
        path.circle(0.0, 0.0, 3.0);
        canvas.fill_path(&path, &red());
        assert_eq!(canvas.rgb_at(10, 10), Some([255, 0, 0]));
        assert_eq!(canvas.rgb_at(1, 1), Some([0, 0, 0]));
    }

    #[test]
    fn test_save_restore_transform() {
        let mut canvas = PixelCanvas::new(10, 10);
        canvas.save();
        canvas.translate(5.0, 5.0);
        canvas.set_composite(CompositeMode::Screen);
        canvas.restore();
        assert_eq!(canvas.composite(), CompositeMode::SourceOver);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0, &red());
        assert_eq!(canvas.rgb_at(0, 0), Some([255, 0, 0]));
    }

    #[test]
    fn test_stroke_self_overlap_blends_once() {
        let mut canvas = PixelCanvas::new(20, 20);
        let mut path = Path::new();
        path.move_to(2.0, 10.0).line_to(18.0, 10.0).line_to(10.0, 10.5);
        canvas.stroke_path(&path, &Paint::Solid(Color::white(0.5)), 4.0);
        let p = canvas.pixel(10, 10).unwrap();
        assert!((p.a - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_zero_width_stroke_draws_nothing() {
        let mut canvas = PixelCanvas::new(10, 10);
        let mut path = Path::new();
        path.move_to(0.0, 5.0).line_to(10.0, 5.0);
        canvas.stroke_path(&path, &red(), 0.0);
        assert_eq!(canvas.rgb_at(5, 5), Some([0, 0, 0]));
    }

    #[test]
    fn test_put_pixels_ignores_transform_and_clips() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.translate(100.0, 100.0);
        let mut block = PixelBlock::new(3, 3);
        block.set(2, 2, Color::WHITE);
        canvas.put_pixels(-1, -1, &block);
        assert_eq!(canvas.rgb_at(1, 1), Some([255, 255, 255]));
    }

    #[test]
    fn test_gradient_follows_transform() {
        let mut canvas = PixelCanvas::new(20, 4);
        canvas.translate(10.0, 0.0);
        let g = Gradient::linear(-10.0, 0.0, 10.0, 0.0)
            .with_stop(0.0, Color::BLACK)
            .with_stop(1.0, Color::WHITE);
        canvas.fill_rect(-10.0, 0.0, 20.0, 4.0, &Paint::Gradient(g));
        let [left, _, _] = canvas.rgb_at(0, 0).unwrap();
        let [right, _, _] = canvas.rgb_at(19, 0).unwrap();
        assert!(left < 20);
        assert!(right > 235);
    }

    #[test]
    fn test_zero_sized_canvas_is_noop() {
        let mut canvas = PixelCanvas::new(0, 0);
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0, &red());
        assert!(canvas.is_empty());
        assert_eq!(canvas.to_rgba_image().dimensions(), (0, 0));
    }

    #[test]
    fn test_png_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.fill_rect(0.0, 0.0, 8.0, 8.0, &red());
        canvas.save_png(&path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(3, 3).0, [255, 0, 0, 255]);
    }
}

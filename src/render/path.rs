//! Affine transforms and path construction/flattening.

use std::f32::consts::TAU;

/// 2D affine transform `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self * other`: apply `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translated(&self, tx: f32, ty: f32) -> Transform {
        self.then(&Transform {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        })
    }

    pub fn rotated(&self, angle: f32) -> Transform {
        let (sin, cos) = angle.sin_cos();
        self.then(&Transform {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn scaled(&self, sx: f32, sy: f32) -> Transform {
        self.then(&Transform {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Mean linear scale factor, used to size stroke widths.
    pub fn mean_scale(&self) -> f32 {
        self.determinant().abs().sqrt()
    }

    pub fn invert(&self) -> Option<Transform> {
        let det = self.determinant();
        if det.abs() < 1e-12 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    Close,
}

/// A sequence of subpaths in user space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
    current: Option<(f32, f32)>,
}

/// One flattened subpath in device space.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f32, f32)>,
    pub closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.segments.push(Segment::MoveTo(x, y));
        self.current = Some((x, y));
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        if self.current.is_none() {
            return self.move_to(x, y);
        }
        self.segments.push(Segment::LineTo(x, y));
        self.current = Some((x, y));
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        if self.current.is_none() {
            self.move_to(cx, cy);
        }
        self.segments.push(Segment::QuadTo(cx, cy, x, y));
        self.current = Some((x, y));
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if self.current.is_some() {
            self.segments.push(Segment::Close);
        }
        self
    }

    /// Circular arc from `start` to `end` radians (clockwise in screen space).
    /// Connects from the current point like a canvas arc.
    pub fn arc(&mut self, cx: f32, cy: f32, radius: f32, start: f32, end: f32) -> &mut Self {
        self.ellipse(cx, cy, radius, radius, 0.0, start, end)
    }

    /// Full circle as its own closed subpath.
    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        self.move_to(cx + radius.abs(), cy);
        self.arc(cx, cy, radius, 0.0, TAU);
        self.close()
    }

    /// Elliptical arc with axis rotation, flattened at construction time.
    #[allow(clippy::too_many_arguments)]
    pub fn ellipse(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        rotation: f32,
        start: f32,
        end: f32,
    ) -> &mut Self {
        let (rx, ry) = (rx.abs(), ry.abs());
        let sweep = (end - start).clamp(-TAU, TAU);
        let steps = ((rx.max(ry) * sweep.abs() / 2.0).ceil() as usize).clamp(8, 96);
        let (sin_r, cos_r) = rotation.sin_cos();

        for i in 0..=steps {
            let t = start + sweep * i as f32 / steps as f32;
            let (ex, ey) = (rx * t.cos(), ry * t.sin());
            let x = cx + ex * cos_r - ey * sin_r;
            let y = cy + ex * sin_r + ey * cos_r;
            self.line_to(x, y);
        }
        self
    }

    /// Axis-aligned rectangle as a closed subpath. Negative sizes are allowed.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        self.move_to(x, y);
        self.line_to(x + w, y);
        self.line_to(x + w, y + h);
        self.line_to(x, y + h);
        self.close()
    }

    /// Closed polygon through `points`.
    pub fn polygon(&mut self, points: &[(f32, f32)]) -> &mut Self {
        if let Some((&(x, y), rest)) = points.split_first() {
            self.move_to(x, y);
            for &(px, py) in rest {
                self.line_to(px, py);
            }
            self.close();
        }
        self
    }

    /// Flatten into device-space polylines under `transform`.
    pub fn flatten(&self, transform: &Transform) -> Vec<Polyline> {
        let mut out: Vec<Polyline> = Vec::new();
        let mut current: Option<Polyline> = None;
        let mut last_user = (0.0f32, 0.0f32);

        for segment in &self.segments {
            match *segment {
                Segment::MoveTo(x, y) => {
                    if let Some(poly) = current.take() {
                        out.push(poly);
                    }
                    current = Some(Polyline {
                        points: vec![transform.apply(x, y)],
                        closed: false,
                    });
                    last_user = (x, y);
                }
                Segment::LineTo(x, y) => {
                    if let Some(poly) = current.as_mut() {
                        poly.points.push(transform.apply(x, y));
                    }
                    last_user = (x, y);
                }
                Segment::QuadTo(cx, cy, x, y) => {
                    if let Some(poly) = current.as_mut() {
                        let (x0, y0) = last_user;
                        let span = ((cx - x0).hypot(cy - y0) + (x - cx).hypot(y - cy))
                            * transform.mean_scale();
                        let steps = ((span / 3.0).ceil() as usize).clamp(2, 32);
                        for i in 1..=steps {
                            let t = i as f32 / steps as f32;
                            let mt = 1.0 - t;
                            let px = mt * mt * x0 + 2.0 * mt * t * cx + t * t * x;
                            let py = mt * mt * y0 + 2.0 * mt * t * cy + t * t * y;
                            poly.points.push(transform.apply(px, py));
                        }
                    }
                    last_user = (x, y);
                }
                Segment::Close => {
                    if let Some(mut poly) = current.take() {
                        poly.closed = true;
                        let start = poly.points[0];
                        out.push(poly);
                        // Drawing after close continues from the subpath start
                        current = Some(Polyline {
                            points: vec![start],
                            closed: false,
                        });
                    }
                }
            }
        }

        if let Some(poly) = current {
            out.push(poly);
        }
        out.retain(|p| p.points.len() >= 2);
        out
    }
}

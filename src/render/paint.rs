//! Fill/stroke paints: solid colors and linear/radial gradients.

use super::color::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GradientShape {
    /// Axis from `(x0, y0)` to `(x1, y1)`.
    Linear { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Concentric circles between `r0` and `r1` around `(cx, cy)`.
    Radial { cx: f32, cy: f32, r0: f32, r1: f32 },
}

/// Gradient in user space. Stops are kept sorted by offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    shape: GradientShape,
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            shape: GradientShape::Linear { x0, y0, x1, y1 },
            stops: Vec::new(),
        }
    }

    pub fn radial(cx: f32, cy: f32, r0: f32, r1: f32) -> Self {
        Self {
            shape: GradientShape::Radial {
                cx,
                cy,
                r0: r0.max(0.0),
                r1: r1.max(0.0),
            },
            stops: Vec::new(),
        }
    }

    /// Add a stop; offsets are clamped to `[0, 1]`. Equal offsets keep
    /// insertion order so hard edges work.
    pub fn with_stop(mut self, offset: f32, color: Color) -> Self {
        let offset = if offset.is_finite() {
            offset.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let idx = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(idx, GradientStop { offset, color });
        self
    }

    pub fn shape(&self) -> &GradientShape {
        &self.shape
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Gradient parameter at a user-space point, `None` where undefined.
    fn parameter(&self, x: f32, y: f32) -> Option<f32> {
        match self.shape {
            GradientShape::Linear { x0, y0, x1, y1 } => {
                let (dx, dy) = (x1 - x0, y1 - y0);
                let len2 = dx * dx + dy * dy;
                if len2 <= f32::EPSILON {
                    return None;
                }
                Some(((x - x0) * dx + (y - y0) * dy) / len2)
            }
            GradientShape::Radial { cx, cy, r0, r1 } => {
                if (r1 - r0).abs() <= f32::EPSILON {
                    return None;
                }
                let dist = (x - cx).hypot(y - cy);
                Some((dist - r0) / (r1 - r0))
            }
        }
    }

    /// Color at a user-space point. Degenerate gradients paint nothing.
    pub fn color_at(&self, x: f32, y: f32) -> Color {
        match (self.parameter(x, y), self.stops.as_slice()) {
            (None, _) | (_, []) => Color::TRANSPARENT,
            (Some(t), stops) => sample_stops(stops, t),
        }
    }
}

fn sample_stops(stops: &[GradientStop], t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let first = stops[0];
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.offset {
            let span = hi.offset - lo.offset;
            if span <= f32::EPSILON {
                return hi.color;
            }
            return lo.color.lerp(hi.color, (t - lo.offset) / span);
        }
    }
    stops[stops.len() - 1].color
}

/// What a fill or stroke is painted with.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Gradient(Gradient),
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

impl From<Gradient> for Paint {
    fn from(gradient: Gradient) -> Self {
        Paint::Gradient(gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_midpoint_blends() {
        let g = Gradient::linear(0.0, 0.0, 100.0, 0.0)
            .with_stop(0.0, Color::BLACK)
            .with_stop(1.0, Color::WHITE);
        let c = g.color_at(50.0, 20.0);
        assert_abs_diff_eq!(c.r, 0.5, epsilon = 1e-4);
        assert_eq!(g.color_at(-10.0, 0.0), Color::BLACK);
        assert_eq!(g.color_at(500.0, 0.0), Color::WHITE);
    }

    #[test]
    fn test_radial_fades_out() {
        let g = Gradient::radial(10.0, 10.0, 0.0, 10.0)
            .with_stop(0.0, Color::WHITE)
            .with_stop(1.0, Color::TRANSPARENT);
        assert_abs_diff_eq!(g.color_at(10.0, 10.0).a, 1.0);
        assert_abs_diff_eq!(g.color_at(15.0, 10.0).a, 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(g.color_at(40.0, 10.0).a, 0.0);
    }

    #[test]
    fn test_stops_are_sorted() {
        let g = Gradient::linear(0.0, 0.0, 1.0, 0.0)
            .with_stop(1.0, Color::WHITE)
            .with_stop(0.0, Color::BLACK)
            .with_stop(0.5, Color::hsl(0.0, 1.0, 0.5));
        let offsets: Vec<f32> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_degenerate_gradient_paints_nothing() {
        let g = Gradient::linear(5.0, 5.0, 5.0, 5.0).with_stop(0.0, Color::WHITE);
        assert_eq!(g.color_at(5.0, 5.0), Color::TRANSPARENT);
        let empty = Gradient::radial(0.0, 0.0, 0.0, 10.0);
        assert_eq!(empty.color_at(1.0, 1.0), Color::TRANSPARENT);
    }
}

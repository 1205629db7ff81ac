//! Colors in straight (non-premultiplied) RGBA with HSL helpers.

/// RGBA color with components in `[0, 1]`, alpha not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Black at the given opacity, the fade-clear color.
    pub const fn black(alpha: f32) -> Self {
        Self::rgba(0.0, 0.0, 0.0, alpha)
    }

    /// White at the given opacity.
    pub const fn white(alpha: f32) -> Self {
        Self::rgba(1.0, 1.0, 1.0, alpha)
    }

    /// CSS-style `hsla()`: hue in degrees (any value, wrapped), saturation and
    /// lightness as fractions.
    pub fn hsla(hue_deg: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = wrap_hue(hue_deg) / 360.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::rgba(l, l, l, alpha.clamp(0.0, 1.0));
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgba(
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
            alpha.clamp(0.0, 1.0),
        )
    }

    pub fn hsl(hue_deg: f32, saturation: f32, lightness: f32) -> Self {
        Self::hsla(hue_deg, saturation, lightness, 1.0)
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Components multiplied by alpha.
    pub fn premultiplied(self) -> [f32; 4] {
        [self.r * self.a, self.g * self.a, self.b * self.a, self.a]
    }

    pub fn from_premultiplied(p: [f32; 4]) -> Self {
        if p[3] <= f32::EPSILON {
            return Self::TRANSPARENT;
        }
        Self::rgba(p[0] / p[3], p[1] / p[3], p[2] / p[3], p[3])
    }

    /// Interpolate in premultiplied space so fades to transparent keep their hue.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let a = self.premultiplied();
        let b = other.premultiplied();
        Self::from_premultiplied([
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ])
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Map any hue onto `[0, 360)`.
pub fn wrap_hue(hue_deg: f32) -> f32 {
    if hue_deg.is_finite() {
        hue_deg.rem_euclid(360.0)
    } else {
        0.0
    }
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

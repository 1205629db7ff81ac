//! Style registry and the shared generator contract.

mod abstract_shapes;
mod fractal;
mod minimal;
mod nature;
mod nebula;
mod neon;
mod retro;
mod smoke;
mod wave;

use std::fmt;

use rand::Rng;

use super::color::Color;
use super::paint::Paint;
use super::scheduler::FrameContext;
use super::surface::Surface;

pub use abstract_shapes::AbstractStyle;
pub use fractal::{FractalStyle, MAX_ITERATIONS, julia_escape, mandelbrot_escape};
pub use minimal::MinimalStyle;
pub use nature::NatureStyle;
pub use nebula::NebulaStyle;
pub use neon::NeonStyle;
pub use retro::RetroStyle;
pub use smoke::SmokeStyle;
pub use wave::WaveStyle;

/// One visual treatment of the spectrum.
///
/// `render` is called once per frame and owns all pacing; state persists
/// between calls until the generator is dropped.
pub trait Style {
    fn kind(&self) -> StyleKind;

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext);

    /// Entities created during the most recent `render`.
    fn spawned_last_frame(&self) -> usize {
        0
    }

    /// Entities alive after the most recent `render`.
    fn live_entities(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Abstract,
    Neon,
    Smoke,
    Nature,
    Retro,
    Minimal,
    Nebula,
    Fractal,
    Wave,
}

impl StyleKind {
    /// Every style in cycling order.
    pub const ALL: [StyleKind; 9] = [
        StyleKind::Abstract,
        StyleKind::Neon,
        StyleKind::Smoke,
        StyleKind::Nature,
        StyleKind::Retro,
        StyleKind::Minimal,
        StyleKind::Nebula,
        StyleKind::Fractal,
        StyleKind::Wave,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StyleKind::Abstract => "abstract",
            StyleKind::Neon => "neon",
            StyleKind::Smoke => "smoke",
            StyleKind::Nature => "nature",
            StyleKind::Retro => "retro",
            StyleKind::Minimal => "minimal",
            StyleKind::Nebula => "nebula",
            StyleKind::Fractal => "fractal",
            StyleKind::Wave => "wave",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StyleKind::Abstract => "Abstract",
            StyleKind::Neon => "Neon",
            StyleKind::Smoke => "Smoke",
            StyleKind::Nature => "Nature",
            StyleKind::Retro => "Retro",
            StyleKind::Minimal => "Minimal",
            StyleKind::Nebula => "Nebula",
            StyleKind::Fractal => "Fractal",
            StyleKind::Wave => "Wave",
        }
    }

    /// Parse a style key, ignoring case and surrounding whitespace.
    pub fn from_key(key: &str) -> Option<StyleKind> {
        let key = key.trim().to_ascii_lowercase();
        if key == "particle" {
            return Some(StyleKind::Abstract);
        }
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    pub fn next(self) -> StyleKind {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> StyleKind {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Fresh generator with its own seeded randomness.
    pub fn create(self, seed: u64) -> Box<dyn Style> {
        match self {
            StyleKind::Abstract => Box::new(AbstractStyle::new(seed)),
            StyleKind::Neon => Box::new(NeonStyle::new(seed)),
            StyleKind::Smoke => Box::new(SmokeStyle::new(seed)),
            StyleKind::Nature => Box::new(NatureStyle::new(seed)),
            StyleKind::Retro => Box::new(RetroStyle::new()),
            StyleKind::Minimal => Box::new(MinimalStyle::new()),
            StyleKind::Nebula => Box::new(NebulaStyle::new(seed)),
            StyleKind::Fractal => Box::new(FractalStyle::new()),
            StyleKind::Wave => Box::new(WaveStyle::new()),
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Spawn gate: never at or below `threshold`, always at full amplitude,
/// linearly more likely in between.
pub fn energy_gate<R: Rng + ?Sized>(rng: &mut R, amplitude: f32, threshold: f32) -> bool {
    if amplitude.is_nan() || amplitude <= threshold || threshold >= 1.0 {
        return false;
    }
    let chance = (amplitude - threshold) / (1.0 - threshold);
    chance >= 1.0 || rng.random::<f32>() < chance
}

/// Translucent black wash over the whole frame.
fn fade(surface: &mut dyn Surface, frame: &FrameContext, alpha: f32) {
    surface.fill_rect(
        0.0,
        0.0,
        frame.w(),
        frame.h(),
        &Paint::Solid(Color::black(alpha)),
    );
}

/// Smallest radius that still lands on a pixel centre.
const MIN_DOT_RADIUS: f32 = 0.75;

fn dot_radius(radius: f32) -> f32 {
    radius.max(MIN_DOT_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_from_key() {
        assert_eq!(StyleKind::from_key("wave"), Some(StyleKind::Wave));
        assert_eq!(StyleKind::from_key(" NEBULA "), Some(StyleKind::Nebula));
        assert_eq!(StyleKind::from_key("particle"), Some(StyleKind::Abstract));
        assert_eq!(StyleKind::from_key("vortex"), None);
        assert_eq!(StyleKind::from_key(""), None);
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        assert_eq!(StyleKind::Wave.next(), StyleKind::Abstract);
        assert_eq!(StyleKind::Abstract.previous(), StyleKind::Wave);
        let mut kind = StyleKind::Smoke;
        for _ in 0..StyleKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, StyleKind::Smoke);
    }

    #[test]
    fn test_create_matches_kind() {
        for kind in StyleKind::ALL {
            assert_eq!(kind.create(7).kind(), kind);
        }
    }

    #[test]
    fn test_energy_gate_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(energy_gate(&mut rng, 1.0, 0.6));
            assert!(!energy_gate(&mut rng, 0.6, 0.6));
            assert!(!energy_gate(&mut rng, 0.0, 0.2));
        }
    }

    #[test]
    fn test_energy_gate_is_proportional() {
        let mut rng = StdRng::seed_from_u64(2);
        let passes = (0..10_000)
            .filter(|_| energy_gate(&mut rng, 0.6, 0.2))
            .count();
        // Expected chance 0.5
        assert!((4500..5500).contains(&passes), "{}", passes);
    }
}

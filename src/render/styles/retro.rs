//! Arcade-style bar analyzer with falling peak caps and a CRT scanline.

use super::{Style, StyleKind};
use crate::render::color::Color;
use crate::render::paint::{Gradient, Paint};
use crate::render::path::Path;
use crate::render::scheduler::FrameContext;
use crate::render::surface::Surface;

const BAR_COUNT: usize = 32;
const BAR_HEIGHT: f32 = 0.8;
const BAR_FILL: f32 = 0.8;
const PEAK_DECAY: f32 = 0.92;
const GRID_SPACING: f32 = 20.0;
const SCANLINE_PERIOD_S: f32 = 2.0;

pub struct RetroStyle {
    peaks: [f32; BAR_COUNT],
}

impl Default for RetroStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl RetroStyle {
    pub fn new() -> Self {
        Self {
            peaks: [0.0; BAR_COUNT],
        }
    }

    /// Current cap heights in pixels.
    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }

    fn grid(surface: &mut dyn Surface, frame: &FrameContext) {
        let spacing = (GRID_SPACING * frame.scale()).max(4.0);
        let mut path = Path::new();
        let mut y = 0.0;
        while y < frame.h() {
            path.move_to(0.0, y).line_to(frame.w(), y);
            y += spacing;
        }
        surface.stroke_path(&path, &Paint::Solid(Color::white(0.1)), 1.0);
    }
}

impl Style for RetroStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::Retro
    }

    fn render(&mut self, surface: &mut dyn Surface, frame: &FrameContext) {
        if frame.is_empty() {
            return;
        }
        let (w, h) = (frame.w(), frame.h());
        let s = frame.scale();
        let bar_width = w / BAR_COUNT as f32;
        let cap = 10.0 * s;

        Self::grid(surface, frame);

        for (i, peak) in self.peaks.iter_mut().enumerate() {
            let height = h * frame.amplitude_at(i, BAR_COUNT) * BAR_HEIGHT;
            *peak = if height >= *peak { height } else { *peak * PEAK_DECAY };

            let hue = i as f32 / BAR_COUNT as f32 * 360.0;
            let x = i as f32 * bar_width;
            let top = h - height;

            if height > 0.0 {
                let side = Color::hsla(hue, 1.0, 0.4, 0.8);
                surface.fill_rect(x, h, bar_width * BAR_FILL, -height, &Paint::Solid(side));

                let face = Gradient::linear(x, top, x, top - cap)
                    .with_stop(0.0, Color::hsla(hue, 1.0, 0.6, 0.9))
                    .with_stop(1.0, Color::hsla(hue, 1.0, 0.8, 0.9));
                surface.fill_rect(x, top, bar_width * BAR_FILL, cap, &Paint::Gradient(face));
            }

            if *peak >= 1.0 {
                let marker = Color::hsla(hue, 1.0, 0.85, 0.9);
                surface.fill_rect(
                    x,
                    h - *peak - 3.0 * s,
                    bar_width * BAR_FILL,
                    (3.0 * s).max(1.0),
                    &Paint::Solid(marker),
                );
            }
        }

        let scan_y = (frame.time_s.rem_euclid(SCANLINE_PERIOD_S) / SCANLINE_PERIOD_S) * h;
        surface.fill_rect(0.0, scan_y, w, 2.0, &Paint::Solid(Color::white(0.1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Spectrum;
    use crate::render::scheduler::FrameTiming;
    use crate::render::surface::{DrawCall, RecordingSurface};
    use approx::assert_relative_eq;

    fn frame(spectrum: &Spectrum, t: f32) -> FrameContext<'_> {
        FrameContext::new(
            640,
            450,
            spectrum,
            FrameTiming {
                delta_ms: 16.0,
                time_s: t,
            },
        )
    }

    #[test]
    fn test_peaks_hold_then_decay() {
        let loud = Spectrum::filled(128, 255);
        let silent = Spectrum::new(128);
        let mut style = RetroStyle::new();
        let mut surface = RecordingSurface::new(640, 450);

        style.render(&mut surface, &frame(&loud, 0.0));
        assert_relative_eq!(style.peaks()[0], 360.0);

        style.render(&mut surface, &frame(&silent, 0.016));
        assert_relative_eq!(style.peaks()[0], 360.0 * PEAK_DECAY, epsilon = 1e-3);
        style.render(&mut surface, &frame(&silent, 0.032));
        assert_relative_eq!(style.peaks()[5], 360.0 * PEAK_DECAY * PEAK_DECAY, epsilon = 1e-3);
    }

    #[test]
    fn test_scanline_sweeps_every_two_seconds() {
        let silent = Spectrum::new(128);
        let mut style = RetroStyle::new();
        let mut surface = RecordingSurface::new(640, 450);

        let scan_y = |surface: &mut RecordingSurface, style: &mut RetroStyle, t: f32| {
            surface.take_calls();
            style.render(surface, &frame(&silent, t));
            match surface.calls().last() {
                Some(DrawCall::FillRect { y, .. }) => *y,
                other => panic!("unexpected {:?}", other),
            }
        };

        assert_relative_eq!(scan_y(&mut surface, &mut style, 0.5), 112.5);
        assert_relative_eq!(scan_y(&mut surface, &mut style, 2.5), 112.5, epsilon = 1e-3);
    }

    #[test]
    fn test_silence_draws_only_grid_and_scanline() {
        let silent = Spectrum::new(128);
        let mut style = RetroStyle::new();
        let mut surface = RecordingSurface::new(640, 450);
        style.render(&mut surface, &frame(&silent, 0.0));
        assert_eq!(surface.draw_count(), 2);
    }
}

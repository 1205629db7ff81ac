//! Owns the drawing surface between mount and unmount.

use log::debug;

use super::color::Color;
use super::paint::Paint;
use super::surface::{CompositeMode, Surface};
use crate::error::SurfaceError;

/// Opacity of the black wash laid over the previous frame.
pub const BASE_FADE_ALPHA: f32 = 0.2;

#[derive(Debug)]
pub struct SurfaceHost<S: Surface> {
    surface: Option<S>,
}

impl<S: Surface> Default for SurfaceHost<S> {
    fn default() -> Self {
        Self { surface: None }
    }
}

impl<S: Surface> SurfaceHost<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `surface`, sized and cleared to black.
    pub fn mount(&mut self, mut surface: S, width: u32, height: u32) {
        surface.resize(width, height);
        surface.clear(Color::BLACK);
        debug!("surface: mounted {}x{}", width, height);
        self.surface = Some(surface);
    }

    pub fn unmount(&mut self) -> Option<S> {
        let surface = self.surface.take();
        if surface.is_some() {
            debug!("surface: unmounted");
        }
        surface
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Resize in place. Does nothing when nothing is mounted or the size is
    /// unchanged.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(surface) = self.surface.as_mut() {
            if surface.width() == width && surface.height() == height {
                return;
            }
            surface.resize(width, height);
            surface.clear(Color::BLACK);
            debug!("surface: resized to {}x{}", width, height);
        }
    }

    pub fn surface(&self) -> Result<&S, SurfaceError> {
        self.surface.as_ref().ok_or(SurfaceError::Unavailable)
    }

    pub fn surface_mut(&mut self) -> Result<&mut S, SurfaceError> {
        self.surface.as_mut().ok_or(SurfaceError::Unavailable)
    }

    /// Reset drawing state left over from the previous frame and lay the
    /// base fade.
    pub fn begin_frame(&mut self) -> Result<&mut S, SurfaceError> {
        let surface = self.surface_mut()?;
        surface.reset_transform();
        surface.set_composite(CompositeMode::SourceOver);
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        surface.fill_rect(0.0, 0.0, w, h, &Paint::Solid(Color::black(BASE_FADE_ALPHA)));
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::{DrawCall, RecordingSurface};

    #[test]
    fn test_unmounted_surface_is_unavailable() {
        let mut host: SurfaceHost<RecordingSurface> = SurfaceHost::new();
        assert_eq!(host.begin_frame().err(), Some(SurfaceError::Unavailable));
    }

    #[test]
    fn test_begin_frame_resets_composite_and_fades() {
        let mut host = SurfaceHost::new();
        host.mount(RecordingSurface::default(), 40, 30);
        host.surface_mut().unwrap().set_composite(CompositeMode::Screen);

        let surface = host.begin_frame().unwrap();
        assert_eq!(surface.composite(), CompositeMode::SourceOver);
        assert_eq!(
            surface.calls().last(),
            Some(&DrawCall::FillRect {
                x: 0.0,
                y: 0.0,
                w: 40.0,
                h: 30.0
            })
        );
    }

    #[test]
    fn test_resize_changes_dimensions() {
        let mut host = SurfaceHost::new();
        host.mount(RecordingSurface::default(), 40, 30);
        host.resize(80, 10);
        let surface = host.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (80, 10));
    }

    #[test]
    fn test_unmount_returns_surface() {
        let mut host = SurfaceHost::new();
        host.mount(RecordingSurface::default(), 4, 4);
        assert!(host.unmount().is_some());
        assert!(host.unmount().is_none());
        assert!(!host.is_mounted());
    }
}

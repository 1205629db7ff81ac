//! The drawing interface every style renders through.

use super::color::Color;
use super::paint::Paint;
use super::path::Path;

/// How new pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    /// Lightening blend `s + d - s*d` per channel.
    Screen,
}

/// Rectangular block of straight-alpha pixels written with [`Surface::put_pixels`].
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelBlock {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }
}

/// 2D immediate-mode drawing target.
///
/// Coordinates are in pixels with the origin at the top-left corner. Path and
/// rect operations go through the current transform; `put_pixels` and
/// `clear` work in device space. `save`/`restore` cover the transform and the
/// composite mode.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize the backing store; contents and drawing state are reset.
    fn resize(&mut self, width: u32, height: u32);

    /// Replace every pixel with `color`.
    fn clear(&mut self, color: Color);

    fn save(&mut self);
    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn reset_transform(&mut self);

    fn set_composite(&mut self, mode: CompositeMode);
    fn composite(&self) -> CompositeMode;

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint);
    fn fill_path(&mut self, path: &Path, paint: &Paint);
    /// Stroke with a line `width` in user units. Non-positive widths draw nothing.
    fn stroke_path(&mut self, path: &Path, paint: &Paint, width: f32);

    /// Write pixels verbatim at a device-space offset, without compositing.
    fn put_pixels(&mut self, x: i32, y: i32, block: &PixelBlock);

    /// Read back one device pixel.
    fn pixel(&self, x: u32, y: u32) -> Option<Color>;

    fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Draw calls issued against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    FillRect { x: f32, y: f32, w: f32, h: f32 },
    FillPath,
    StrokePath { width: f32 },
    PutPixels { x: i32, y: i32, width: u32, height: u32 },
}

/// Surface that rasterizes nothing and records every draw call, for
/// inspecting what a frame would paint.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    composite: CompositeMode,
    depth: usize,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Draw calls that paint, excluding full clears.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !matches!(c, DrawCall::Clear(_)))
            .count()
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    /// Unbalanced `save` calls.
    pub fn save_depth(&self) -> usize {
        self.depth
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.composite = CompositeMode::SourceOver;
        self.depth = 0;
    }

    fn clear(&mut self, color: Color) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn save(&mut self) {
        self.depth += 1;
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn translate(&mut self, _x: f32, _y: f32) {}

    fn rotate(&mut self, _radians: f32) {}

    fn scale(&mut self, _sx: f32, _sy: f32) {}

    fn reset_transform(&mut self) {}

    fn set_composite(&mut self, mode: CompositeMode) {
        self.composite = mode;
    }

    fn composite(&self) -> CompositeMode {
        self.composite
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, _paint: &Paint) {
        self.calls.push(DrawCall::FillRect { x, y, w, h });
    }

    fn fill_path(&mut self, _path: &Path, _paint: &Paint) {
        self.calls.push(DrawCall::FillPath);
    }

    fn stroke_path(&mut self, _path: &Path, _paint: &Paint, width: f32) {
        self.calls.push(DrawCall::StrokePath { width });
    }

    fn put_pixels(&mut self, x: i32, y: i32, block: &PixelBlock) {
        self.calls.push(DrawCall::PutPixels {
            x,
            y,
            width: block.width(),
            height: block.height(),
        });
    }

    fn pixel(&self, _x: u32, _y: u32) -> Option<Color> {
        None
    }
}

// src/ui/widgets/raster.rs
//! Draws a [`PixelCanvas`] with upper half blocks, two pixels per cell.

use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

use crate::render::PixelCanvas;

const UPPER_HALF: &str = "▀";

pub struct Raster<'a> {
    canvas: &'a PixelCanvas,
}

impl<'a> Raster<'a> {
    pub fn new(canvas: &'a PixelCanvas) -> Self {
        Self { canvas }
    }
}

fn rgb(canvas: &PixelCanvas, x: u32, y: u32) -> Color {
    let [r, g, b] = canvas.rgb_at(x, y).unwrap_or([0, 0, 0]);
    Color::Rgb(r, g, b)
}

impl Widget for Raster<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let (x, y) = (col as u32, row as u32 * 2);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(UPPER_HALF)
                        .set_fg(rgb(self.canvas, x, y))
                        .set_bg(rgb(self.canvas, x, y + 1));
                }
            }
        }
    }
}

// src/ui/layout.rs
//! Layout computation for the raster and the status panel.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Rows taken by the bordered status panel.
const STATUS_HEIGHT: u16 = 4;

/// Computed layout areas for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputedLayout {
    /// Terminal cells showing the visuals
    pub raster: Rect,
    pub status: Option<Rect>,
}

impl ComputedLayout {
    /// Pixel size of the raster: one column per cell, two rows per cell.
    pub fn raster_pixels(&self) -> (u32, u32) {
        (self.raster.width as u32, self.raster.height as u32 * 2)
    }
}

/// Split `area` into raster and status panel. Terminals too short for both
/// give everything to the raster.
pub fn compute_layout(area: Rect) -> ComputedLayout {
    if area.height <= STATUS_HEIGHT * 2 {
        return ComputedLayout {
            raster: area,
            status: None,
        };
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)])
        .split(area);
    ComputedLayout {
        raster: chunks[0],
        status: Some(chunks[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_panel_at_bottom() {
        let layout = compute_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.raster, Rect::new(0, 0, 80, 20));
        assert_eq!(layout.status, Some(Rect::new(0, 20, 80, 4)));
        assert_eq!(layout.raster_pixels(), (80, 40));
    }

    #[test]
    fn test_short_terminal_is_all_raster() {
        let layout = compute_layout(Rect::new(0, 0, 40, 6));
        assert_eq!(layout.status, None);
        assert_eq!(layout.raster_pixels(), (40, 12));
    }
}

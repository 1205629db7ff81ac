//! Render module - drawing surface, frame scheduling and the style generators.

pub mod canvas;
pub mod color;
pub mod host;
pub mod paint;
pub mod path;
pub mod scheduler;
pub mod styles;
pub mod surface;

// Re-export commonly used types
pub use canvas::PixelCanvas;
pub use color::Color;
pub use host::SurfaceHost;
pub use paint::{Gradient, Paint};
pub use path::{Path, Transform};
pub use scheduler::{
    FrameClock, FrameContext, FrameHost, FrameOutcome, FrameQueue, FrameScheduler, FrameTiming,
    FrameToken,
};
pub use styles::{Style, StyleKind};
pub use surface::{CompositeMode, DrawCall, PixelBlock, RecordingSurface, Surface};

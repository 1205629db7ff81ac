// src/ui/widgets/mod.rs
//! Custom widgets for the auralux UI.

pub mod raster;
pub mod status_bar;

pub use raster::Raster;
pub use status_bar::{StatusView, render_status_bar};

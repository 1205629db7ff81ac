// src/ui/mod.rs
//! UI module - terminal host for the engine.

pub mod keybindings;
pub mod layout;
pub mod tui;
pub mod widgets;

// Re-export main entry point
pub use tui::run;

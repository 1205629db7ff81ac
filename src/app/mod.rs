// src/app/mod.rs
//! Application module - terminal player state and key handling.

pub mod state;

// Re-export the App struct
pub use state::App;

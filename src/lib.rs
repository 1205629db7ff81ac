// src/lib.rs
//! Auralux - audio-reactive procedural visuals.
//!
//! An audio source is analyzed into a byte spectrum every frame, and the
//! spectrum drives one of nine procedural styles painting a raster surface.
//! The binary hosts the engine in a terminal or exports frames as PNGs.

pub mod app;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod render;
pub mod ui;

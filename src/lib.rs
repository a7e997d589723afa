//! quickrec: a terminal voice recorder built around a scrolling amplitude waveform.
//!
//! The [`waveform`] module is the rendering and amplitude-processing pipeline and has
//! no terminal dependencies; the rest of the crate wires it to microphone capture,
//! a recordings store and a ratatui front end.

pub mod app;
pub mod commands;
pub mod config;
pub mod history;
pub mod logging;
pub mod playback;
pub mod recording;
pub mod setup;
pub mod ui;
pub mod waveform;

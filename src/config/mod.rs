//! Configuration management for quickrec.
//!
//! Loads the TOML config file and resolves the directories the app writes to.

pub mod file;

pub use file::{config_path, data_dir, AudioConfig, PreviewConfig, RecorderConfig};

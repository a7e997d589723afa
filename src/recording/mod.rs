//! Microphone recording for quickrec.
//!
//! Captures audio, meters its peaks for the live waveform and handles the keys of
//! the recording screen.

pub mod audio;
pub mod meter;
pub mod ui;

pub use audio::{AudioRecorder, SavedAudio};
pub use meter::PeakMeter;
pub use ui::{RecorderTui, RecordingCommand};

//! Waveform visualization engine.
//!
//! Turns amplitude readings into drawable bars. Two modes share the render model:
//!
//! - live: polled peak amplitudes are smoothed, pushed into a bounded window and laid
//!   out so the newest bar sits at a fixed "now" line while older bars scroll away.
//! - file: a stored recording is decoded off the render thread, reduced to a fixed
//!   number of RMS buckets, normalized and laid out once across the full width.
//!
//! Nothing in here draws pixels. Frames are emitted as [`DrawPrimitive`]s into a
//! [`DrawSurface`] supplied by the host.

pub mod decode;
pub mod downsample;
pub mod file_view;
pub mod layout;
pub mod live;
pub mod loader;
pub mod normalize;
pub mod render;
pub mod sample;
pub mod smoothing;
pub mod style;
pub mod window;

pub use decode::{
    extract_waveform, read_duration, DecodeError, DecodedPcm, ErrorKind, FileDecoder, PcmDecoder,
};
pub use downsample::downsample;
pub use file_view::FileWaveform;
pub use live::{LiveWaveform, UpdateOutcome};
pub use loader::{LoadStatus, WaveformLoader};
pub use normalize::normalize;
pub use render::{BarGeometry, DrawPrimitive, DrawSurface, Paint, RecordingSurface, Viewport};
pub use sample::{AmplitudeSample, AmplitudeSource};
pub use smoothing::smooth;
pub use style::{Alignment, Direction, Rgb, StyleConfig};
pub use window::{BarWindow, VisualBar};

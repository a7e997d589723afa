//! Playing stored recordings.

pub mod output;
pub mod player;
pub mod session;
pub mod ui;

pub use session::{Playback, SKIP_STEP};
pub use ui::{PlaybackCommand, PlaybackTui};

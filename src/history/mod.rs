//! Saved recordings: the SQLite index and the interactive browser over it.

pub mod storage;
pub mod ui;

pub use storage::{format_duration, format_size, NewRecording, Recording, RecordingStore};
pub use ui::{BrowserAction, RecordingBrowser};

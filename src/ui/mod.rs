//! Shared terminal UI pieces.

pub mod error;
pub mod surface;

pub use error::{show_error, ErrorScreen};
pub use surface::{canvas_viewport, CanvasSurface};
